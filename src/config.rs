use std::ops::RangeInclusive;

use crate::error::DetectError;

/// All detection parameters in one struct.
///
/// Defaults match a ~1-4 MP inspection photo with dark quadrilateral
/// targets on a light background. Area limits are in squared pixels and
/// must be scaled to the raster resolution.
#[derive(Debug, Clone)]
pub struct DetectionConfig {
    // -- Binarization stage --
    /// Adaptive threshold and morphology applied to the grayscale input.
    pub threshold: ThresholdParams,

    // -- Contour stage --
    /// Douglas-Peucker tolerance as a fraction of the contour perimeter.
    pub epsilon_ratio: f64,

    // -- Shape filter --
    /// Bounds a simplified contour must satisfy to become a candidate.
    pub limits: ShapeLimits,

    // -- Region stage --
    /// Edge-anchored region settings. `None` skips region building.
    pub selection: Option<SelectionConfig>,
}

/// Adaptive threshold and morphology settings.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdParams {
    /// Side of the Gaussian neighborhood. Odd, at least 3.
    pub block_size: u32,
    /// Constant subtracted from the local weighted mean.
    pub c: f64,
    /// Square structuring element for the noise-removing opening. 0 = off.
    pub open_size: u32,
    /// Square structuring element for the gap-bridging closing. 0 = off.
    pub close_size: u32,
}

/// Geometric acceptance thresholds.
#[derive(Debug, Clone)]
pub struct ShapeLimits {
    /// Smallest accepted contour area, in squared pixels.
    pub min_area: f64,
    /// Largest accepted contour area, in squared pixels.
    pub max_area: f64,
    /// Lower bound on `max(w, h) / min(w, h)` of the min-area rectangle.
    pub min_aspect: f64,
    /// Upper bound on the same ratio.
    pub max_aspect: f64,
    /// Minimum area / axis-aligned bounding box area.
    pub min_extent: f64,
    /// Minimum area / convex hull area.
    pub min_solidity: f64,
    /// Accepted vertex counts of the simplified polygon.
    pub vertex_range: RangeInclusive<usize>,
}

/// Where and how large the probe rectangle is, relative to one quad edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionConfig {
    /// Edge `i` runs from vertex `i` to vertex `(i + 1) % 4`.
    /// Out-of-range values are clamped into `0..=3`.
    pub edge_index: i32,
    /// Band width perpendicular to the edge, in pixels.
    pub extension_width: f64,
    /// Band length along the edge, in percent of the edge length.
    pub extension_length: f64,
    /// true: band lies inside the quad. false: outside.
    pub extend_inwards: bool,
    /// Center the band on the edge (±width) instead of placing it on one side.
    pub straddle_edge: bool,
    /// Edges shorter than this (pixels) are skipped.
    pub min_edge_length: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            threshold: ThresholdParams::default(),
            epsilon_ratio: 0.03,
            limits: ShapeLimits::default(),
            selection: Some(SelectionConfig::default()),
        }
    }
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self {
            block_size: 31,
            c: 7.0,
            open_size: 3,
            close_size: 5,
        }
    }
}

impl Default for ShapeLimits {
    fn default() -> Self {
        Self {
            min_area: 400.0,
            max_area: 20_000.0,
            min_aspect: 1.0,
            max_aspect: 4.0,
            min_extent: 0.35,
            min_solidity: 0.85,
            vertex_range: 4..=4,
        }
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            edge_index: 0,
            extension_width: 30.0,
            extension_length: 80.0,
            extend_inwards: true,
            straddle_edge: false,
            min_edge_length: 10.0,
        }
    }
}

impl DetectionConfig {
    /// Accept 4-6 vertex polygons, tolerating jagged approximations of
    /// near-quadrilateral blobs. Only exact quads get a region.
    pub fn relaxed() -> Self {
        Self {
            limits: ShapeLimits {
                vertex_range: 4..=6,
                ..ShapeLimits::default()
            },
            ..Self::default()
        }
    }

    /// Check every parameter once, before any pixel work.
    pub fn validate(&self) -> Result<(), DetectError> {
        let t = &self.threshold;
        if t.block_size < 3 || t.block_size % 2 == 0 {
            return Err(invalid(format!(
                "block_size must be odd and >= 3, got {}",
                t.block_size
            )));
        }
        if !t.c.is_finite() {
            return Err(invalid("threshold constant must be finite".into()));
        }
        for (name, size) in [("open_size", t.open_size), ("close_size", t.close_size)] {
            if size != 0 && size % 2 == 0 {
                return Err(invalid(format!("{name} must be odd or 0, got {size}")));
            }
        }

        if !(self.epsilon_ratio.is_finite() && self.epsilon_ratio >= 0.0) {
            return Err(invalid(format!(
                "epsilon_ratio must be >= 0, got {}",
                self.epsilon_ratio
            )));
        }

        self.limits.validate()?;

        if let Some(selection) = &self.selection {
            selection.validate()?;
        }
        Ok(())
    }
}

impl ShapeLimits {
    fn validate(&self) -> Result<(), DetectError> {
        let finite = [
            self.min_area,
            self.max_area,
            self.min_aspect,
            self.max_aspect,
            self.min_extent,
            self.min_solidity,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(invalid("shape limits must be finite".into()));
        }
        if self.min_area < 0.0 || self.min_area > self.max_area {
            return Err(invalid(format!(
                "area range [{}, {}] is empty",
                self.min_area, self.max_area
            )));
        }
        if self.min_aspect < 1.0 || self.min_aspect > self.max_aspect {
            return Err(invalid(format!(
                "aspect range [{}, {}] must satisfy 1 <= min <= max",
                self.min_aspect, self.max_aspect
            )));
        }
        if self.vertex_range.is_empty() || *self.vertex_range.start() < 3 {
            return Err(invalid(format!(
                "vertex range {:?} must be non-empty and start at 3 or more",
                self.vertex_range
            )));
        }
        Ok(())
    }
}

impl SelectionConfig {
    /// `edge_index` clamped into the valid edge range.
    pub fn clamped_edge(&self) -> usize {
        self.edge_index.clamp(0, 3) as usize
    }

    /// Band length as a fraction of the edge length.
    pub fn length_scale(&self) -> f64 {
        self.extension_length / 100.0
    }

    fn validate(&self) -> Result<(), DetectError> {
        if !(self.extension_width.is_finite() && self.extension_width > 0.0) {
            return Err(invalid(format!(
                "extension_width must be > 0, got {}",
                self.extension_width
            )));
        }
        if !(self.extension_length.is_finite() && self.extension_length > 0.0) {
            return Err(invalid(format!(
                "extension_length must be > 0, got {}",
                self.extension_length
            )));
        }
        if !(self.min_edge_length.is_finite() && self.min_edge_length > 0.0) {
            return Err(invalid(format!(
                "min_edge_length must be > 0, got {}",
                self.min_edge_length
            )));
        }
        Ok(())
    }
}

fn invalid(msg: String) -> DetectError {
    DetectError::InvalidConfig(msg)
}
