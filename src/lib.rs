//! quadprobe: quadrilateral blob detection with edge-anchored probe regions.
//!
//! Finds dark quadrilateral blobs in a grayscale image, filters them by
//! geometric plausibility, computes their centroids, and for each accepted
//! quad derives an oriented rectangle anchored to one of its edges.
//!
//! # Example
//!
//! ```no_run
//! use quadprobe::{detect_path, DetectionConfig};
//! use std::path::Path;
//!
//! let config = DetectionConfig::default();
//! let result = detect_path(Path::new("board.png"), &config)?;
//! for candidate in &result.candidates {
//!     println!("({:.1}, {:.1})", candidate.centroid.x, candidate.centroid.y);
//! }
//! # Ok::<(), quadprobe::DetectError>(())
//! ```

#![forbid(unsafe_code)]

mod binarize;
mod config;
mod contour;
mod filter;
mod geom;
mod moments;
mod region;

pub mod error;
pub mod render;

// Re-export kurbo so downstream users get the same `Point`/`Vec2` types
// used in results.
pub use kurbo;

pub use binarize::{binarize, foreground_count, load_gray, FOREGROUND};
pub use config::{DetectionConfig, SelectionConfig, ShapeLimits, ThresholdParams};
pub use contour::{extract, simplify, Contour, PixelPoint, Polygon};
pub use error::DetectError;
pub use filter::{accept, evaluate, Rejection, ShapeMetrics};
pub use moments::{centroid, Moments};
pub use region::{build_region, OrientedRegion};

use std::path::Path;
use std::time::Instant;

use image::GrayImage;
use kurbo::Point;
use rayon::prelude::*;

/// One accepted quadrilateral-like blob.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Simplified outline, in boundary order.
    pub polygon: Polygon,
    /// Area-weighted centroid of the full contour.
    pub centroid: Point,
    pub metrics: ShapeMetrics,
    /// Probe rectangle. `None` when region building is disabled, the
    /// polygon is not a quad, or the selected edge was degenerate.
    pub region: Option<OrientedRegion>,
}

/// Per-run counters. Every discovered contour ends up in exactly one of
/// `accepted`, `rejected` or `degenerate_shapes`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectionStats {
    pub contours: usize,
    pub accepted: usize,
    rejected: [usize; Rejection::ALL.len()],
    /// Contours that passed the filter but had zero-area moments.
    pub degenerate_shapes: usize,
    /// Accepted quads whose selected edge was too short for a region.
    pub degenerate_edges: usize,
    /// Accepted quads whose region was skipped because the quad itself had
    /// no signed area to orient against.
    pub degenerate_quads: usize,
}

impl DetectionStats {
    pub fn rejected(&self, reason: Rejection) -> usize {
        self.rejected[reason.index()]
    }

    pub fn total_rejected(&self) -> usize {
        self.rejected.iter().sum()
    }

    fn record_region_error(&mut self, err: &DetectError) {
        match err {
            DetectError::DegenerateEdge { .. } => self.degenerate_edges += 1,
            _ => self.degenerate_quads += 1,
        }
    }
}

/// Detection output for one image, candidates in contour discovery order.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    pub width: u32,
    pub height: u32,
    pub candidates: Vec<Candidate>,
    pub stats: DetectionStats,
}

impl DetectionResult {
    pub fn centroids(&self) -> Vec<Point> {
        self.candidates.iter().map(|c| c.centroid).collect()
    }

    pub fn regions(&self) -> Vec<OrientedRegion> {
        self.candidates.iter().filter_map(|c| c.region).collect()
    }
}

/// Full pipeline from an image file.
pub fn detect_path(image_path: &Path, config: &DetectionConfig) -> Result<DetectionResult, DetectError> {
    let gray = load_gray(image_path)?;
    detect(&gray, config)
}

/// Full pipeline: grayscale image → accepted candidates.
///
/// binarize → outer contours → simplify → filter → centroid → region.
/// Only invalid input or configuration fails; zero candidates is a normal
/// result.
pub fn detect(gray: &GrayImage, config: &DetectionConfig) -> Result<DetectionResult, DetectError> {
    config.validate()?;
    let t_start = Instant::now();

    let mask = binarize(gray, &config.threshold)?;
    tracing::info!(
        width = mask.width(),
        height = mask.height(),
        foreground = foreground_count(&mask),
        elapsed_ms = t_start.elapsed().as_millis() as u64,
        "binarized"
    );

    detect_in_mask(&mask, config)
}

/// Pipeline stages after binarization, for callers that already hold a
/// binary mask (non-zero = foreground).
pub fn detect_in_mask(mask: &GrayImage, config: &DetectionConfig) -> Result<DetectionResult, DetectError> {
    config.validate()?;
    let (width, height) = mask.dimensions();
    if width == 0 || height == 0 {
        return Err(DetectError::InvalidInput(format!("empty mask ({width}x{height})")));
    }
    let t_start = Instant::now();

    let contours = extract(mask);
    tracing::debug!(contours = contours.len(), "extracted outer contours");

    // Contours are independent; indexed collection keeps discovery order.
    let outcomes: Vec<Outcome> = contours
        .par_iter()
        .map(|contour| process_contour(contour, config))
        .collect();

    let mut stats = DetectionStats {
        contours: contours.len(),
        ..DetectionStats::default()
    };
    let mut candidates = Vec::new();
    for outcome in outcomes {
        match outcome {
            Outcome::Accepted {
                candidate,
                region_error,
            } => {
                if let Some(err) = region_error {
                    tracing::trace!(error = %err, "region skipped");
                    stats.record_region_error(&err);
                }
                stats.accepted += 1;
                candidates.push(candidate);
            }
            Outcome::Rejected(reason) => stats.rejected[reason.index()] += 1,
            Outcome::Degenerate => stats.degenerate_shapes += 1,
        }
    }

    for reason in Rejection::ALL {
        let n = stats.rejected(reason);
        if n > 0 {
            tracing::debug!(count = n, reason = %reason, "rejected");
        }
    }
    if stats.degenerate_shapes > 0 || stats.degenerate_edges > 0 || stats.degenerate_quads > 0 {
        tracing::debug!(
            degenerate_shapes = stats.degenerate_shapes,
            degenerate_edges = stats.degenerate_edges,
            degenerate_quads = stats.degenerate_quads,
            "skipped degenerate geometry"
        );
    }
    tracing::info!(
        contours = stats.contours,
        accepted = stats.accepted,
        regions = candidates.iter().filter(|c| c.region.is_some()).count(),
        elapsed_ms = t_start.elapsed().as_millis() as u64,
        "detection complete"
    );

    Ok(DetectionResult {
        width,
        height,
        candidates,
        stats,
    })
}

enum Outcome {
    Accepted {
        candidate: Candidate,
        region_error: Option<DetectError>,
    },
    Rejected(Rejection),
    Degenerate,
}

fn process_contour(contour: &Contour, config: &DetectionConfig) -> Outcome {
    let polygon = simplify(contour, config.epsilon_ratio);

    let metrics = match evaluate(contour, &polygon, &config.limits) {
        Ok(metrics) => metrics,
        Err(reason) => {
            tracing::trace!(points = contour.len(), vertices = polygon.len(), %reason, "contour rejected");
            return Outcome::Rejected(reason);
        }
    };

    let centroid = match centroid(contour) {
        Ok(c) => c,
        Err(_) => return Outcome::Degenerate,
    };

    let (region, region_error) = match (config.selection.as_ref(), polygon.as_quad()) {
        (Some(selection), Some(quad)) => match build_region(&quad, selection) {
            Ok(region) => (Some(region), None),
            Err(err) => (None, Some(err)),
        },
        _ => (None, None),
    };

    Outcome::Accepted {
        candidate: Candidate {
            polygon,
            centroid,
            metrics,
            region,
        },
        region_error,
    }
}
