//! Edge-anchored oriented rectangles ("probe regions").
//!
//! Given a quadrilateral and a `SelectionConfig`, builds a rectangle that
//! shares its long axis with one quad edge, shortened or lengthened around
//! the edge midpoint and extended a fixed pixel width along the edge normal.
//!
//! The quad's winding is measured first so that "outward" always points
//! away from the quad interior, whichever direction the boundary trace
//! happened to run.

use kurbo::{Point, Vec2};

use crate::config::SelectionConfig;
use crate::error::DetectError;
use crate::geom::{self, EPS};

/// Four corners of an oriented rectangle anchored to one quad edge.
///
/// Corners trace a simple loop 0→1→2→3→0. In the default one-sided mode,
/// corners 0 and 1 lie on the (scaled) edge and 2, 3 on the far side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedRegion {
    pub corners: [Point; 4],
    /// Clamped index of the anchoring edge.
    pub edge_index: usize,
    /// Unscaled anchoring edge endpoints.
    pub edge: (Point, Point),
    /// Unit vector from edge start to edge end.
    pub direction: Vec2,
    /// Unit normal pointing away from the quad interior.
    pub outward: Vec2,
}

/// Build the probe rectangle for `quad` (vertices in boundary order).
///
/// Fails with `DegenerateEdge` if the selected edge is shorter than
/// `config.min_edge_length`, and with `DegenerateShape` if the quad has no
/// area to orient against. Both are per-quad skips.
pub fn build_region(quad: &[Point; 4], config: &SelectionConfig) -> Result<OrientedRegion, DetectError> {
    let edge_index = config.clamped_edge();
    let start = quad[edge_index];
    let end = quad[(edge_index + 1) % 4];

    let d = end - start;
    let length = d.hypot();
    // Written to also catch NaN lengths.
    if !(length >= config.min_edge_length) {
        return Err(DetectError::DegenerateEdge { length });
    }
    let direction = d / length;

    let normal = Vec2::new(-d.y, d.x);
    let normal_length = normal.hypot();
    if !(normal_length >= config.min_edge_length) {
        return Err(DetectError::DegenerateEdge {
            length: normal_length,
        });
    }
    let normal_unit = normal / normal_length;

    // y points down: with negative shoelace area the rotated normal
    // (-dy, dx) already faces outward.
    let area = geom::signed_area(quad);
    if area.abs() < EPS {
        return Err(DetectError::DegenerateShape);
    }
    let outward = if area < 0.0 { normal_unit } else { -normal_unit };

    let sign = if config.extend_inwards { -1.0 } else { 1.0 };
    let offset = outward * (sign * config.extension_width);

    let mid = start.midpoint(end);
    let scale = config.length_scale();
    let scaled_start = mid + (start - mid) * scale;
    let scaled_end = mid + (end - mid) * scale;

    let corners = if config.straddle_edge {
        [
            scaled_start + offset,
            scaled_end + offset,
            scaled_end - offset,
            scaled_start - offset,
        ]
    } else {
        [
            scaled_start,
            scaled_end,
            scaled_end + offset,
            scaled_start + offset,
        ]
    };

    Ok(OrientedRegion {
        corners,
        edge_index,
        edge: (start, end),
        direction,
        outward,
    })
}
