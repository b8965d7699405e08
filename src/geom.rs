//! Shared geometry utilities over closed point loops.
//!
//! Every function treats its input as a closed polygon: the last point
//! connects back to the first. Coordinates are image pixels (y down).

use geo::{Area, ConvexHull, MinimumRotatedRect, MultiPoint};
use kurbo::Point;

/// Denominators below this are treated as zero.
pub const EPS: f64 = 1e-6;

/// Signed area via the shoelace formula.
///
/// With y pointing down, a loop that appears clockwise on screen has
/// positive area.
pub fn signed_area(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    (0..n)
        .map(|i| {
            let j = (i + 1) % n;
            points[i].x * points[j].y - points[j].x * points[i].y
        })
        .sum::<f64>()
        / 2.0
}

/// Closed perimeter (arc length including the closing segment).
pub fn perimeter(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 2 {
        return 0.0;
    }
    (0..n).map(|i| points[i].distance(points[(i + 1) % n])).sum()
}

/// True if every turn has the same orientation.
///
/// Collinear vertices are tolerated. Fewer than 3 points, or a loop that
/// winds around more than once, is not convex.
pub fn is_convex(points: &[Point]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut sign = 0.0f64;
    let mut turning = 0.0f64;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let c = points[(i + 2) % n];
        let v_in = b - a;
        let v_out = c - b;
        let cross = v_in.cross(v_out);
        if cross.abs() > EPS {
            if sign == 0.0 {
                sign = cross.signum();
            } else if cross.signum() != sign {
                return false;
            }
        }
        turning += cross.atan2(v_in.dot(v_out));
    }
    // A simple convex loop turns exactly once (±2π); star polygons turn more.
    sign != 0.0 && turning.abs() < 3.0 * std::f64::consts::PI
}

/// Axis-aligned bounding box size using the pixel-inclusive convention
/// (a single pixel has size 1x1).
pub fn bounding_box(points: &[Point]) -> (f64, f64) {
    if points.is_empty() {
        return (0.0, 0.0);
    }
    let (mut min_x, mut min_y) = (f64::MAX, f64::MAX);
    let (mut max_x, mut max_y) = (f64::MIN, f64::MIN);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    (max_x - min_x + 1.0, max_y - min_y + 1.0)
}

/// Area of the convex hull of the points.
pub fn convex_hull_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    to_multi_point(points).convex_hull().unsigned_area()
}

/// Side lengths `(w, h)` of the minimum-area enclosing rectangle.
///
/// Returns `None` when the points do not span a rectangle.
pub fn min_area_rect(points: &[Point]) -> Option<(f64, f64)> {
    if points.len() < 3 {
        return None;
    }
    let rect = to_multi_point(points).minimum_rotated_rect()?;
    let ring = &rect.exterior().0;
    if ring.len() < 4 {
        return None;
    }
    let side = |a: usize, b: usize| {
        let (dx, dy) = (ring[b].x - ring[a].x, ring[b].y - ring[a].y);
        (dx * dx + dy * dy).sqrt()
    };
    Some((side(0, 1), side(1, 2)))
}

/// Orientation-independent elongation `max(w, h) / min(w, h)`, always >= 1.
///
/// `None` if the shorter side is (near) zero.
pub fn aspect_ratio(w: f64, h: f64) -> Option<f64> {
    let (short, long) = if w <= h { (w, h) } else { (h, w) };
    if short < EPS {
        return None;
    }
    Some(long / short)
}

fn to_multi_point(points: &[Point]) -> MultiPoint<f64> {
    points
        .iter()
        .map(|p| geo::Point::new(p.x, p.y))
        .collect::<Vec<_>>()
        .into()
}
