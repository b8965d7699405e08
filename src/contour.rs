//! Outer boundary extraction and closed-loop polygon approximation.

use geo::{LineString, SimplifyIdx};
use image::{imageops, GrayImage};
use imageproc::contours::{find_contours, BorderType};
use kurbo::Point;

use crate::geom;

/// Integer pixel coordinate of a boundary point.
pub type PixelPoint = imageproc::point::Point<i32>;

/// Outer boundary of one 8-connected foreground region.
///
/// Closed and compressed: points inside straight runs are dropped, only
/// direction changes remain.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub points: Vec<PixelPoint>,
}

/// A reduced closed loop approximating a `Contour`.
///
/// Vertices keep the source contour's order and winding. The last vertex
/// connects back to the first.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub vertices: Vec<Point>,
}

impl Contour {
    pub fn new(points: Vec<PixelPoint>) -> Self {
        Self { points }
    }

    /// Points as floating-point coordinates.
    pub fn to_points(&self) -> Vec<Point> {
        self.points
            .iter()
            .map(|p| Point::new(p.x as f64, p.y as f64))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl Polygon {
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// The four vertices, if this polygon is a quadrilateral.
    pub fn as_quad(&self) -> Option<[Point; 4]> {
        self.vertices.as_slice().try_into().ok()
    }
}

/// Extract outer boundaries of all foreground regions (non-zero pixels).
///
/// Holes and regions nested inside holes are ignored. Contours are
/// returned in discovery (raster scan) order. A mask without foreground
/// yields an empty Vec. Regions touching the image border are traced like
/// any other region.
pub fn extract(mask: &GrayImage) -> Vec<Contour> {
    // The tracer treats the outermost pixel ring as background, so trace a
    // copy framed by one background pixel and shift back afterwards.
    let mut framed = GrayImage::new(mask.width() + 2, mask.height() + 2);
    imageops::replace(&mut framed, mask, 1, 1);

    find_contours::<i32>(&framed)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| {
            let shifted: Vec<PixelPoint> = c
                .points
                .iter()
                .map(|p| PixelPoint::new(p.x - 1, p.y - 1))
                .collect();
            Contour::new(compress_runs(&shifted))
        })
        .collect()
}

/// Drop points that continue a straight run in the same step direction.
fn compress_runs(points: &[PixelPoint]) -> Vec<PixelPoint> {
    let mut points = points.to_vec();
    points.dedup();
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    let n = points.len();
    if n < 3 {
        return points;
    }
    let step = |a: PixelPoint, b: PixelPoint| ((b.x - a.x).signum(), (b.y - a.y).signum());
    let kept: Vec<PixelPoint> = (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            step(prev, points[i]) != step(points[i], next)
        })
        .map(|i| points[i])
        .collect();
    if kept.is_empty() {
        points
    } else {
        kept
    }
}

/// Closed Douglas-Peucker with tolerance `epsilon_ratio * perimeter`.
///
/// The loop is cut at two mutually distant points (both always kept), and
/// each half is reduced independently, so the arbitrary start point of the
/// trace never forces an extra vertex. No vertex count is guaranteed.
pub fn simplify(contour: &Contour, epsilon_ratio: f64) -> Polygon {
    let points = contour.to_points();
    let n = points.len();
    if n < 3 {
        return Polygon { vertices: points };
    }
    let epsilon = epsilon_ratio * geom::perimeter(&points);

    let a = farthest_from(&points, points[0]);
    let b = farthest_from(&points, points[a]);
    if a == b {
        return Polygon { vertices: points };
    }

    let mut kept: Vec<usize> = Vec::new();
    for (from, to) in [(a, b), (b, a)] {
        let chain = cyclic_range(from, to, n);
        let line: LineString<f64> = chain
            .iter()
            .map(|&i| (points[i].x, points[i].y))
            .collect::<Vec<_>>()
            .into();
        kept.extend(line.simplify_idx(&epsilon).into_iter().map(|k| chain[k]));
    }
    kept.sort_unstable();
    kept.dedup();

    Polygon {
        vertices: kept.into_iter().map(|i| points[i]).collect(),
    }
}

fn farthest_from(points: &[Point], origin: Point) -> usize {
    let mut best = 0;
    let mut best_d2 = -1.0;
    for (i, p) in points.iter().enumerate() {
        let d2 = (*p - origin).hypot2();
        if d2 > best_d2 {
            best = i;
            best_d2 = d2;
        }
    }
    best
}

/// Indices `from, from+1, ..., to` walking forward around a loop of `n`.
fn cyclic_range(from: usize, to: usize, n: usize) -> Vec<usize> {
    let mut out = Vec::new();
    let mut i = from;
    loop {
        out.push(i);
        if i == to {
            break;
        }
        i = (i + 1) % n;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    fn mask_with(rects: &[Rect]) -> GrayImage {
        let mut mask = GrayImage::new(200, 160);
        for r in rects {
            draw_filled_rect_mut(&mut mask, *r, Luma([255]));
        }
        mask
    }

    #[test]
    fn empty_mask_has_no_contours() {
        assert!(extract(&GrayImage::new(32, 32)).is_empty());
    }

    #[test]
    fn square_compresses_to_corners() {
        let mask = mask_with(&[Rect::at(20, 30).of_size(50, 40)]);
        let contours = extract(&mask);
        assert_eq!(contours.len(), 1);

        let mut corners: Vec<(i32, i32)> = contours[0].points.iter().map(|p| (p.x, p.y)).collect();
        corners.sort();
        assert_eq!(corners, vec![(20, 30), (20, 69), (69, 30), (69, 69)]);
    }

    #[test]
    fn holes_and_nested_regions_are_ignored() {
        let mut mask = mask_with(&[Rect::at(10, 10).of_size(100, 100)]);
        // Hole with an island inside it.
        draw_filled_rect_mut(&mut mask, Rect::at(30, 30).of_size(60, 60), Luma([0]));
        draw_filled_rect_mut(&mut mask, Rect::at(50, 50).of_size(10, 10), Luma([255]));
        // A second top-level region.
        draw_filled_rect_mut(&mut mask, Rect::at(150, 20).of_size(20, 20), Luma([255]));

        let contours = extract(&mask);
        assert_eq!(contours.len(), 2);
    }

    #[test]
    fn region_touching_left_edge_is_traced() {
        let mask = mask_with(&[Rect::at(0, 20).of_size(60, 60)]);
        let contours = extract(&mask);
        assert_eq!(contours.len(), 1);

        let mut corners: Vec<(i32, i32)> = contours[0].points.iter().map(|p| (p.x, p.y)).collect();
        corners.sort();
        assert_eq!(corners, vec![(0, 20), (0, 79), (59, 20), (59, 79)]);
    }

    #[test]
    fn single_corner_pixel_is_traced() {
        let mut mask = GrayImage::new(16, 16);
        mask.put_pixel(0, 0, Luma([255]));
        let contours = extract(&mask);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].points, vec![PixelPoint::new(0, 0)]);
    }

    #[test]
    fn full_frame_region_is_traced() {
        let mask = mask_with(&[Rect::at(0, 0).of_size(200, 160)]);
        let contours = extract(&mask);
        assert_eq!(contours.len(), 1);
        assert!(contours[0].points.iter().all(|p| p.x >= 0 && p.y >= 0 && p.x < 200 && p.y < 160));
    }

    #[test]
    fn noisy_quad_simplifies_to_four_vertices() {
        // Square boundary with a one-pixel bump in the middle of each side.
        let mut points = Vec::new();
        for x in 0..=60 {
            points.push(PixelPoint::new(x, if x == 30 { 1 } else { 0 }));
        }
        for y in 1..=60 {
            points.push(PixelPoint::new(60, y));
        }
        for x in (0..60).rev() {
            points.push(PixelPoint::new(x, 60));
        }
        for y in (1..60).rev() {
            points.push(PixelPoint::new(if y == 30 { 1 } else { 0 }, y));
        }
        let contour = Contour::new(points);

        let polygon = simplify(&contour, 0.03);
        assert_eq!(polygon.len(), 4, "got {:?}", polygon.vertices);
        assert!(polygon.as_quad().is_some());
        assert!(polygon.vertices.contains(&Point::new(0.0, 0.0)));
        assert!(polygon.vertices.contains(&Point::new(60.0, 60.0)));
    }

    #[test]
    fn start_point_mid_edge_does_not_add_vertex() {
        // Trace starts in the middle of the top edge.
        let contour = Contour::new(vec![
            PixelPoint::new(25, 0),
            PixelPoint::new(50, 0),
            PixelPoint::new(50, 50),
            PixelPoint::new(0, 50),
            PixelPoint::new(0, 0),
        ]);
        let polygon = simplify(&contour, 0.03);
        assert_eq!(polygon.len(), 4, "got {:?}", polygon.vertices);
        assert!(!polygon.vertices.contains(&Point::new(25.0, 0.0)));
    }

    #[test]
    fn simplified_order_follows_contour_winding() {
        let mask = mask_with(&[Rect::at(40, 40).of_size(60, 30)]);
        let contour = &extract(&mask)[0];
        let polygon = simplify(contour, 0.03);
        assert_eq!(polygon.len(), 4);
        let contour_area = geom::signed_area(&contour.to_points());
        let polygon_area = geom::signed_area(&polygon.vertices);
        assert_eq!(contour_area.signum(), polygon_area.signum());
    }
}
