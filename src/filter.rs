//! Geometric plausibility checks for candidate quadrilaterals.
//!
//! Checks run cheapest first and stop at the first failure:
//! area → convexity → vertex count → aspect → extent → solidity.
//! The order affects cost only, never the outcome.

use std::fmt;

use crate::config::ShapeLimits;
use crate::contour::{Contour, Polygon};
use crate::geom::{self, EPS};

/// Why a contour was filtered out. Not an error: rejections are ordinary
/// filtering decisions reflected only in the result count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    TooFewPoints,
    Area,
    NotConvex,
    VertexCount,
    Aspect,
    Extent,
    Solidity,
}

impl Rejection {
    pub const ALL: [Rejection; 7] = [
        Rejection::TooFewPoints,
        Rejection::Area,
        Rejection::NotConvex,
        Rejection::VertexCount,
        Rejection::Aspect,
        Rejection::Extent,
        Rejection::Solidity,
    ];

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Rejection::TooFewPoints => "too few points",
            Rejection::Area => "area",
            Rejection::NotConvex => "not convex",
            Rejection::VertexCount => "vertex count",
            Rejection::Aspect => "aspect",
            Rejection::Extent => "extent",
            Rejection::Solidity => "solidity",
        };
        f.write_str(name)
    }
}

/// Derived scalars for one contour / polygon pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeMetrics {
    /// Shoelace area of the contour (y down: positive = clockwise on screen).
    pub signed_area: f64,
    pub area: f64,
    pub perimeter: f64,
    pub vertex_count: usize,
    pub convex: bool,
    /// Axis-aligned bounding box, pixel-inclusive.
    pub bbox_width: f64,
    pub bbox_height: f64,
    /// Minimum-area rotated rectangle of the contour.
    pub rect_width: f64,
    pub rect_height: f64,
    pub aspect: Option<f64>,
    pub extent: Option<f64>,
    pub solidity: Option<f64>,
}

impl ShapeMetrics {
    /// Compute every metric, without applying any limits.
    pub fn measure(contour: &Contour, polygon: &Polygon) -> Self {
        let points = contour.to_points();
        let signed_area = geom::signed_area(&points);
        let area = signed_area.abs();
        let (bbox_width, bbox_height) = geom::bounding_box(&points);
        let (rect_width, rect_height) = geom::min_area_rect(&points).unwrap_or((0.0, 0.0));
        let hull_area = geom::convex_hull_area(&points);
        Self {
            signed_area,
            area,
            perimeter: geom::perimeter(&points),
            vertex_count: polygon.len(),
            convex: geom::is_convex(&polygon.vertices),
            bbox_width,
            bbox_height,
            rect_width,
            rect_height,
            aspect: geom::aspect_ratio(rect_width, rect_height),
            extent: ratio(area, bbox_width * bbox_height),
            solidity: ratio(area, hull_area),
        }
    }
}

/// Run all checks in order, returning the metrics of an accepted shape or
/// the first failed check.
pub fn evaluate(
    contour: &Contour,
    polygon: &Polygon,
    limits: &ShapeLimits,
) -> Result<ShapeMetrics, Rejection> {
    if contour.len() < 3 || polygon.len() < 3 {
        return Err(Rejection::TooFewPoints);
    }
    let points = contour.to_points();

    let signed_area = geom::signed_area(&points);
    let area = signed_area.abs();
    if area < limits.min_area || area > limits.max_area {
        return Err(Rejection::Area);
    }

    if !geom::is_convex(&polygon.vertices) {
        return Err(Rejection::NotConvex);
    }

    if !limits.vertex_range.contains(&polygon.len()) {
        return Err(Rejection::VertexCount);
    }

    // The contour's rotated rectangle is stabler than the polygon's for
    // rotated shapes.
    let (rect_width, rect_height) = geom::min_area_rect(&points).ok_or(Rejection::Aspect)?;
    let aspect = geom::aspect_ratio(rect_width, rect_height).ok_or(Rejection::Aspect)?;
    if aspect < limits.min_aspect || aspect > limits.max_aspect {
        return Err(Rejection::Aspect);
    }

    let (bbox_width, bbox_height) = geom::bounding_box(&points);
    let extent = ratio(area, bbox_width * bbox_height).ok_or(Rejection::Extent)?;
    if extent < limits.min_extent {
        return Err(Rejection::Extent);
    }

    let solidity = ratio(area, geom::convex_hull_area(&points)).ok_or(Rejection::Solidity)?;
    if solidity < limits.min_solidity {
        return Err(Rejection::Solidity);
    }

    Ok(ShapeMetrics {
        signed_area,
        area,
        perimeter: geom::perimeter(&points),
        vertex_count: polygon.len(),
        convex: true,
        bbox_width,
        bbox_height,
        rect_width,
        rect_height,
        aspect: Some(aspect),
        extent: Some(extent),
        solidity: Some(solidity),
    })
}

/// Accept/reject decision only.
pub fn accept(contour: &Contour, polygon: &Polygon, limits: &ShapeLimits) -> bool {
    evaluate(contour, polygon, limits).is_ok()
}

fn ratio(num: f64, den: f64) -> Option<f64> {
    if den.abs() < EPS {
        None
    } else {
        Some(num / den)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contour::{simplify, PixelPoint};

    fn contour_of(corners: &[(i32, i32)]) -> Contour {
        Contour::new(corners.iter().map(|&(x, y)| PixelPoint::new(x, y)).collect())
    }

    fn square(side: i32) -> Contour {
        contour_of(&[(10, 10), (10 + side, 10), (10 + side, 10 + side), (10, 10 + side)])
    }

    #[test]
    fn perfect_square_is_accepted() {
        let limits = ShapeLimits::default();
        let contour = square(60);
        let polygon = simplify(&contour, 0.03);
        let metrics = evaluate(&contour, &polygon, &limits).unwrap();
        assert!((metrics.area - 3600.0).abs() < 1e-9);
        assert!((metrics.aspect.unwrap() - 1.0).abs() < 1e-6);
        assert!((metrics.solidity.unwrap() - 1.0).abs() < 1e-6);
        assert!(accept(&contour, &polygon, &limits));
    }

    #[test]
    fn area_limits_apply_to_the_contour() {
        let limits = ShapeLimits::default();
        let small = square(15);
        assert_eq!(
            evaluate(&small, &simplify(&small, 0.03), &limits),
            Err(Rejection::Area)
        );
        let large = square(200);
        assert_eq!(
            evaluate(&large, &simplify(&large, 0.03), &limits),
            Err(Rejection::Area)
        );
    }

    #[test]
    fn concave_polygon_is_rejected() {
        let limits = ShapeLimits::default();
        let chevron = contour_of(&[(0, 0), (80, 40), (0, 80), (30, 40)]);
        let polygon = Polygon {
            vertices: chevron.to_points(),
        };
        assert_eq!(evaluate(&chevron, &polygon, &limits), Err(Rejection::NotConvex));
    }

    #[test]
    fn vertex_range_is_configurable() {
        let hexagon = contour_of(&[(40, 0), (80, 20), (80, 60), (40, 80), (0, 60), (0, 20)]);
        let polygon = Polygon {
            vertices: hexagon.to_points(),
        };
        let strict = ShapeLimits::default();
        assert_eq!(evaluate(&hexagon, &polygon, &strict), Err(Rejection::VertexCount));
        let relaxed = ShapeLimits {
            vertex_range: 4..=6,
            ..ShapeLimits::default()
        };
        assert!(accept(&hexagon, &polygon, &relaxed));
    }

    #[test]
    fn elongated_rectangle_fails_aspect_regardless_of_rotation() {
        let limits = ShapeLimits {
            max_aspect: 3.0,
            ..ShapeLimits::default()
        };
        let wide = contour_of(&[(0, 0), (200, 0), (200, 20), (0, 20)]);
        let tall = contour_of(&[(0, 0), (20, 0), (20, 200), (0, 200)]);
        for c in [wide, tall] {
            let polygon = Polygon {
                vertices: c.to_points(),
            };
            assert_eq!(evaluate(&c, &polygon, &limits), Err(Rejection::Aspect));
        }
    }

    #[test]
    fn sparse_shape_fails_extent() {
        // Thin diagonal parallelogram: small area inside a large box.
        let sliver = contour_of(&[(0, 0), (30, 0), (130, 100), (100, 100)]);
        let polygon = Polygon {
            vertices: sliver.to_points(),
        };
        let limits = ShapeLimits {
            max_aspect: 100.0,
            ..ShapeLimits::default()
        };
        assert_eq!(evaluate(&sliver, &polygon, &limits), Err(Rejection::Extent));
    }

    #[test]
    fn ragged_contour_fails_solidity() {
        // Square with a deep notch; the polygon handed in is its convex
        // approximation.
        let notched = contour_of(&[
            (0, 0),
            (40, 0),
            (40, 60),
            (60, 60),
            (60, 0),
            (100, 0),
            (100, 100),
            (0, 100),
        ]);
        let polygon = Polygon {
            vertices: vec![
                kurbo::Point::new(0.0, 0.0),
                kurbo::Point::new(100.0, 0.0),
                kurbo::Point::new(100.0, 100.0),
                kurbo::Point::new(0.0, 100.0),
            ],
        };
        let limits = ShapeLimits {
            min_solidity: 0.9,
            ..ShapeLimits::default()
        };
        assert_eq!(evaluate(&notched, &polygon, &limits), Err(Rejection::Solidity));
    }

    #[test]
    fn collinear_contour_never_divides_by_zero() {
        let line = contour_of(&[(0, 0), (50, 0), (100, 0)]);
        let polygon = Polygon {
            vertices: line.to_points(),
        };
        let limits = ShapeLimits {
            min_area: 0.0,
            ..ShapeLimits::default()
        };
        assert!(evaluate(&line, &polygon, &limits).is_err());
        let metrics = ShapeMetrics::measure(&line, &polygon);
        assert_eq!(metrics.solidity, None);
    }
}
