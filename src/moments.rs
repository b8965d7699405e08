//! Polygon area moments and centroids.

use kurbo::Point;

use crate::contour::Contour;
use crate::error::DetectError;
use crate::geom::EPS;

/// Zeroth and first spatial moments of a closed polygon (Green's theorem).
///
/// `m00` is the signed shoelace area; `m10`, `m01` are the area-weighted
/// coordinate sums. The centroid is independent of the winding sign.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Moments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
}

impl Moments {
    pub fn of(points: &[Point]) -> Self {
        let n = points.len();
        if n < 3 {
            return Self::default();
        }
        let mut m = Self::default();
        for i in 0..n {
            let p = points[i];
            let q = points[(i + 1) % n];
            let a = p.x * q.y - q.x * p.y;
            m.m00 += a;
            m.m10 += a * (p.x + q.x);
            m.m01 += a * (p.y + q.y);
        }
        m.m00 /= 2.0;
        m.m10 /= 6.0;
        m.m01 /= 6.0;
        m
    }

    /// `(m10 / m00, m01 / m00)`, or `DegenerateShape` for |m00| < 1e-6.
    pub fn centroid(&self) -> Result<Point, DetectError> {
        if self.m00.abs() < EPS {
            return Err(DetectError::DegenerateShape);
        }
        Ok(Point::new(self.m10 / self.m00, self.m01 / self.m00))
    }
}

/// Area-weighted centroid of a contour.
pub fn centroid(contour: &Contour) -> Result<Point, DetectError> {
    Moments::of(&contour.to_points()).centroid()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contour::PixelPoint;

    fn contour_of(corners: &[(i32, i32)]) -> Contour {
        Contour::new(corners.iter().map(|&(x, y)| PixelPoint::new(x, y)).collect())
    }

    #[test]
    fn square_centroid_is_its_center() {
        let c = centroid(&contour_of(&[(20, 30), (100, 30), (100, 110), (20, 110)])).unwrap();
        assert!((c.x - 60.0).abs() < 0.5, "x = {}", c.x);
        assert!((c.y - 70.0).abs() < 0.5, "y = {}", c.y);
    }

    #[test]
    fn winding_does_not_move_the_centroid() {
        let cw = contour_of(&[(0, 0), (40, 0), (40, 10), (0, 10)]);
        let ccw = contour_of(&[(0, 10), (40, 10), (40, 0), (0, 0)]);
        let a = Moments::of(&cw.to_points());
        let b = Moments::of(&ccw.to_points());
        assert!((a.m00 + b.m00).abs() < 1e-9);
        let (ca, cb) = (a.centroid().unwrap(), b.centroid().unwrap());
        assert!((ca - cb).hypot() < 1e-9);
        assert!((ca.x - 20.0).abs() < 1e-9 && (ca.y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn triangle_centroid_is_vertex_mean() {
        let c = centroid(&contour_of(&[(0, 0), (30, 0), (0, 60)])).unwrap();
        assert!((c.x - 10.0).abs() < 1e-9);
        assert!((c.y - 20.0).abs() < 1e-9);
    }

    #[test]
    fn zero_area_is_degenerate() {
        let line = contour_of(&[(0, 0), (10, 10), (20, 20)]);
        assert!(matches!(centroid(&line), Err(DetectError::DegenerateShape)));
        let point = contour_of(&[(5, 5)]);
        assert!(matches!(centroid(&point), Err(DetectError::DegenerateShape)));
    }
}
