// THEORY:
// Image moments summarise a contour as a handful of scalars. The selector
// only needs three: m00 (area) and the first-order m10/m01, whose ratio to the
// area is the centroid. They are computed from the boundary polygon with
// Green's theorem rather than by counting pixels, so a compressed contour and
// its full pixel chain give identical results, and the sign is normalised so
// winding direction does not matter.
//
// Second-order moments come along for free in the same pass and are exposed
// for callers that want orientation or spread.

use imageproc::point::Point;

/// Raw spatial moments of a closed polygon, up to second order.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Moments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
    pub m20: f64,
    pub m11: f64,
    pub m02: f64,
}

impl Moments {
    /// Computes the moments of the polygon through `points` (implicitly closed).
    pub fn of_polygon(points: &[Point<i32>]) -> Self {
        if points.len() < 3 {
            return Self::default();
        }

        let (mut a00, mut a10, mut a01) = (0.0f64, 0.0f64, 0.0f64);
        let (mut a20, mut a11, mut a02) = (0.0f64, 0.0f64, 0.0f64);

        let mut previous = points[points.len() - 1];
        for &current in points {
            let (xp, yp) = (previous.x as f64, previous.y as f64);
            let (xc, yc) = (current.x as f64, current.y as f64);
            let cross = xp * yc - xc * yp;

            a00 += cross;
            a10 += cross * (xp + xc);
            a01 += cross * (yp + yc);
            a20 += cross * (xp * xp + xp * xc + xc * xc);
            a11 += cross * (xp * (2.0 * yp + yc) + xc * (yp + 2.0 * yc));
            a02 += cross * (yp * yp + yp * yc + yc * yc);

            previous = current;
        }

        if a00.abs() <= f64::from(f32::EPSILON) {
            return Self::default();
        }

        // Clockwise polygons come out negative; flip so area is always positive.
        let sign = a00.signum();
        Self {
            m00: sign * a00 / 2.0,
            m10: sign * a10 / 6.0,
            m01: sign * a01 / 6.0,
            m20: sign * a20 / 12.0,
            m11: sign * a11 / 24.0,
            m02: sign * a02 / 12.0,
        }
    }

    /// The enclosed area.
    pub fn area(&self) -> f64 {
        self.m00
    }

    /// Centre of mass, or `None` for a zero-area polygon.
    pub fn centroid(&self) -> Option<(f64, f64)> {
        if self.m00 > 0.0 {
            Some((self.m10 / self.m00, self.m01 / self.m00))
        } else {
            None
        }
    }

    /// Second-order central moments `(mu20, mu11, mu02)`.
    pub fn central_second_order(&self) -> Option<(f64, f64, f64)> {
        let (cx, cy) = self.centroid()?;
        Some((
            self.m20 - cx * self.m10,
            self.m11 - cx * self.m01,
            self.m02 - cy * self.m01,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn polygon(points: &[(i32, i32)]) -> Vec<Point<i32>> {
        points.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    fn square(left: i32, top: i32, side: i32) -> Vec<Point<i32>> {
        polygon(&[(left, top), (left + side, top), (left + side, top + side), (left, top + side)])
    }

    #[test]
    fn square_area_and_centroid_match_geometry() {
        for &(left, top, side) in &[(0, 0, 10), (85, 85, 30), (17, 203, 49), (600, 5, 1)] {
            let moments = Moments::of_polygon(&square(left, top, side));
            assert_relative_eq!(moments.area(), (side * side) as f64, epsilon = 1e-9);
            let (cx, cy) = moments.centroid().expect("non-degenerate");
            assert_relative_eq!(cx, left as f64 + side as f64 / 2.0, epsilon = 1e-9);
            assert_relative_eq!(cy, top as f64 + side as f64 / 2.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn winding_direction_does_not_change_the_result() {
        let forward = square(3, 4, 12);
        let mut backward = forward.clone();
        backward.reverse();
        assert_eq!(Moments::of_polygon(&forward), Moments::of_polygon(&backward));
    }

    #[test]
    fn collinear_points_do_not_change_moments() {
        let corners = square(0, 0, 4);
        let dense = polygon(&[(0, 0), (2, 0), (4, 0), (4, 2), (4, 4), (2, 4), (0, 4), (0, 2)]);
        assert_eq!(Moments::of_polygon(&corners), Moments::of_polygon(&dense));
    }

    #[test]
    fn triangle_centroid_is_vertex_mean() {
        let moments = Moments::of_polygon(&polygon(&[(0, 0), (9, 0), (0, 6)]));
        assert_relative_eq!(moments.area(), 27.0, epsilon = 1e-9);
        let (cx, cy) = moments.centroid().expect("non-degenerate");
        assert_relative_eq!(cx, 3.0, epsilon = 1e-9);
        assert_relative_eq!(cy, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn degenerate_shapes_have_no_centroid() {
        assert_eq!(Moments::of_polygon(&polygon(&[(4, 4)])).centroid(), None);
        assert_eq!(Moments::of_polygon(&polygon(&[(0, 0), (5, 0), (9, 0)])).centroid(), None);
        assert_eq!(Moments::of_polygon(&[]).area(), 0.0);
    }

    #[test]
    fn central_moments_of_a_square_are_symmetric() {
        let moments = Moments::of_polygon(&square(10, 20, 6));
        let (mu20, mu11, mu02) = moments.central_second_order().expect("non-degenerate");
        // side^4 / 12 for a square about its own centre.
        assert_relative_eq!(mu20, 108.0, epsilon = 1e-6);
        assert_relative_eq!(mu02, 108.0, epsilon = 1e-6);
        assert_relative_eq!(mu11, 0.0, epsilon = 1e-6);
    }
}
