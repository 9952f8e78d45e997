use crate::types::{Point, Value};

/// Linear interpolation.
#[inline]
pub fn lerp(a: Value, b: Value, t: Value) -> Value {
    a + (b - a) * t
}

/// Returns the weight of corner `a` at the zero crossing of the edge `a`-`b`.
///
/// The crossing sits at `a * p + b * (1 - p)` with `p = fb / (fb - fa)`. When the
/// two values are closer than `epsilon` the edge carries no usable slope and the
/// midpoint (`p = 0.5`) is used instead of dividing.
#[inline]
pub fn crossing_parameter(fa: Value, fb: Value, epsilon: Value) -> Value {
    let denom = fb - fa;
    if denom.abs() < epsilon {
        0.5
    } else {
        fb / denom
    }
}

/// Places the zero crossing between corners `a` and `b` carrying values `fa` and `fb`.
#[inline]
pub fn edge_crossing(a: &Point, b: &Point, fa: Value, fb: Value, epsilon: Value) -> Point {
    let p = crossing_parameter(fa, fb, epsilon);
    Point::new(lerp(b.x, a.x, p), lerp(b.y, a.y, p), lerp(b.z, a.z, p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPS: Value = 1e-6;

    #[test]
    fn opposite_unit_values_meet_at_midpoint() {
        assert_relative_eq!(crossing_parameter(-1.0, 1.0, EPS), 0.5);

        let v = edge_crossing(
            &Point::new(0.0, 0.0, 0.0),
            &Point::new(0.2, 0.0, 0.0),
            -1.0,
            1.0,
            EPS,
        );
        assert_relative_eq!(v.x, 0.1);
        assert_relative_eq!(v.y, 0.0);
        assert_relative_eq!(v.z, 0.0);
    }

    #[test]
    fn crossing_leans_toward_smaller_magnitude() {
        // fa = 3, fb = -1 crosses a quarter of the way from b to a.
        let v = edge_crossing(
            &Point::new(1.0, 0.0, 0.0),
            &Point::new(0.0, 0.0, 0.0),
            3.0,
            -1.0,
            EPS,
        );
        assert_relative_eq!(v.x, 0.25);
    }

    #[test]
    fn equal_values_fall_back_to_midpoint() {
        assert_relative_eq!(crossing_parameter(0.3, 0.3, EPS), 0.5);

        let v = edge_crossing(
            &Point::new(0.0, 1.0, 2.0),
            &Point::new(0.0, 1.0, 3.0),
            0.3,
            0.3,
            EPS,
        );
        assert!(v.coords.iter().all(|c| c.is_finite()));
        assert_relative_eq!(v.z, 2.5);
    }

    #[test]
    fn crossing_stays_on_the_edge() {
        let a = Point::new(0.0, 0.0, 0.0);
        let b = Point::new(0.0, 0.0, 1.0);
        for (fa, fb) in [(0.9, -0.1), (1e-3, -5.0), (2.0, 0.0)] {
            let v = edge_crossing(&a, &b, fa, fb, EPS);
            assert!((0.0..=1.0).contains(&v.z), "{fa} {fb} -> {}", v.z);
        }
    }
}
