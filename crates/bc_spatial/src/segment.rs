//! Closest-point queries between line segments.
//!
//! Not grounded on a file in the reference pack directly (the engine's
//! collision helpers header doesn't carry these two), but required by
//! the vehicle controller's building-avoidance and target-steering math,
//! which call them by these names. Standard closest-point-on-segment
//! derivations (Ericson, "Real-Time Collision Detection" 5.1.2).

use glam::Vec3;

/// Closest point on segment `a..b` to `point`.
#[must_use]
pub fn closest_point_on_segment(point: Vec3, a: Vec3, b: Vec3) -> Vec3 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 < 1e-12 {
        return a;
    }
    let t = ((point - a).dot(ab) / len2).clamp(0.0, 1.0);
    a + ab * t
}

/// Closest points between segments `p1..q1` and `p2..q2`.
/// Returns `(point_on_first, point_on_second, t_first, t_second)`, the
/// two closest points and their segment parameters in `[0, 1]`.
#[must_use]
pub fn closest_points_between_segments(p1: Vec3, q1: Vec3, p2: Vec3, q2: Vec3) -> (Vec3, Vec3, f32, f32) {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;

    let a = d1.length_squared();
    let e = d2.length_squared();
    let f = d2.dot(r);

    let (mut s, mut t);

    if a < 1e-12 && e < 1e-12 {
        s = 0.0;
        t = 0.0;
    } else if a < 1e-12 {
        s = 0.0;
        t = (f / e).clamp(0.0, 1.0);
    } else {
        let c = d1.dot(r);
        if e < 1e-12 {
            t = 0.0;
            s = (-c / a).clamp(0.0, 1.0);
        } else {
            let b = d1.dot(d2);
            let denom = a * e - b * b;

            s = if denom.abs() > 1e-12 { ((b * f - c * e) / denom).clamp(0.0, 1.0) } else { 0.0 };

            t = (b * s + f) / e;

            if t < 0.0 {
                t = 0.0;
                s = (-c / a).clamp(0.0, 1.0);
            } else if t > 1.0 {
                t = 1.0;
                s = ((b - c) / a).clamp(0.0, 1.0);
            }
        }
    }

    let c1 = p1 + d1 * s;
    let c2 = p2 + d2 * t;
    (c1, c2, s, t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closest_point_clamps_to_segment_endpoints() {
        let p = closest_point_on_segment(Vec3::new(5.0, 0.0, 0.0), Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(p, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn closest_point_on_midpoint_of_segment() {
        let p = closest_point_on_segment(Vec3::new(0.5, 1.0, 0.0), Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(p, Vec3::new(0.5, 0.0, 0.0));
    }

    #[test]
    fn parallel_segments_report_perpendicular_distance() {
        let (c1, c2, _, _) =
            closest_points_between_segments(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 1.0, 0.0));
        assert!((c2 - c1).length() - 1.0 < 1e-4);
    }

    #[test]
    fn crossing_segments_meet_at_their_intersection() {
        let (c1, c2, _, _) = closest_points_between_segments(
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        assert!((c1 - Vec3::ZERO).length() < 1e-4);
        assert!((c2 - Vec3::ZERO).length() < 1e-4);
    }
}
