//! Oriented bounding box and the OBB-vs-OBB separating-axis test.
//!
//! Grounded on `collision.h`'s `OBB`/`CollisionOBBVsOBB`: a position, a
//! 3x3 rotation and a half-extent
//! vector, tested against another OBB by the standard 15-axis SAT
//! (the three face-normal pairs plus the nine edge-cross-products).

use glam::{Mat3, Vec3};

use crate::aabb::Aabb;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Obb {
    pub position: Vec3,
    pub rotation: Mat3,
    pub extents: Vec3,
}

impl Obb {
    #[must_use]
    pub fn new(position: Vec3, rotation: Mat3, extents: Vec3) -> Self {
        Self { position, rotation, extents }
    }

    /// Axis-aligned box tightly containing this OBB, used when a
    /// cheaper broad-phase test (tree queries, corridor rejection) is
    /// enough.
    #[must_use]
    pub fn bounding_aabb(&self) -> Aabb {
        let axes = [self.rotation.x_axis, self.rotation.y_axis, self.rotation.z_axis];
        let radius = axes[0].abs() * self.extents.x + axes[1].abs() * self.extents.y + axes[2].abs() * self.extents.z;
        Aabb::new(self.position - radius, self.position + radius)
    }

    /// Closest point on (or inside) this OBB to `point`: project into
    /// the box's local frame and clamp each axis to `+-extents`.
    /// Mirrors `CalculateClosestPointToOBB`, reporting whether `point`
    /// was already inside via `inside`.
    #[must_use]
    pub fn closest_point(&self, point: Vec3, inside: &mut bool) -> Vec3 {
        let d = point - self.position;
        let axes = [self.rotation.x_axis, self.rotation.y_axis, self.rotation.z_axis];
        let extents = [self.extents.x, self.extents.y, self.extents.z];
        *inside = true;
        let mut result = self.position;
        for (axis, extent) in axes.iter().zip(extents) {
            let dist = d.dot(*axis).clamp(-extent, extent);
            if dist.abs() >= extent {
                *inside = false;
            }
            result += *axis * dist;
        }
        result
    }
}

/// Separating-axis test over the 15 candidate axes (3 face normals from
/// each box, 9 edge-cross-products). `0.00001` epsilon on `abs_r` guards
/// against near-parallel edges whose cross product is close to null.
#[must_use]
pub fn collision_obb_vs_obb(a: &Obb, b: &Obb) -> bool {
    const EPS: f32 = 0.00001;

    let mut r = [[0.0f32; 3]; 3];
    let mut abs_r = [[0.0f32; 3]; 3];
    let a_rows = [a.rotation.row(0), a.rotation.row(1), a.rotation.row(2)];
    let b_rows = [b.rotation.row(0), b.rotation.row(1), b.rotation.row(2)];
    for i in 0..3 {
        for j in 0..3 {
            r[i][j] = a_rows[i].dot(b_rows[j]);
            abs_r[i][j] = r[i][j].abs() + EPS;
        }
    }

    let t_world = b.position - a.position;
    let t = [t_world.dot(a_rows[0]), t_world.dot(a_rows[1]), t_world.dot(a_rows[2])];

    let ae = [a.extents.x, a.extents.y, a.extents.z];
    let be = [b.extents.x, b.extents.y, b.extents.z];

    for i in 0..3 {
        let ra = ae[i];
        let rb = be[0] * abs_r[i][0] + be[1] * abs_r[i][1] + be[2] * abs_r[i][2];
        if t[i].abs() > ra + rb {
            return false;
        }
    }
    for i in 0..3 {
        let ra = ae[0] * abs_r[0][i] + ae[1] * abs_r[1][i] + ae[2] * abs_r[2][i];
        let rb = be[i];
        if (t[0] * r[0][i] + t[1] * r[1][i] + t[2] * r[2][i]).abs() > ra + rb {
            return false;
        }
    }

    // L = A0 x B0 .. A2 x B2, transcribed directly from the source
    // rather than generated from an index formula.
    let ra = ae[1] * abs_r[2][0] + ae[2] * abs_r[1][0];
    let rb = be[1] * abs_r[0][2] + be[2] * abs_r[0][1];
    if (t[2] * r[1][0] - t[1] * r[2][0]).abs() > ra + rb {
        return false;
    }
    let ra = ae[1] * abs_r[2][1] + ae[2] * abs_r[1][1];
    let rb = be[0] * abs_r[0][2] + be[2] * abs_r[0][0];
    if (t[2] * r[1][1] - t[1] * r[2][1]).abs() > ra + rb {
        return false;
    }
    let ra = ae[1] * abs_r[2][2] + ae[2] * abs_r[1][2];
    let rb = be[0] * abs_r[0][1] + be[1] * abs_r[0][0];
    if (t[2] * r[1][2] - t[1] * r[2][2]).abs() > ra + rb {
        return false;
    }
    let ra = ae[0] * abs_r[2][0] + ae[2] * abs_r[0][0];
    let rb = be[1] * abs_r[1][2] + be[2] * abs_r[1][1];
    if (t[0] * r[2][0] - t[2] * r[0][0]).abs() > ra + rb {
        return false;
    }
    let ra = ae[0] * abs_r[2][1] + ae[2] * abs_r[0][1];
    let rb = be[0] * abs_r[1][2] + be[2] * abs_r[1][0];
    if (t[0] * r[2][1] - t[2] * r[0][1]).abs() > ra + rb {
        return false;
    }
    let ra = ae[0] * abs_r[2][2] + ae[2] * abs_r[0][2];
    let rb = be[0] * abs_r[1][1] + be[1] * abs_r[1][0];
    if (t[0] * r[2][2] - t[2] * r[0][2]).abs() > ra + rb {
        return false;
    }
    let ra = ae[0] * abs_r[1][0] + ae[1] * abs_r[0][0];
    let rb = be[1] * abs_r[2][2] + be[2] * abs_r[2][1];
    if (t[1] * r[0][0] - t[0] * r[1][0]).abs() > ra + rb {
        return false;
    }
    let ra = ae[0] * abs_r[1][1] + ae[1] * abs_r[0][1];
    let rb = be[0] * abs_r[2][2] + be[2] * abs_r[2][0];
    if (t[1] * r[0][1] - t[0] * r[1][1]).abs() > ra + rb {
        return false;
    }
    let ra = ae[0] * abs_r[1][2] + ae[1] * abs_r[0][2];
    let rb = be[0] * abs_r[2][1] + be[1] * abs_r[2][0];
    if (t[1] * r[0][2] - t[0] * r[1][2]).abs() > ra + rb {
        return false;
    }

    true
}

/// Minimum-translation push-out between two overlapping OBBs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionResult {
    pub normal: Vec3,
    pub depth: f32,
}

fn obb_interval(obb: &Obb, axis: Vec3) -> (f32, f32) {
    let c = obb.position;
    let e = obb.extents;
    let a = [obb.rotation.x_axis, obb.rotation.y_axis, obb.rotation.z_axis];
    let vertices = [
        c + a[0] * e.x + a[1] * e.y + a[2] * e.z,
        c - a[0] * e.x + a[1] * e.y + a[2] * e.z,
        c + a[0] * e.x - a[1] * e.y + a[2] * e.z,
        c + a[0] * e.x + a[1] * e.y - a[2] * e.z,
        c - a[0] * e.x - a[1] * e.y - a[2] * e.z,
        c + a[0] * e.x - a[1] * e.y - a[2] * e.z,
        c - a[0] * e.x + a[1] * e.y - a[2] * e.z,
        c - a[0] * e.x - a[1] * e.y + a[2] * e.z,
    ];
    let mut min = vertices[0].dot(axis);
    let mut max = min;
    for v in &vertices[1..] {
        let p = v.dot(axis);
        min = min.min(p);
        max = max.max(p);
    }
    (min, max)
}

/// Penetration depth of `a`/`b` along `axis` (must be non-zero), and
/// whether the separating direction needs flipping to point from `a`
/// toward `b`. Zero or negative means no overlap on this axis.
fn penetration_depth(a: &Obb, b: &Obb, axis: Vec3) -> (f32, bool) {
    let axis = axis.normalize();
    let (min1, max1) = obb_interval(a, axis);
    let (min2, max2) = obb_interval(b, axis);
    if min2 > max1 || min1 > max2 {
        return (0.0, false);
    }
    let len1 = max1 - min1;
    let len2 = max2 - min2;
    let span = max1.max(max2) - min1.min(min2);
    (len1 + len2 - span, min2 < min1)
}

/// Depth and push-out normal for two overlapping OBBs, or `None` if they
/// don't overlap. Grounded on `CollisionFeaturesOBBvsOBB`: same 15-axis
/// SAT sweep tracking the axis of least penetration, minus the contact
/// manifold clipping the source also computes — car collision response
/// only ever reads `normal`/`depth`.
#[must_use]
pub fn collision_features_obb_vs_obb(a: &Obb, b: &Obb) -> Option<CollisionResult> {
    if a.position.distance(b.position) > a.extents.length() + b.extents.length() {
        return None;
    }

    let a_axes = [a.rotation.x_axis, a.rotation.y_axis, a.rotation.z_axis];
    let b_axes = [b.rotation.x_axis, b.rotation.y_axis, b.rotation.z_axis];

    let mut test = [Vec3::ZERO; 15];
    test[0..3].copy_from_slice(&a_axes);
    test[3..6].copy_from_slice(&b_axes);
    for i in 0..3 {
        test[6 + i * 3] = a_axes[i].cross(a_axes[0]);
        test[6 + i * 3 + 1] = a_axes[i].cross(a_axes[1]);
        test[6 + i * 3 + 2] = a_axes[i].cross(a_axes[2]);
    }

    let mut best_depth = f32::MAX;
    let mut best_normal = None;

    for axis in &mut test {
        let mut v = *axis;
        if v.x.abs() < 0.000_001 {
            v.x = 0.0;
        }
        if v.y.abs() < 0.000_001 {
            v.y = 0.0;
        }
        if v.z.abs() < 0.000_001 {
            v.z = 0.0;
        }
        if v.length_squared() < 0.001 {
            continue;
        }

        let (depth, should_flip) = penetration_depth(a, b, v);
        if depth <= 0.0 {
            return None;
        }
        if depth < best_depth {
            best_depth = depth;
            best_normal = Some(if should_flip { -v } else { v });
        }
    }

    best_normal.map(|normal| CollisionResult { normal: normal.normalize(), depth: best_depth })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_axis_aligned_boxes_collide() {
        let a = Obb::new(Vec3::ZERO, Mat3::IDENTITY, Vec3::splat(1.0));
        let b = Obb::new(Vec3::new(1.5, 0.0, 0.0), Mat3::IDENTITY, Vec3::splat(1.0));
        assert!(collision_obb_vs_obb(&a, &b));
    }

    #[test]
    fn distant_boxes_do_not_collide() {
        let a = Obb::new(Vec3::ZERO, Mat3::IDENTITY, Vec3::splat(1.0));
        let b = Obb::new(Vec3::new(10.0, 0.0, 0.0), Mat3::IDENTITY, Vec3::splat(1.0));
        assert!(!collision_obb_vs_obb(&a, &b));
    }

    #[test]
    fn rotated_box_still_detects_corner_overlap() {
        let a = Obb::new(Vec3::ZERO, Mat3::IDENTITY, Vec3::splat(1.0));
        let rotation = Mat3::from_rotation_z(std::f32::consts::FRAC_PI_4);
        let b = Obb::new(Vec3::new(1.9, 0.0, 0.0), rotation, Vec3::splat(1.0));
        assert!(collision_obb_vs_obb(&a, &b));
    }

    #[test]
    fn bounding_aabb_contains_the_obb_position() {
        let obb = Obb::new(Vec3::new(3.0, 0.0, 0.0), Mat3::from_rotation_y(0.4), Vec3::splat(2.0));
        let aabb = obb.bounding_aabb();
        assert!(aabb.contains_point(obb.position));
    }

    #[test]
    fn closest_point_clamps_to_the_nearest_face() {
        let obb = Obb::new(Vec3::ZERO, Mat3::IDENTITY, Vec3::splat(1.0));
        let mut inside = true;
        let closest = obb.closest_point(Vec3::new(5.0, 0.0, 0.0), &mut inside);
        assert!(!inside);
        assert!((closest - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn closest_point_of_an_interior_point_is_itself() {
        let obb = Obb::new(Vec3::ZERO, Mat3::IDENTITY, Vec3::splat(2.0));
        let mut inside = false;
        let closest = obb.closest_point(Vec3::new(0.5, -0.5, 0.1), &mut inside);
        assert!(inside);
        assert!((closest - Vec3::new(0.5, -0.5, 0.1)).length() < 1e-5);
    }

    #[test]
    fn overlapping_boxes_report_a_separating_normal_and_positive_depth() {
        let a = Obb::new(Vec3::ZERO, Mat3::IDENTITY, Vec3::splat(1.0));
        let b = Obb::new(Vec3::new(1.5, 0.0, 0.0), Mat3::IDENTITY, Vec3::splat(1.0));
        let result = collision_features_obb_vs_obb(&a, &b).expect("boxes overlap");
        assert!(result.depth > 0.0);
        assert!(result.normal.dot(Vec3::X).abs() > 0.9);
    }

    #[test]
    fn distant_boxes_report_no_collision_features() {
        let a = Obb::new(Vec3::ZERO, Mat3::IDENTITY, Vec3::splat(1.0));
        let b = Obb::new(Vec3::new(10.0, 0.0, 0.0), Mat3::IDENTITY, Vec3::splat(1.0));
        assert!(collision_features_obb_vs_obb(&a, &b).is_none());
    }
}
