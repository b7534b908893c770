//! View/projection matrices and frustum extraction (C10).
//!
//! Planes are extracted from the combined view-projection matrix
//! (Gribb/Hartmann), then the eight corners are recovered by
//! intersecting each compatible triple of planes: six planes and eight
//! corners, both derived from plane intersections rather than stored
//! separately.

use glam::{Mat4, Vec3, Vec4};

use crate::aabb::Aabb;

/// Builds a right-handed perspective projection with a `[0, 1]` depth
/// range. When `reverse_z` is set, near maps to depth 1 and far to depth
/// 0 (better floating-point precision distribution for large view
/// distances); the frustum planes extracted from either variant bound
/// the same physical slab, so no special-casing is needed downstream.
#[must_use]
pub fn perspective_matrix(fov_y_radians: f32, aspect: f32, near: f32, far: f32, reverse_z: bool) -> Mat4 {
    let f = 1.0 / (fov_y_radians * 0.5).tan();
    let (a, b) = if reverse_z {
        (near / (far - near), near * far / (far - near))
    } else {
        (far / (near - far), near * far / (near - far))
    };
    Mat4::from_cols(
        Vec4::new(f / aspect, 0.0, 0.0, 0.0),
        Vec4::new(0.0, f, 0.0, 0.0),
        Vec4::new(0.0, 0.0, a, -1.0),
        Vec4::new(0.0, 0.0, b, 0.0),
    )
}

/// Six inward-facing planes (`dot(normal, p) + d >= 0` means inside) and
/// the eight corners of a view-projection's clip volume.
pub struct Frustum {
    pub planes: [Vec4; 6],
    pub corners: [Vec3; 8],
}

impl Frustum {
    #[must_use]
    pub fn from_view_projection(view_proj: Mat4) -> Self {
        let m = view_proj;
        let row0 = Vec4::new(m.x_axis.x, m.y_axis.x, m.z_axis.x, m.w_axis.x);
        let row1 = Vec4::new(m.x_axis.y, m.y_axis.y, m.z_axis.y, m.w_axis.y);
        let row2 = Vec4::new(m.x_axis.z, m.y_axis.z, m.z_axis.z, m.w_axis.z);
        let row3 = Vec4::new(m.x_axis.w, m.y_axis.w, m.z_axis.w, m.w_axis.w);

        let mut planes = [
            row3 + row0, // left
            row3 - row0, // right
            row3 + row1, // bottom
            row3 - row1, // top
            row2,        // near
            row3 - row2, // far
        ];
        for p in &mut planes {
            let len = Vec3::new(p.x, p.y, p.z).length().max(f32::EPSILON);
            *p /= len;
        }

        let corners = corners_from_planes(&planes);
        Self { planes, corners }
    }

    /// Conservative AABB-vs-frustum test: the box is rejected only if it
    /// lies entirely on the outside of some plane.
    #[must_use]
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        for p in &self.planes {
            let positive = Vec3::new(
                if p.x >= 0.0 { aabb.max.x } else { aabb.min.x },
                if p.y >= 0.0 { aabb.max.y } else { aabb.min.y },
                if p.z >= 0.0 { aabb.max.z } else { aabb.min.z },
            );
            if p.x * positive.x + p.y * positive.y + p.z * positive.z + p.w < 0.0 {
                return false;
            }
        }
        true
    }
}

fn plane_intersection(a: Vec4, b: Vec4, c: Vec4) -> Vec3 {
    let (na, nb, nc) = (a.truncate(), b.truncate(), c.truncate());
    let denom = na.dot(nb.cross(nc));
    if denom.abs() < f32::EPSILON {
        return Vec3::ZERO;
    }
    (nb.cross(nc) * -a.w + nc.cross(na) * -b.w + na.cross(nb) * -c.w) / denom
}

fn corners_from_planes(planes: &[Vec4; 6]) -> [Vec3; 8] {
    let [left, right, bottom, top, near, far] =
        [planes[0], planes[1], planes[2], planes[3], planes[4], planes[5]];
    [
        plane_intersection(left, bottom, near),
        plane_intersection(right, bottom, near),
        plane_intersection(left, top, near),
        plane_intersection(right, top, near),
        plane_intersection(left, bottom, far),
        plane_intersection(right, bottom, far),
        plane_intersection(left, top, far),
        plane_intersection(right, top, far),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_directly_ahead_is_inside_the_frustum() {
        let proj = perspective_matrix(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0, false);
        let view = Mat4::look_to_rh(Vec3::ZERO, -Vec3::Z, Vec3::Y);
        let frustum = Frustum::from_view_projection(proj * view);

        let ahead = Aabb::new(Vec3::new(-1.0, -1.0, -11.0), Vec3::new(1.0, 1.0, -9.0));
        assert!(frustum.intersects_aabb(&ahead));
    }

    #[test]
    fn box_behind_the_camera_is_rejected() {
        let proj = perspective_matrix(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0, false);
        let view = Mat4::look_to_rh(Vec3::ZERO, -Vec3::Z, Vec3::Y);
        let frustum = Frustum::from_view_projection(proj * view);

        let behind = Aabb::new(Vec3::new(-1.0, -1.0, 9.0), Vec3::new(1.0, 1.0, 11.0));
        assert!(!frustum.intersects_aabb(&behind));
    }

    #[test]
    fn reverse_z_bounds_the_same_physical_slab() {
        let proj = perspective_matrix(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0, true);
        let view = Mat4::look_to_rh(Vec3::ZERO, -Vec3::Z, Vec3::Y);
        let frustum = Frustum::from_view_projection(proj * view);

        let ahead = Aabb::new(Vec3::new(-1.0, -1.0, -11.0), Vec3::new(1.0, 1.0, -9.0));
        assert!(frustum.intersects_aabb(&ahead));
    }
}
