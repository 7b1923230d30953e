//! Math type aliases and helper functions.
//!
//! Engine-facing types are always `f32`. Physics backends convert to their own
//! native precision at the boundary.

pub use nalgebra;

/// 3D vector (f32).
pub type Vec3 = nalgebra::Vector3<f32>;

/// 4x4 matrix (f32).
pub type Mat4 = nalgebra::Matrix4<f32>;

/// Quaternion (f32). Stored as `[x, y, z, w]` in memory.
/// Use [`quat_from_xyzw`] or `Quaternion::new(w, x, y, z)` to construct.
pub type Quat = nalgebra::Quaternion<f32>;

/// Affine matrix that scales, then rotates, then translates.
pub fn mat4_from_scale_rotation_translation(
    scale: Vec3,
    rotation: Quat,
    translation: Vec3,
) -> Mat4 {
    let rotation = nalgebra::UnitQuaternion::new_unchecked(rotation).to_rotation_matrix();
    let linear = rotation.matrix() * nalgebra::Matrix3::from_diagonal(&scale);
    let mut m = linear.to_homogeneous();
    m.fixed_view_mut::<3, 1>(0, 3).copy_from(&translation);
    m
}

pub fn quat_identity() -> Quat {
    Quat::identity()
}

/// `nalgebra` takes `w` first; this takes it last.
pub fn quat_from_xyzw(x: f32, y: f32, z: f32, w: f32) -> Quat {
    Quat::new(w, x, y, z)
}

pub fn quat_from_array([x, y, z, w]: [f32; 4]) -> Quat {
    quat_from_xyzw(x, y, z, w)
}

/// Components in `[x, y, z, w]` order.
pub fn quat_to_array(q: Quat) -> [f32; 4] {
    let c = q.coords;
    [c.x, c.y, c.z, c.w]
}

fn axis_angle(axis: nalgebra::Unit<Vec3>, angle: f32) -> Quat {
    nalgebra::UnitQuaternion::from_axis_angle(&axis, angle).into_inner()
}

/// Rotation of `angle` radians about +X.
pub fn quat_from_rotation_x(angle: f32) -> Quat {
    axis_angle(Vec3::x_axis(), angle)
}

/// Rotation of `angle` radians about +Y.
pub fn quat_from_rotation_y(angle: f32) -> Quat {
    axis_angle(Vec3::y_axis(), angle)
}

/// Rotation of `angle` radians about +Z.
pub fn quat_from_rotation_z(angle: f32) -> Quat {
    axis_angle(Vec3::z_axis(), angle)
}

/// Assumes `q` is unit length.
pub fn quat_rotate_vec3(q: Quat, v: Vec3) -> Vec3 {
    nalgebra::UnitQuaternion::new_unchecked(q) * v
}

/// Unit-length copy of `q`, or identity when `q` is (near) zero.
pub fn quat_normalize(q: Quat) -> Quat {
    q.coords
        .try_normalize(f32::EPSILON)
        .map(Quat::from)
        .unwrap_or_else(Quat::identity)
}

pub fn quat_inverse(q: Quat) -> Quat {
    quat_normalize(q).conjugate()
}

/// Per-component `v / divisor`, yielding 0 wherever the divisor is 0.
pub fn vec3_div_or_zero(v: Vec3, divisor: Vec3) -> Vec3 {
    v.zip_map(&divisor, |a, b| if b == 0.0 { 0.0 } else { a / b })
}

pub fn vec3_max_abs(v: Vec3) -> f32 {
    v.amax()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn identity_trs_matrix() {
        let m = mat4_from_scale_rotation_translation(
            Vec3::new(1.0, 1.0, 1.0),
            quat_identity(),
            Vec3::zeros(),
        );
        assert!((m - Mat4::identity()).norm() < 1e-6);
    }

    #[test]
    fn trs_matrix_places_translation_in_last_column() {
        let m = mat4_from_scale_rotation_translation(
            Vec3::new(2.0, 2.0, 2.0),
            quat_identity(),
            Vec3::new(1.0, 2.0, 3.0),
        );
        assert_eq!(m.column(3).into_owned(), nalgebra::Vector4::new(1.0, 2.0, 3.0, 1.0));
        assert_eq!(m.column(0).into_owned(), nalgebra::Vector4::new(2.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn quat_xyzw_roundtrip() {
        let q = quat_from_xyzw(0.1, 0.2, 0.3, 0.9);
        let arr = quat_to_array(q);
        assert_eq!(arr, [0.1, 0.2, 0.3, 0.9]);
        assert_eq!(quat_from_array(arr), q);
    }

    #[test]
    fn rotation_y_90() {
        let q = quat_from_rotation_y(FRAC_PI_2);
        let v = quat_rotate_vec3(q, Vec3::new(1.0, 0.0, 0.0));
        assert!((v - Vec3::new(0.0, 0.0, -1.0)).norm() < 1e-5);
    }

    #[test]
    fn inverse_undoes_rotation() {
        let q = quat_from_rotation_x(0.7) * quat_from_rotation_z(-1.3);
        let v = Vec3::new(0.3, -2.0, 5.0);
        let back = quat_rotate_vec3(quat_inverse(q), quat_rotate_vec3(q, v));
        assert!((back - v).norm() < 1e-4);
    }

    #[test]
    fn normalize_degenerate_is_identity() {
        assert_eq!(quat_normalize(quat_from_xyzw(0.0, 0.0, 0.0, 0.0)), quat_identity());
    }

    #[test]
    fn normalize_rescales_to_unit_length() {
        let q = quat_normalize(quat_from_xyzw(0.0, 2.0, 0.0, 2.0));
        assert!((q.norm() - 1.0).abs() < 1e-6);
        assert!((quat_to_array(q)[1] - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
    }

    #[test]
    fn div_or_zero_handles_zero_scale() {
        let v = vec3_div_or_zero(Vec3::new(4.0, 3.0, 1.0), Vec3::new(2.0, 0.0, 0.5));
        assert_eq!(v, Vec3::new(2.0, 0.0, 2.0));
    }

    #[test]
    fn max_abs_component() {
        assert_eq!(vec3_max_abs(Vec3::new(-3.0, 2.0, 1.0)), 3.0);
    }
}
