//! Conversions between engine math types and each backend's native types.
//!
//! The rapier backend works in `f32`; the impulse backend in `f64`. Each
//! backend converts at its boundary so `PhysicsWorld` only ever sees
//! [`Vec3`]/[`Quat`].

use origin_core::math::{quat_from_xyzw, quat_normalize, Quat, Vec3};

/// rapier3d (f32) native types.
pub mod rapier {
    use super::*;
    use rapier3d::na::{Isometry3, Quaternion, Translation3, UnitQuaternion, Vector3};

    pub fn vec3_to_native(v: Vec3) -> Vector3<f32> {
        Vector3::new(v.x, v.y, v.z)
    }

    pub fn vec3_from_native(v: &Vector3<f32>) -> Vec3 {
        Vec3::new(v.x, v.y, v.z)
    }

    pub fn quat_to_native(q: Quat) -> UnitQuaternion<f32> {
        let q = quat_normalize(q);
        UnitQuaternion::new_unchecked(Quaternion::new(q.w, q.i, q.j, q.k))
    }

    pub fn quat_from_native(q: &UnitQuaternion<f32>) -> Quat {
        let q = q.quaternion();
        quat_from_xyzw(q.i, q.j, q.k, q.w)
    }

    pub fn isometry_to_native(translation: Vec3, rotation: Quat) -> Isometry3<f32> {
        let t = vec3_to_native(translation);
        Isometry3::from_parts(Translation3::new(t.x, t.y, t.z), quat_to_native(rotation))
    }

    pub fn isometry_from_native(iso: &Isometry3<f32>) -> (Vec3, Quat) {
        (
            vec3_from_native(&iso.translation.vector),
            quat_from_native(&iso.rotation),
        )
    }
}

/// parry3d-f64 native types used by the impulse backend.
pub mod impulse {
    use super::*;
    use parry3d_f64::na::{Isometry3, Quaternion, Translation3, UnitQuaternion, Vector3};

    pub fn vec3_to_native(v: Vec3) -> Vector3<f64> {
        Vector3::new(v.x as f64, v.y as f64, v.z as f64)
    }

    pub fn vec3_from_native(v: &Vector3<f64>) -> Vec3 {
        Vec3::new(v.x as f32, v.y as f32, v.z as f32)
    }

    pub fn quat_to_native(q: Quat) -> UnitQuaternion<f64> {
        UnitQuaternion::new_normalize(Quaternion::new(
            q.w as f64, q.i as f64, q.j as f64, q.k as f64,
        ))
    }

    pub fn quat_from_native(q: &UnitQuaternion<f64>) -> Quat {
        let q = q.quaternion();
        quat_from_xyzw(q.i as f32, q.j as f32, q.k as f32, q.w as f32)
    }

    pub fn isometry_to_native(translation: Vec3, rotation: Quat) -> Isometry3<f64> {
        let t = vec3_to_native(translation);
        Isometry3::from_parts(Translation3::new(t.x, t.y, t.z), quat_to_native(rotation))
    }

    pub fn isometry_from_native(iso: &Isometry3<f64>) -> (Vec3, Quat) {
        (
            vec3_from_native(&iso.translation.vector),
            quat_from_native(&iso.rotation),
        )
    }
}
