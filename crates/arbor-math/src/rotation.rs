//! Rotation helpers: axis alignment, spherical coordinates, interpolation.

use crate::{Rotation, Vec3};

/// Golden angle `π(3 − √5)` in radians.
///
/// Successive multiples never line up, which spreads items around a circle
/// without clumping.
pub const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Horizontal length below which a direction counts as vertical.
const VERTICAL_EPS: f64 = 1e-9;

/// Euler angles that carry the +Z axis onto a given direction.
///
/// Apply as `rotate(0, tilt_deg, yaw_deg)`: tilt about Y first, then yaw
/// about Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisAlignment {
    /// Rotation about Z in degrees, `atan2(dy, dx)`.
    pub yaw_deg: f64,
    /// Rotation about Y in degrees, `90° − pitch`.
    pub tilt_deg: f64,
}

impl AxisAlignment {
    /// Compute the alignment for `dir`. Returns `None` for a zero vector.
    ///
    /// Pitch is `atan2(dz, horizontal)`. A direction with no horizontal
    /// component is handled on its own, since `atan2(0, 0)` would give an
    /// arbitrary yaw.
    pub fn from_direction(dir: &Vec3) -> Option<Self> {
        let len = dir.norm();
        if len < VERTICAL_EPS {
            return None;
        }
        let horizontal = dir.x.hypot(dir.y);
        if horizontal < VERTICAL_EPS * len {
            let tilt_deg = if dir.z >= 0.0 { 0.0 } else { 180.0 };
            return Some(Self {
                yaw_deg: 0.0,
                tilt_deg,
            });
        }
        let yaw = dir.y.atan2(dir.x);
        let pitch = dir.z.atan2(horizontal);
        Some(Self {
            yaw_deg: yaw.to_degrees(),
            tilt_deg: 90.0 - pitch.to_degrees(),
        })
    }

    /// The rotation as a quaternion.
    pub fn rotation(&self) -> Rotation {
        euler_xyz_deg(0.0, self.tilt_deg, self.yaw_deg)
    }
}

/// Euler rotation in degrees, applied about X first, then Y, then Z.
///
/// This is the order boolean kernels use for `rotate(x, y, z)`.
pub fn euler_xyz_deg(x_deg: f64, y_deg: f64, z_deg: f64) -> Rotation {
    Rotation::from_euler_angles(x_deg.to_radians(), y_deg.to_radians(), z_deg.to_radians())
}

/// Unit vector from an azimuth around Z and a polar angle measured from +Z.
pub fn spherical_to_cartesian(azimuth: f64, polar: f64) -> Vec3 {
    let (sp, cp) = polar.sin_cos();
    let (sa, ca) = azimuth.sin_cos();
    Vec3::new(sp * ca, sp * sa, cp)
}

/// Linear interpolation between two scalars.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Linear interpolation between two vectors.
pub fn lerp_vec(a: &Vec3, b: &Vec3, t: f64) -> Vec3 {
    a + (b - a) * t
}

/// Two unit vectors perpendicular to `dir` and to each other.
///
/// `dir` must be normalized.
pub fn orthonormal_basis(dir: &Vec3) -> (Vec3, Vec3) {
    let helper = if dir.z.abs() < 0.9 { Vec3::z() } else { Vec3::x() };
    let u = helper.cross(dir).normalize();
    let v = dir.cross(&u);
    (u, v)
}

/// Spherical interpolation between two unit vectors.
pub fn slerp(a: &Vec3, b: &Vec3, t: f64) -> Vec3 {
    let dot = a.dot(b).clamp(-1.0, 1.0);
    let theta = dot.acos();
    if theta < 1e-9 {
        return *a;
    }
    let sin_theta = theta.sin();
    if sin_theta < 1e-9 {
        // Antipodal: any great circle works, rotate through a perpendicular.
        let (u, _) = orthonormal_basis(a);
        let angle = std::f64::consts::PI * t;
        return a * angle.cos() + u * angle.sin();
    }
    let wa = ((1.0 - t) * theta).sin() / sin_theta;
    let wb = (t * theta).sin() / sin_theta;
    a * wa + b * wb
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn aligned(dir: Vec3) -> Vec3 {
        let a = AxisAlignment::from_direction(&dir).unwrap();
        a.rotation() * Vec3::z()
    }

    #[test]
    fn test_euler_order_x_then_z() {
        // +Y rotated 90° about X lands on +Z, which a Z rotation leaves alone.
        let v = euler_xyz_deg(90.0, 0.0, 90.0) * Vec3::y();
        assert!((v - Vec3::z()).norm() < 1e-12, "got {v:?}");
        // +X rotated 90° about Z lands on +Y.
        let v = euler_xyz_deg(0.0, 0.0, 90.0) * Vec3::x();
        assert!((v - Vec3::y()).norm() < 1e-12, "got {v:?}");
    }

    #[test]
    fn test_golden_angle_value() {
        let expected = std::f64::consts::PI * (3.0 - 5f64.sqrt());
        assert_relative_eq!(GOLDEN_ANGLE, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_alignment_maps_z_onto_direction() {
        for dir in [
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.3, -0.4, 0.866).normalize(),
            Vec3::new(-1.0, -1.0, -1.0).normalize(),
            Vec3::new(0.0, 2.0, 0.5).normalize(),
        ] {
            let got = aligned(dir);
            assert!((got - dir).norm() < 1e-9, "dir {dir:?} got {got:?}");
        }
    }

    #[test]
    fn test_alignment_vertical_special_case() {
        let up = AxisAlignment::from_direction(&Vec3::new(0.0, 0.0, 3.0)).unwrap();
        assert_eq!(up.yaw_deg, 0.0);
        assert_eq!(up.tilt_deg, 0.0);

        let down = AxisAlignment::from_direction(&Vec3::new(0.0, 0.0, -1.0)).unwrap();
        assert_eq!(down.tilt_deg, 180.0);
        assert!((aligned(Vec3::new(0.0, 0.0, -1.0)) - Vec3::new(0.0, 0.0, -1.0)).norm() < 1e-9);
    }

    #[test]
    fn test_alignment_zero_direction() {
        assert!(AxisAlignment::from_direction(&Vec3::zeros()).is_none());
    }

    #[test]
    fn test_spherical_to_cartesian() {
        let v = spherical_to_cartesian(0.0, 0.0);
        assert_relative_eq!(v.z, 1.0);
        let v = spherical_to_cartesian(std::f64::consts::FRAC_PI_2, std::f64::consts::FRAC_PI_2);
        assert_relative_eq!(v.y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(v.norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_orthonormal_basis() {
        for dir in [Vec3::z(), Vec3::x(), Vec3::new(1.0, 2.0, 3.0).normalize()] {
            let (u, v) = orthonormal_basis(&dir);
            assert!(u.dot(&dir).abs() < 1e-12);
            assert!(v.dot(&dir).abs() < 1e-12);
            assert!(u.dot(&v).abs() < 1e-12);
            assert_relative_eq!(u.norm(), 1.0, epsilon = 1e-12);
            assert_relative_eq!(v.norm(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_slerp_endpoints_and_midpoint() {
        let a = Vec3::x();
        let b = Vec3::y();
        assert!((slerp(&a, &b, 0.0) - a).norm() < 1e-12);
        assert!((slerp(&a, &b, 1.0) - b).norm() < 1e-12);
        let mid = slerp(&a, &b, 0.5);
        assert_relative_eq!(mid.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(mid.x, mid.y, epsilon = 1e-12);
    }

    #[test]
    fn test_slerp_antipodal_stays_unit() {
        let a = Vec3::z();
        let mid = slerp(&a, &(-a), 0.5);
        assert_relative_eq!(mid.norm(), 1.0, epsilon = 1e-12);
        assert!(mid.z.abs() < 1e-9);
    }

    #[test]
    fn test_lerp() {
        assert_relative_eq!(lerp(2.0, 4.0, 0.25), 2.5);
        let v = lerp_vec(&Vec3::zeros(), &Vec3::new(2.0, 0.0, 0.0), 0.5);
        assert_relative_eq!(v.x, 1.0);
    }
}
