//! Math utilities and types
//!
//! Thin aliases over nalgebra so the rest of the crate speaks in `Vec3`/`Mat4`.

pub use nalgebra::{Matrix4, Vector3, Vector4};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// Double-precision 3D vector, used where cell positions outgrow `f32`
pub type DVec3 = Vector3<f64>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// True when every component is neither NaN nor infinite.
pub fn is_finite(v: &Vec3) -> bool {
    v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
}

/// Largest of the three components
pub fn max_component(v: &Vec3) -> f32 {
    v.x.max(v.y).max(v.z)
}

/// Narrow to `f32`, clamping to the finite range instead of overflowing to infinity
#[allow(clippy::cast_possible_truncation)]
pub fn saturating_f32(v: f64) -> f32 {
    v.clamp(-f64::from(f32::MAX), f64::from(f32::MAX)) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_finite() {
        assert!(is_finite(&Vec3::new(1.0, -2.0, 3.0)));
        assert!(!is_finite(&Vec3::new(f32::NAN, 0.0, 0.0)));
        assert!(!is_finite(&Vec3::new(0.0, f32::INFINITY, 0.0)));
    }

    #[test]
    fn test_max_component() {
        assert_eq!(max_component(&Vec3::new(1.0, 7.0, 3.0)), 7.0);
    }

    #[test]
    fn test_saturating_f32_stays_finite() {
        assert_eq!(saturating_f32(1.0e300), f32::MAX);
        assert_eq!(saturating_f32(-1.0e300), -f32::MAX);
        assert_eq!(saturating_f32(2.5), 2.5);
    }
}
