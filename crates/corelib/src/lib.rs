//! Core types: math re-exports, configuration, errors, camera and transforms.

pub use glam::{Mat4, Vec3, vec3};

pub mod camera;
pub mod config;
pub mod error;
pub mod transform;

pub use config::{GraphicsBackend, ViewerConfig};
pub use error::{ShaderStage, ViewerError, ViewerResult};

#[cfg(test)]
mod tests {
    use super::*;
    use camera::Camera;
    use transform::{FrameTransforms, spin_model};

    #[test]
    fn model_is_identity_at_start() {
        assert_eq!(spin_model(0.0), Mat4::IDENTITY);
    }

    #[test]
    fn model_completes_a_revolution_in_four_seconds() {
        assert!(spin_model(4.0).abs_diff_eq(Mat4::IDENTITY, 1e-5));
        // Quarter turn after one second maps +X onto +Y.
        let x = spin_model(1.0).transform_vector3(Vec3::X);
        assert!(x.abs_diff_eq(Vec3::Y, 1e-6));
    }

    #[test]
    fn model_is_recomputed_not_accumulated() {
        let a = spin_model(2.5);
        let _ = spin_model(1.0);
        assert_eq!(spin_model(2.5), a);
    }

    #[test]
    fn projection_tracks_aspect_ratio() {
        let cam = Camera::viewer(ViewerConfig::default().aspect());
        assert_eq!(cam.aspect, 1280.0 / 720.0);
        let p = cam.proj();
        assert!((p.y_axis.y / p.x_axis.x - 1280.0 / 720.0).abs() < 1e-5);

        let square = ViewerConfig {
            width: 600,
            height: 600,
            ..ViewerConfig::default()
        };
        let p = Camera::viewer(square.aspect()).proj();
        assert!((p.y_axis.y - p.x_axis.x).abs() < 1e-6);
    }

    #[test]
    fn view_looks_at_origin_from_corner() {
        let cam = Camera::viewer(1.0);
        // The origin sits straight ahead on the view -Z axis.
        let origin = cam.view().transform_point3(Vec3::ZERO);
        assert!(origin.x.abs() < 1e-5 && origin.y.abs() < 1e-5);
        assert!((origin.z + 27f32.sqrt()).abs() < 1e-4);
    }

    #[test]
    fn mvp_is_projection_view_model() {
        let cam = Camera::viewer(16.0 / 9.0);
        let t = FrameTransforms::at(0.75, &cam);
        assert!(t.mvp().abs_diff_eq(cam.proj() * cam.view() * spin_model(0.75), 1e-5));
        assert!(t.mvp().to_cols_array().iter().all(|f| f.is_finite()));
    }
}
