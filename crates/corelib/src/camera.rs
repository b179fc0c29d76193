use crate::{Mat4, Vec3};

/// Fixed viewer camera (right-handed, wgpu depth range [0, 1]).
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_rad: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub aspect: f32,
}

impl Camera {
    /// Eye at (3, 3, 3) looking at the origin, Z up, 45 degree vertical FOV,
    /// clip planes 0.1..100.
    pub fn viewer(aspect: f32) -> Self {
        Self {
            eye: Vec3::splat(3.0),
            target: Vec3::ZERO,
            up: Vec3::Z,
            fov_y_rad: 45f32.to_radians(),
            z_near: 0.1,
            z_far: 100.0,
            aspect,
        }
    }

    #[inline]
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    #[inline]
    pub fn proj(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y_rad,
            self.aspect.max(1e-6),
            self.z_near,
            self.z_far,
        )
    }
}
