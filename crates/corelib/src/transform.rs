//! Per-frame transforms derived from elapsed wall-clock time.

use crate::{Mat4, camera::Camera};

/// Model spin rate around +Z, in degrees per second.
pub const SPIN_DEG_PER_SEC: f32 = 90.0;

/// Model matrix after `elapsed` seconds: rotation about Z by
/// `elapsed * SPIN_DEG_PER_SEC`, recomputed from scratch every call.
#[inline]
pub fn spin_model(elapsed: f32) -> Mat4 {
    Mat4::from_rotation_z((elapsed * SPIN_DEG_PER_SEC).to_radians())
}

/// Model, view and projection for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTransforms {
    pub model: Mat4,
    pub view: Mat4,
    pub proj: Mat4,
}

impl FrameTransforms {
    pub fn at(elapsed: f32, camera: &Camera) -> Self {
        Self {
            model: spin_model(elapsed),
            view: camera.view(),
            proj: camera.proj(),
        }
    }

    /// Clip-space transform applied to vertex positions: P * V * M.
    #[inline]
    pub fn mvp(&self) -> Mat4 {
        self.proj * self.view * self.model
    }
}
