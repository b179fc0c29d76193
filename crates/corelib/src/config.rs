//! Viewer configuration passed into setup instead of process-wide constants.

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{ViewerError, ViewerResult};

/// Graphics API the wgpu instance is restricted to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GraphicsBackend {
    #[default]
    Auto,
    Vulkan,
    Dx12,
    Metal,
    Gl,
}

impl FromStr for GraphicsBackend {
    type Err = String;

    // Accepts: auto|vulkan|dx12|metal|gl and their common aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "vulkan" | "vk" => Ok(Self::Vulkan),
            "dx12" | "d3d12" => Ok(Self::Dx12),
            "metal" | "mtl" => Ok(Self::Metal),
            "gl" | "opengl" | "gles" => Ok(Self::Gl),
            other => Err(format!("unknown backend '{other}'")),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ViewerConfig {
    pub width: u32,
    pub height: u32,
    pub msaa_samples: u32,
    pub title: String,
    pub backend: GraphicsBackend,
    /// OBJ file with geometry and `mtllib` references.
    pub asset_path: PathBuf,
    /// Directory MTL files are resolved against.
    pub material_dir: PathBuf,
    /// Directory diffuse textures are resolved against.
    pub texture_dir: PathBuf,
    pub vertex_shader_path: PathBuf,
    pub fragment_shader_path: PathBuf,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            msaa_samples: 4,
            title: "ModelViewer".to_owned(),
            backend: GraphicsBackend::Auto,
            asset_path: PathBuf::from("models/cube.obj"),
            material_dir: PathBuf::from("models"),
            texture_dir: PathBuf::from("tex"),
            vertex_shader_path: PathBuf::from("shaders/model.vert.wgsl"),
            fragment_shader_path: PathBuf::from("shaders/model.frag.wgsl"),
        }
    }
}

impl ViewerConfig {
    /// Logical aspect ratio used by the projection.
    #[inline]
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Full path of a material's diffuse texture.
    pub fn texture_path(&self, diffuse_texture: &str) -> PathBuf {
        self.texture_dir.join(diffuse_texture)
    }

    pub fn validate(&self) -> ViewerResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ViewerError::Config(format!(
                "window size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if !matches!(self.msaa_samples, 1 | 2 | 4 | 8 | 16) {
            return Err(ViewerError::Config(format!(
                "msaa_samples must be 1, 2, 4, 8 or 16, got {}",
                self.msaa_samples
            )));
        }
        Ok(())
    }
}
