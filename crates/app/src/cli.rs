use std::path::PathBuf;

use clap::Parser;
use corelib::{GraphicsBackend, ViewerConfig};

/// Every option is optional; running with no arguments uses the defaults.
#[derive(Parser, Debug)]
#[command(
    name = "model-viewer",
    version,
    about = "Render a textured OBJ model spinning about its Z axis"
)]
pub struct Cli {
    /// Window width in pixels.
    #[arg(long, env = "MODEL_VIEWER_WIDTH")]
    pub width: Option<u32>,

    /// Window height in pixels.
    #[arg(long, env = "MODEL_VIEWER_HEIGHT")]
    pub height: Option<u32>,

    /// Requested MSAA sample count (1, 2, 4, 8 or 16).
    #[arg(long, env = "MODEL_VIEWER_MSAA_SAMPLES")]
    pub msaa_samples: Option<u32>,

    /// Window title.
    #[arg(long, env = "MODEL_VIEWER_TITLE")]
    pub title: Option<String>,

    /// Graphics backend: auto|vulkan|dx12|metal|gl.
    #[arg(long = "gpu-backend", env = "MODEL_VIEWER_GPU_BACKEND", value_name = "BACKEND")]
    pub backend: Option<GraphicsBackend>,

    /// OBJ file to display.
    #[arg(long = "model", env = "MODEL_VIEWER_MODEL", value_name = "FILE")]
    pub asset_path: Option<PathBuf>,

    /// Directory MTL libraries are resolved against.
    #[arg(long, env = "MODEL_VIEWER_MATERIAL_DIR", value_name = "DIR")]
    pub material_dir: Option<PathBuf>,

    /// Directory diffuse textures are resolved against.
    #[arg(long, env = "MODEL_VIEWER_TEXTURE_DIR", value_name = "DIR")]
    pub texture_dir: Option<PathBuf>,

    /// WGSL vertex shader.
    #[arg(long, env = "MODEL_VIEWER_VERTEX_SHADER", value_name = "FILE")]
    pub vertex_shader: Option<PathBuf>,

    /// WGSL fragment shader.
    #[arg(long, env = "MODEL_VIEWER_FRAGMENT_SHADER", value_name = "FILE")]
    pub fragment_shader: Option<PathBuf>,
}

impl Cli {
    /// Overlay the given flags on the default configuration.
    pub fn into_config(self) -> ViewerConfig {
        let d = ViewerConfig::default();
        ViewerConfig {
            width: self.width.unwrap_or(d.width),
            height: self.height.unwrap_or(d.height),
            msaa_samples: self.msaa_samples.unwrap_or(d.msaa_samples),
            title: self.title.unwrap_or(d.title),
            backend: self.backend.unwrap_or(d.backend),
            asset_path: self.asset_path.unwrap_or(d.asset_path),
            material_dir: self.material_dir.unwrap_or(d.material_dir),
            texture_dir: self.texture_dir.unwrap_or(d.texture_dir),
            vertex_shader_path: self.vertex_shader.unwrap_or(d.vertex_shader_path),
            fragment_shader_path: self.fragment_shader.unwrap_or(d.fragment_shader_path),
        }
    }
}
