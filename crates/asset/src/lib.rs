//! Asset loading (meshes, textures, shader sources).
//! Meshes come from `tobj`, images from `image`; both are flattened into
//! plain CPU buffers before any GPU work starts.

pub mod bundle;
pub mod mesh;
pub mod obj;
pub mod shader;
pub mod texture;

pub use bundle::ViewerAssets;
pub use mesh::{MaterialInfo, Mesh, MeshPart, ModelData};
pub use shader::ShaderSources;
pub use texture::{TextureData, TextureFormat};
