//! Shader source files, read as text before any GPU work starts.

use std::path::{Path, PathBuf};

use corelib::{ShaderStage, ViewerError, ViewerResult};

/// Vertex and fragment WGSL sources plus where they came from.
#[derive(Clone, Debug)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
    pub vertex_path: PathBuf,
    pub fragment_path: PathBuf,
}

impl ShaderSources {
    pub fn load(vertex_path: impl AsRef<Path>, fragment_path: impl AsRef<Path>) -> ViewerResult<Self> {
        let vertex_path = vertex_path.as_ref();
        let fragment_path = fragment_path.as_ref();
        let vertex = read_source(vertex_path, ShaderStage::Vertex)?;
        let fragment = read_source(fragment_path, ShaderStage::Fragment)?;
        log::info!(
            "Read shaders {:?} ({} bytes) and {:?} ({} bytes)",
            vertex_path,
            vertex.len(),
            fragment_path,
            fragment.len()
        );
        Ok(Self {
            vertex,
            fragment,
            vertex_path: vertex_path.to_path_buf(),
            fragment_path: fragment_path.to_path_buf(),
        })
    }

    /// Sources that did not come from disk (tests, embedded defaults).
    pub fn from_strings(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
            vertex_path: PathBuf::from("<vertex>"),
            fragment_path: PathBuf::from("<fragment>"),
        }
    }
}

fn read_source(path: &Path, stage: ShaderStage) -> ViewerResult<String> {
    let source = std::fs::read_to_string(path)
        .map_err(|e| ViewerError::shader(stage, format!("failed to read {}: {e}", path.display())))?;
    if source.trim().is_empty() {
        return Err(ViewerError::shader(stage, format!("{} is empty", path.display())));
    }
    Ok(source)
}
