//! Error taxonomy shared by every crate in the viewer.

use std::path::PathBuf;

use thiserror::Error;

/// Pipeline stage a shader error belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    /// Linking both stages into one pipeline.
    Link,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
            ShaderStage::Link => "link",
        };
        f.write_str(name)
    }
}

/// Fatal viewer errors. None of them are retried.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("Asset error for {path}: {reason}")]
    Asset { path: PathBuf, reason: String },

    #[error("Context error: {0}")]
    Context(String),

    #[error("Shader error ({stage}): {reason}")]
    Shader { stage: ShaderStage, reason: String },

    #[error("Surface error: {0}")]
    Surface(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ViewerError {
    pub fn asset(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Asset {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn shader(stage: ShaderStage, reason: impl ToString) -> Self {
        Self::Shader {
            stage,
            reason: reason.to_string(),
        }
    }
}

pub type ViewerResult<T> = Result<T, ViewerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_single_line() {
        let err = ViewerError::shader(ShaderStage::Fragment, "unknown identifier `uv`");
        assert_eq!(
            err.to_string(),
            "Shader error (fragment): unknown identifier `uv`"
        );

        let err = ViewerError::asset("models/cube.obj", "file not found");
        assert!(err.to_string().contains("models/cube.obj"));
        assert!(!err.to_string().contains('\n'));
    }
}
