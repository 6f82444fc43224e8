use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ArtError>;

/// Substrings (lower-case) that mark a pipeline failure as memory pressure.
const MEMORY_MARKERS: [&str; 4] = ["out of memory", "memory", "timeout", "failed to allocate"];

#[derive(Debug, Error)]
pub enum ArtError {
    #[error("invalid config: {0}")]
    Config(String),

    #[error("could not read config {path}: {source}")]
    ConfigFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("model loading failed: {0:#}")]
    ModelLoad(anyhow::Error),

    #[error("out of memory generating {width}x{height}: {message}")]
    OutOfMemory {
        width: usize,
        height: usize,
        message: String,
    },

    #[error("generation failed: {0:#}")]
    Generation(anyhow::Error),

    #[error("fallback generation also failed: {0}")]
    FallbackFailed(Box<ArtError>),

    #[error("pipeline returned no images")]
    EmptyOutput,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

impl ArtError {
    /// Whether a smaller fallback generation is worth attempting.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::OutOfMemory { .. })
    }
}

/// Sort a pipeline failure at `width`x`height` into out-of-memory or a plain generation error.
pub fn classify(err: anyhow::Error, width: usize, height: usize) -> ArtError {
    let message = format!("{err:#}");
    let lower = message.to_lowercase();
    if MEMORY_MARKERS.iter().any(|m| lower.contains(m)) {
        ArtError::OutOfMemory {
            width,
            height,
            message,
        }
    } else {
        ArtError::Generation(err)
    }
}
