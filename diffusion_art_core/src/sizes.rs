use std::{fmt::Display, str::FromStr};

use tracing::warn;

/// Largest width or height handed to the pipeline.
pub const MAX_SIDE: usize = 1024;

/// Size used when a prompt carries no size keyword.
pub const DEFAULT_SIZE: SizePreset = SizePreset::Medium;

/// Named output sizes selectable with a leading keyword in the prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SizePreset {
    Small,
    Medium,
    Large,
    Portrait,
    Landscape,
}

impl SizePreset {
    pub const ALL: [SizePreset; 5] = [
        Self::Small,
        Self::Medium,
        Self::Large,
        Self::Portrait,
        Self::Landscape,
    ];

    /// `(width, height)` in pixels.
    pub fn dimensions(&self) -> (usize, usize) {
        match self {
            Self::Small => (512, 512),
            Self::Medium => (768, 768),
            Self::Large => (1024, 1024),
            Self::Portrait => (768, 1024),
            Self::Landscape => (1024, 768),
        }
    }
}

impl Display for SizePreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Small => write!(f, "small"),
            Self::Medium => write!(f, "medium"),
            Self::Large => write!(f, "large"),
            Self::Portrait => write!(f, "portrait"),
            Self::Landscape => write!(f, "landscape"),
        }
    }
}

impl FromStr for SizePreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            "portrait" => Ok(Self::Portrait),
            "landscape" => Ok(Self::Landscape),
            other => Err(format!("Unknown size: {other}")),
        }
    }
}

/// Cap each side at [`MAX_SIDE`]. The flag reports whether anything was reduced.
pub fn clamp_dimensions(width: usize, height: usize) -> (usize, usize, bool) {
    let clamped = width > MAX_SIDE || height > MAX_SIDE;
    if clamped {
        warn!("reducing {width}x{height} to at most {MAX_SIDE}x{MAX_SIDE} for memory safety");
    }
    (width.min(MAX_SIDE), height.min(MAX_SIDE), clamped)
}
