use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{ArtError, Result};

pub const DEFAULT_MODEL_ID: &str = "black-forest-labs/FLUX.1-schnell";
const CONFIG_DIR_NAME: &str = "diffusion_art";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Everything needed to load a pipeline and run generations.
///
/// Every field has a default, so a config file only needs the keys it changes:
///
/// ```toml
/// model_id = "black-forest-labs/FLUX.1-dev"
/// num_steps = 50
/// guidance_scale = 3.5
/// cpu_offload = true
/// ```
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Hugging Face model ID or local path.
    pub model_id: String,
    /// DDUF file. Takes precedence over `model_id`.
    pub dduf_file: Option<PathBuf>,
    /// Literal Hugging Face token. The cached token is used when unset.
    pub token: Option<String>,
    pub revision: Option<String>,
    /// Keep weights on the CPU and move each component to the device only while it runs.
    pub cpu_offload: bool,
    pub output_dir: PathBuf,
    pub num_steps: usize,
    pub guidance_scale: f64,
    pub fallback_width: usize,
    pub fallback_height: usize,
    pub fallback_steps: usize,
    /// Upscale 2x with Lanczos after generation.
    pub upscale: bool,
    /// Silence the library's download and step progress bars.
    pub silent: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_MODEL_ID.to_string(),
            dduf_file: None,
            token: None,
            revision: None,
            cpu_offload: false,
            output_dir: PathBuf::from("outputs"),
            num_steps: 4,
            guidance_scale: 0.0,
            fallback_width: 512,
            fallback_height: 512,
            fallback_steps: 4,
            upscale: false,
            silent: false,
        }
    }
}

impl GeneratorConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ArtError::ConfigFile {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ArtError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `~/.config/diffusion_art/config.toml` on Linux, the platform equivalent elsewhere.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load `explicit` if given, else the default path if it exists, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            info!("loading config from {}", path.display());
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => {
                info!("loading config from {}", path.display());
                Self::from_file(path)
            }
            _ => {
                debug!("no config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.dduf_file.is_none() && self.model_id.trim().is_empty() {
            return Err(ArtError::Config("model_id must not be empty".to_string()));
        }
        if self.num_steps == 0 {
            return Err(ArtError::Config("num_steps must be at least 1".to_string()));
        }
        if self.fallback_steps == 0 {
            return Err(ArtError::Config(
                "fallback_steps must be at least 1".to_string(),
            ));
        }
        if self.fallback_width == 0 || self.fallback_height == 0 {
            return Err(ArtError::Config(
                "fallback dimensions must be nonzero".to_string(),
            ));
        }
        Ok(())
    }
}
