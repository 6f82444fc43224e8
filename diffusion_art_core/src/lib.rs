//! Core crate for diffusion_art.
//!
//! Wraps a [`diffusion_rs_core::Pipeline`] with prompt handling, size presets, an out-of-memory
//! fallback and timestamped PNG output.
//!
//! ```rust,no_run
//! use diffusion_art_core::{load_pipeline, ArtGenerator, GeneratorConfig, SizePreset};
//!
//! let config = GeneratorConfig::default();
//! let pipeline = load_pipeline(&config)?;
//! let generator = ArtGenerator::new(pipeline, config)?;
//!
//! let image = generator.generate_preset("a beautiful sunset over mountains", SizePreset::Medium)?;
//! println!("saved {}", image.path.display());
//!
//! # Ok::<(), anyhow::Error>(())
//! ```

mod config;
mod error;
mod generator;
mod naming;
mod pipeline;
mod prompt;
mod sizes;

pub use config::GeneratorConfig;
pub use error::{classify, ArtError, Result};
pub use generator::{upscale, ArtGenerator, GeneratedImage, GenerationRequest};
pub use naming::{fallback_file_name, output_file_name, sanitize_prompt, unique_path};
pub use pipeline::{compiled_backend, load_pipeline, GenerationParams, TextToImage};
pub use prompt::{parse_line, Command, Style};
pub use sizes::{clamp_dimensions, SizePreset, DEFAULT_SIZE, MAX_SIDE};
