use std::{fs, path::PathBuf, time::Instant};

use chrono::Local;
use image::{imageops::FilterType, DynamicImage};
use tracing::{info, warn};

use crate::{
    config::GeneratorConfig,
    error::{classify, ArtError, Result},
    naming::{fallback_file_name, output_file_name, unique_path},
    pipeline::{GenerationParams, TextToImage},
    prompt::Style,
    sizes::{clamp_dimensions, SizePreset, DEFAULT_SIZE},
};

const UPSCALE_FACTOR: u32 = 2;

/// A prompt and the size to render it at.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub width: usize,
    pub height: usize,
    pub upscale: bool,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, width: usize, height: usize) -> Self {
        Self {
            prompt: prompt.into(),
            width,
            height,
            upscale: false,
        }
    }

    pub fn with_preset(prompt: impl Into<String>, preset: SizePreset) -> Self {
        let (width, height) = preset.dimensions();
        Self::new(prompt, width, height)
    }

    /// Wrap `description` in `style`'s template. Plain style renders at the default size.
    pub fn styled(style: Style, description: &str, high_quality: bool) -> Self {
        let (width, height) = style
            .dimensions(high_quality)
            .unwrap_or_else(|| DEFAULT_SIZE.dimensions());
        Self::new(style.apply(description), width, height)
    }

    pub fn upscaled(mut self, upscale: bool) -> Self {
        self.upscale = upscale;
        self
    }
}

/// A saved image.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedImage {
    pub path: PathBuf,
    /// Final pixel size of the saved file, after any upscaling.
    pub width: u32,
    pub height: u32,
    /// Produced by the reduced-size retry after running out of memory.
    pub fallback: bool,
}

/// Resize by an integer factor with a Lanczos filter.
pub fn upscale(image: &DynamicImage, factor: u32) -> DynamicImage {
    image.resize_exact(
        image.width() * factor,
        image.height() * factor,
        FilterType::Lanczos3,
    )
}

/// Drives a loaded pipeline and writes its output to disk.
pub struct ArtGenerator<P> {
    pipeline: P,
    config: GeneratorConfig,
}

impl<P: TextToImage> ArtGenerator<P> {
    /// Validates `config` and creates the output directory.
    pub fn new(pipeline: P, config: GeneratorConfig) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.output_dir)?;
        Ok(Self { pipeline, config })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Generate and save one image.
    ///
    /// Sizes above 1024 on either side are reduced first. If the pipeline runs out of memory,
    /// a single retry is made at the configured fallback size and saved under a fallback name.
    pub fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage> {
        let (width, height, _) = clamp_dimensions(request.width, request.height);
        let params = GenerationParams {
            width,
            height,
            num_steps: self.config.num_steps,
            guidance_scale: self.config.guidance_scale,
        };

        match self.run(&request.prompt, &params) {
            Ok(image) => {
                let image = if request.upscale || self.config.upscale {
                    info!("upscaling {UPSCALE_FACTOR}x");
                    upscale(&image, UPSCALE_FACTOR)
                } else {
                    image
                };
                let name = output_file_name(&request.prompt, width, height, &Local::now());
                self.save(&image, &name, false)
            }
            Err(e) if e.is_recoverable() => {
                warn!("{e}");
                self.fallback(&request.prompt)
            }
            Err(e) => Err(e),
        }
    }

    pub fn generate_preset(&self, prompt: &str, preset: SizePreset) -> Result<GeneratedImage> {
        info!("generating {preset} image");
        self.generate(&GenerationRequest::with_preset(prompt, preset))
    }

    pub fn generate_portrait(
        &self,
        description: &str,
        high_quality: bool,
    ) -> Result<GeneratedImage> {
        self.generate(&GenerationRequest::styled(
            Style::Portrait,
            description,
            high_quality,
        ))
    }

    pub fn generate_landscape(
        &self,
        description: &str,
        high_quality: bool,
    ) -> Result<GeneratedImage> {
        self.generate(&GenerationRequest::styled(
            Style::Landscape,
            description,
            high_quality,
        ))
    }

    fn fallback(&self, prompt: &str) -> Result<GeneratedImage> {
        let params = GenerationParams {
            width: self.config.fallback_width,
            height: self.config.fallback_height,
            num_steps: self.config.fallback_steps,
            guidance_scale: self.config.guidance_scale,
        };
        info!(
            "retrying at {}x{} with {} steps",
            params.width, params.height, params.num_steps
        );

        let image = self
            .run(prompt, &params)
            .map_err(|e| ArtError::FallbackFailed(Box::new(e)))?;
        self.save(&image, &fallback_file_name(&Local::now()), true)
    }

    fn run(&self, prompt: &str, params: &GenerationParams) -> Result<DynamicImage> {
        info!(
            "generating {}x{}, {} steps: {prompt:?}",
            params.width, params.height, params.num_steps
        );
        let start = Instant::now();
        let images = self
            .pipeline
            .generate(prompt, params)
            .map_err(|e| classify(e, params.width, params.height))?;
        info!("generation took {:.2}s", start.elapsed().as_secs_f32());

        images.into_iter().next().ok_or(ArtError::EmptyOutput)
    }

    fn save(&self, image: &DynamicImage, name: &str, fallback: bool) -> Result<GeneratedImage> {
        let path = unique_path(&self.config.output_dir, name);
        image.save(&path)?;
        info!("saved {}", path.display());

        Ok(GeneratedImage {
            path,
            width: image.width(),
            height: image.height(),
            fallback,
        })
    }
}
