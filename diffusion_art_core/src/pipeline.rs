use std::time::Instant;

use diffusion_rs_core::{
    DiffusionGenerationParams, ModelSource, Offloading, Pipeline, TokenSource,
};
use image::DynamicImage;
use tracing::info;

use crate::{
    config::GeneratorConfig,
    error::{ArtError, Result},
};

/// Settings for one pipeline call.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationParams {
    pub width: usize,
    pub height: usize,
    pub num_steps: usize,
    pub guidance_scale: f64,
}

/// Anything that turns a prompt into images.
pub trait TextToImage {
    fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> anyhow::Result<Vec<DynamicImage>>;
}

impl TextToImage for Pipeline {
    fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> anyhow::Result<Vec<DynamicImage>> {
        self.forward(
            vec![prompt.to_string()],
            DiffusionGenerationParams {
                height: params.height,
                width: params.width,
                num_steps: params.num_steps,
                guidance_scale: params.guidance_scale,
            },
        )
    }
}

/// Name of the accelerator backend this binary was built for.
pub fn compiled_backend() -> &'static str {
    if cfg!(feature = "cudnn") {
        "cuda (cudnn)"
    } else if cfg!(feature = "cuda") {
        "cuda"
    } else if cfg!(feature = "metal") {
        "metal"
    } else if cfg!(feature = "accelerate") {
        "cpu (accelerate)"
    } else if cfg!(feature = "mkl") {
        "cpu (mkl)"
    } else {
        "cpu"
    }
}

/// Load the pretrained pipeline described by `config`.
pub fn load_pipeline(config: &GeneratorConfig) -> Result<Pipeline> {
    let source = match &config.dduf_file {
        Some(file) => ModelSource::dduf(file.display()).map_err(ArtError::ModelLoad)?,
        None => ModelSource::from_model_id(&config.model_id),
    };
    let token = config
        .token
        .clone()
        .map(TokenSource::Literal)
        .unwrap_or(TokenSource::CacheToken);
    let offloading = config.cpu_offload.then_some(Offloading::Full);

    info!("device backend: {}", compiled_backend());
    info!("model source: {source}");
    info!("cpu offload: {}", config.cpu_offload);

    let start = Instant::now();
    let pipeline = Pipeline::load(
        source,
        config.silent,
        token,
        config.revision.clone(),
        offloading,
    )
    .map_err(ArtError::ModelLoad)?;
    info!("model loaded in {:.2}s", start.elapsed().as_secs_f32());

    Ok(pipeline)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(any(
        feature = "cuda",
        feature = "cudnn",
        feature = "metal",
        feature = "accelerate",
        feature = "mkl"
    )))]
    fn default_build_reports_cpu() {
        assert_eq!(compiled_backend(), "cpu");
    }

    #[test]
    #[cfg(feature = "cudnn")]
    fn cudnn_build_reports_cuda() {
        assert!(cfg!(feature = "cuda"));
        assert_eq!(compiled_backend(), "cuda (cudnn)");
    }

    #[test]
    #[cfg(all(feature = "accelerate", not(any(feature = "cuda", feature = "metal"))))]
    fn accelerate_build_is_named() {
        assert_eq!(compiled_backend(), "cpu (accelerate)");
    }

    #[test]
    #[cfg(all(
        feature = "mkl",
        not(any(feature = "cuda", feature = "metal", feature = "accelerate"))
    ))]
    fn mkl_build_is_named() {
        assert_eq!(compiled_backend(), "cpu (mkl)");
    }
}
