use std::{cell::RefCell, path::Path};

use anyhow::anyhow;
use diffusion_art_core::{
    ArtError, ArtGenerator, GenerationParams, GenerationRequest, GeneratorConfig, SizePreset,
    TextToImage,
};
use image::DynamicImage;

/// Renders blank images, failing with a CUDA-style OOM above `max_pixels`.
#[derive(Default)]
struct MockPipeline {
    max_pixels: Option<usize>,
    error: Option<&'static str>,
    empty: bool,
    calls: RefCell<Vec<GenerationParams>>,
}

impl TextToImage for MockPipeline {
    fn generate(
        &self,
        _prompt: &str,
        params: &GenerationParams,
    ) -> anyhow::Result<Vec<DynamicImage>> {
        self.calls.borrow_mut().push(params.clone());
        if let Some(msg) = self.error {
            return Err(anyhow!(msg));
        }
        if self
            .max_pixels
            .is_some_and(|max| params.width * params.height > max)
        {
            return Err(anyhow!(
                "DriverError(CUDA_ERROR_OUT_OF_MEMORY, \"out of memory\")"
            ));
        }
        if self.empty {
            return Ok(vec![]);
        }
        Ok(vec![DynamicImage::new_rgb8(
            params.width as u32,
            params.height as u32,
        )])
    }
}

fn generator(pipeline: MockPipeline, out: &Path) -> ArtGenerator<MockPipeline> {
    let config = GeneratorConfig {
        output_dir: out.join("outputs"),
        num_steps: 25,
        guidance_scale: 7.5,
        fallback_steps: 20,
        ..Default::default()
    };
    ArtGenerator::new(pipeline, config).unwrap()
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().into_owned()
}

#[test]
fn creates_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    let _ = generator(MockPipeline::default(), dir.path());
    assert!(dir.path().join("outputs").is_dir());
}

#[test]
fn saves_png_named_after_prompt_and_size() {
    let dir = tempfile::tempdir().unwrap();
    let gen = generator(MockPipeline::default(), dir.path());

    let out = gen
        .generate_preset("a majestic wolf, in snowy forest", SizePreset::Portrait)
        .unwrap();

    assert!(!out.fallback);
    assert_eq!((out.width, out.height), (768, 1024));
    assert!(out.path.starts_with(dir.path().join("outputs")));
    let name = file_name(&out.path);
    assert!(name.starts_with("art_a majestic wolf in_768x1024_"), "{name}");
    assert!(name.ends_with(".png"));

    let saved = image::open(&out.path).unwrap();
    assert_eq!((saved.width(), saved.height()), (768, 1024));

    let calls = gen.pipeline().calls.borrow();
    assert_eq!(
        calls.as_slice(),
        [GenerationParams {
            width: 768,
            height: 1024,
            num_steps: 25,
            guidance_scale: 7.5,
        }]
    );
}

#[test]
fn oversized_requests_are_clamped() {
    let dir = tempfile::tempdir().unwrap();
    let gen = generator(MockPipeline::default(), dir.path());

    let out = gen
        .generate(&GenerationRequest::new("huge", 2048, 1536))
        .unwrap();

    assert_eq!((out.width, out.height), (1024, 1024));
    assert!(file_name(&out.path).contains("_1024x1024_"));
}

#[test]
fn out_of_memory_falls_back_once() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = MockPipeline {
        max_pixels: Some(512 * 512),
        ..Default::default()
    };
    let gen = generator(pipeline, dir.path());

    let out = gen
        .generate_preset("a beautiful sunset", SizePreset::Large)
        .unwrap();

    assert!(out.fallback);
    assert_eq!((out.width, out.height), (512, 512));
    assert!(file_name(&out.path).starts_with("art_fallback_"));

    let calls = gen.pipeline().calls.borrow();
    assert_eq!(calls.len(), 2);
    assert_eq!((calls[1].width, calls[1].height), (512, 512));
    assert_eq!(calls[1].num_steps, 20);
}

#[test]
fn failed_fallback_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = MockPipeline {
        max_pixels: Some(64 * 64),
        ..Default::default()
    };
    let gen = generator(pipeline, dir.path());

    let err = gen
        .generate_preset("a beautiful sunset", SizePreset::Medium)
        .unwrap_err();

    assert!(matches!(err, ArtError::FallbackFailed(inner) if inner.is_recoverable()));
    assert_eq!(gen.pipeline().calls.borrow().len(), 2);
}

#[test]
fn other_errors_do_not_retry() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = MockPipeline {
        error: Some("shape mismatch in matmul"),
        ..Default::default()
    };
    let gen = generator(pipeline, dir.path());

    let err = gen
        .generate(&GenerationRequest::new("a cat", 512, 512))
        .unwrap_err();

    assert!(matches!(err, ArtError::Generation(_)));
    assert_eq!(gen.pipeline().calls.borrow().len(), 1);
}

#[test]
fn empty_output_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = MockPipeline {
        empty: true,
        ..Default::default()
    };
    let gen = generator(pipeline, dir.path());

    assert!(matches!(
        gen.generate(&GenerationRequest::new("a cat", 512, 512)),
        Err(ArtError::EmptyOutput)
    ));
}

#[test]
fn upscale_doubles_saved_size_but_not_name() {
    let dir = tempfile::tempdir().unwrap();
    let gen = generator(MockPipeline::default(), dir.path());

    let out = gen
        .generate(&GenerationRequest::new("tiny", 64, 32).upscaled(true))
        .unwrap();

    assert_eq!((out.width, out.height), (128, 64));
    assert!(file_name(&out.path).contains("_64x32_"));
}

#[test]
fn styled_requests_use_template_and_size() {
    let dir = tempfile::tempdir().unwrap();
    let gen = generator(MockPipeline::default(), dir.path());

    let portrait = gen.generate_portrait("an old fisherman", false).unwrap();
    assert_eq!((portrait.width, portrait.height), (768, 768));
    assert!(file_name(&portrait.path).starts_with("art_professional portrai_"));

    let landscape = gen.generate_landscape("misty fjord", true).unwrap();
    assert_eq!((landscape.width, landscape.height), (1024, 768));
}

#[test]
fn same_second_outputs_do_not_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let gen = generator(MockPipeline::default(), dir.path());
    let request = GenerationRequest::new("repeat", 16, 16);

    let first = gen.generate(&request).unwrap();
    let second = gen.generate(&request).unwrap();

    assert_ne!(first.path, second.path);
    assert!(first.path.exists() && second.path.exists());
}

#[test]
fn invalid_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = GeneratorConfig {
        output_dir: dir.path().join("outputs"),
        num_steps: 0,
        ..Default::default()
    };
    assert!(matches!(
        ArtGenerator::new(MockPipeline::default(), config),
        Err(ArtError::Config(_))
    ));
}
