use std::{io, path::PathBuf, time::Instant};

use clap::Parser;
use cliclack::{input, intro, log, outro};
use diffusion_art_core::{
    load_pipeline, parse_line, ArtGenerator, Command, GenerationRequest, GeneratorConfig,
    SizePreset, Style, TextToImage, DEFAULT_SIZE,
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Model ID to load (local path or Hugging Face model ID).
    #[arg(short, long, conflicts_with = "dduf")]
    model_id: Option<String>,

    /// Load the model from a DDUF file instead of a model ID.
    #[arg(long)]
    dduf: Option<PathBuf>,

    /// Hugging Face token. Useful for accessing gated repositories.
    /// By default, the Hugging Face token at ~/.cache/huggingface/token is used.
    #[arg(long)]
    token: Option<String>,

    /// Model revision to load.
    #[arg(long)]
    revision: Option<String>,

    /// Offload the largest model components to CPU memory.
    /// Can only switch offloading on; `cpu_offload = true` in the config file stays on.
    #[arg(long)]
    offload: bool,

    /// Number of denoising steps. This is model specific.
    #[arg(short, long)]
    num_steps: Option<usize>,

    /// Guidance scale to use. This is model specific.
    #[arg(short, long)]
    scale: Option<f64>,

    /// Directory generated images are written to.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Upscale every image 2x after generation.
    /// Can only switch upscaling on; `upscale = true` in the config file stays on.
    #[arg(long)]
    upscale: bool,

    /// Config file. Defaults to diffusion_art/config.toml in the user config directory.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Photography template applied to prompts (plain, portrait, landscape).
    #[arg(long, default_value = "plain")]
    style: Style,

    /// Generate these prompts and exit instead of starting the interactive loop.
    #[arg(short, long)]
    prompt: Vec<String>,
}

impl Args {
    fn resolve_config(&self) -> anyhow::Result<GeneratorConfig> {
        let mut config = GeneratorConfig::load(self.config.as_deref())?;
        if let Some(model_id) = &self.model_id {
            config.model_id = model_id.clone();
            config.dduf_file = None;
        }
        if let Some(dduf) = &self.dduf {
            config.dduf_file = Some(dduf.clone());
        }
        if let Some(token) = &self.token {
            config.token = Some(token.clone());
        }
        if let Some(revision) = &self.revision {
            config.revision = Some(revision.clone());
        }
        if let Some(num_steps) = self.num_steps {
            config.num_steps = num_steps;
        }
        if let Some(scale) = self.scale {
            config.guidance_scale = scale;
        }
        if let Some(output_dir) = &self.output_dir {
            config.output_dir = output_dir.clone();
        }
        config.cpu_offload |= self.offload;
        config.upscale |= self.upscale;
        config.validate()?;
        Ok(config)
    }
}

/// An explicit size keyword wins over the style's size, which wins over the default.
fn build_request(size: Option<SizePreset>, prompt: &str, style: Style) -> GenerationRequest {
    let (width, height) = size
        .map(|preset| preset.dimensions())
        .or_else(|| style.dimensions(true))
        .unwrap_or_else(|| DEFAULT_SIZE.dimensions());
    GenerationRequest::new(style.apply(prompt), width, height)
}

/// Generate one request and report the outcome. Returns whether an image was saved.
fn run_request<P: TextToImage>(
    generator: &ArtGenerator<P>,
    request: &GenerationRequest,
) -> io::Result<bool> {
    log::step(format!(
        "Generating {}x{}: {}",
        request.width, request.height, request.prompt
    ))?;
    let start = Instant::now();

    match generator.generate(request) {
        Ok(image) => {
            if image.fallback {
                log::warning("Ran out of memory, saved a smaller fallback image instead")?;
            }
            log::success(format!(
                "Saved {} ({}x{}) in {:.2}s",
                image.path.display(),
                image.width,
                image.height,
                start.elapsed().as_secs_f32()
            ))?;
            Ok(true)
        }
        Err(e) => {
            log::error(format!("Failed to generate: {e}"))?;
            Ok(false)
        }
    }
}

fn interactive<P: TextToImage>(generator: &ArtGenerator<P>, style: Style) -> anyhow::Result<()> {
    log::remark("Ready! Type 'quit' to exit. Prefix a prompt with small, medium, large, portrait or landscape to pick a size.")?;

    loop {
        let line: String = match input("Describe your art:")
            .placeholder("a beautiful sunset over mountains")
            .interact()
        {
            Ok(line) => line,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => break,
            Err(e) => return Err(e.into()),
        };

        match parse_line(&line) {
            Command::Quit => break,
            Command::Skip => continue,
            Command::Generate { size, prompt } => {
                run_request(generator, &build_request(size, &prompt, style))?;
            }
        }
    }

    outro("Happy creating!")?;
    Ok(())
}

fn one_shot<P: TextToImage>(
    generator: &ArtGenerator<P>,
    prompts: &[String],
    style: Style,
) -> anyhow::Result<()> {
    let mut attempted = 0;
    let mut failed = 0;
    for prompt in prompts {
        let request = match parse_line(prompt) {
            Command::Generate { size, prompt } => build_request(size, &prompt, style),
            Command::Quit | Command::Skip => {
                log::warning(format!("Skipping prompt {prompt:?}"))?;
                continue;
            }
        };
        attempted += 1;
        if !run_request(generator, &request)? {
            failed += 1;
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {attempted} prompts failed");
    }
    outro("Done!")?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(filter).init();

    intro("diffusion_art")?;

    let config = args.resolve_config()?;
    let source = match &config.dduf_file {
        Some(file) => file.display().to_string(),
        None => config.model_id.clone(),
    };
    log::info(format!("Loading {source}"))?;

    let pipeline = match load_pipeline(&config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            log::error(format!("Could not load model: {e}"))?;
            return Err(e.into());
        }
    };
    log::success("Model loaded")?;

    let generator = ArtGenerator::new(pipeline, config)?;

    if args.prompt.is_empty() {
        interactive(&generator, args.style)
    } else {
        one_shot(&generator, &args.prompt, args.style)
    }
}
