mod render;

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use motoscan_core::inspection::domain::inspection_aggregator::InspectionAggregator;
use motoscan_core::inspection::domain::inspection_provider::InspectionProvider;
use motoscan_core::inspection::infrastructure::gemini_provider::GeminiProvider;
use motoscan_core::inspection::infrastructure::mock_provider::MockProvider;
use motoscan_core::pipeline::analysis_executor::AnalysisExecutor;
use motoscan_core::pipeline::analyze_media_use_case::{is_image_path, AnalyzeMediaUseCase};
use motoscan_core::pipeline::infrastructure::sequential_analysis_executor::SequentialAnalysisExecutor;
use motoscan_core::pipeline::infrastructure::threaded_analysis_executor::ThreadedAnalysisExecutor;
use motoscan_core::pipeline::pipeline_logger::{PipelineLogger, StdoutPipelineLogger};
use motoscan_core::sampling::domain::frame_sampler::FrameSampler;
use motoscan_core::session::file_store::FileStore;
use motoscan_core::session::inspection_session::{Credentials, InspectionSession};
use motoscan_core::shared::config::InspectorConfig;
use motoscan_core::video::infrastructure::ffmpeg_reader::FfmpegReader;

/// Motorcycle condition analysis from walk-around videos and photos.
#[derive(Parser)]
#[command(name = "motoscan", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze one video (or image) and print the combined report.
    Analyze(AnalyzeArgs),
    /// Log in, inspect each file as an upload, print each report, log out.
    Inspect(InspectArgs),
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Input video or image file.
    video: PathBuf,

    /// Frames per composite (overrides config).
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Cell size of a composite grid in pixels (overrides config).
    #[arg(long)]
    tile_size: Option<u32>,

    #[command(flatten)]
    provider: ProviderArgs,

    /// Provider calls in flight at once (1 = sequential).
    #[arg(long)]
    max_in_flight: Option<usize>,

    /// Save every composite as a PNG in this directory.
    #[arg(long)]
    composites_dir: Option<PathBuf>,

    /// Print the outcome as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct InspectArgs {
    /// Images or videos to upload (jpg, jpeg, png, mp4, avi, mov).
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Login name (defaults to the configured one).
    #[arg(long)]
    username: Option<String>,

    /// Login password (defaults to the configured one).
    #[arg(long)]
    password: Option<String>,

    #[command(flatten)]
    provider: ProviderArgs,

    /// Print the reports as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ProviderArgs {
    /// Vision model backend.
    #[arg(long, value_enum, default_value_t = ProviderKind::Gemini)]
    provider: ProviderKind,

    /// Model name (overrides config).
    #[arg(long)]
    model: Option<String>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ProviderKind {
    Gemini,
    Mock,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = InspectorConfig::load()?;

    match cli.command {
        Command::Analyze(args) => run_analyze(args, config),
        Command::Inspect(args) => run_inspect(args, config),
    }
}

fn run_analyze(
    args: AnalyzeArgs,
    mut config: InspectorConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(n) = args.chunk_size {
        config.chunk_size = n;
    }
    if let Some(px) = args.tile_size {
        config.tile_size = px;
    }
    if let Some(n) = args.max_in_flight {
        config.max_in_flight = n;
    }
    if let Some(model) = &args.provider.model {
        config.model = model.clone();
    }
    config.validate()?;
    validate_input(&args.video)?;

    let use_case = build_use_case(&config, args.provider.provider, args.composites_dir)?;
    let mut logger = StdoutPipelineLogger::default();

    let outcome = if is_image_path(&args.video) {
        use_case.analyze_image(&args.video, &mut logger)?
    } else {
        let mut reader = FfmpegReader::new();
        use_case.analyze_video(&mut reader, &args.video, &mut logger)?
    };
    logger.summary();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print!("{}", render::outcome(&outcome));
    }
    Ok(())
}

fn run_inspect(
    args: InspectArgs,
    mut config: InspectorConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(model) = &args.provider.model {
        config.model = model.clone();
    }
    config.validate()?;
    for file in &args.files {
        validate_input(file)?;
    }

    let credentials = match (config.username.clone(), config.password.clone()) {
        (Some(username), Some(password)) => Credentials { username, password },
        _ => {
            return Err(
                "No login configured; set MOTOSCAN_USERNAME and MOTOSCAN_PASSWORD or add them to the config file"
                    .into(),
            )
        }
    };
    let username = args
        .username
        .unwrap_or_else(|| credentials.username.clone());
    let password = args
        .password
        .unwrap_or_else(|| credentials.password.clone());

    let use_case = build_use_case(&config, args.provider.provider, None)?;
    let store = FileStore::new()?;
    let mut session = InspectionSession::new(credentials);
    session.login(&username, &password)?;

    for file in &args.files {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| format!("Not a file: {}", file.display()))?;
        let bytes = std::fs::read(file)?;
        match session.upload(&name, &bytes, &store, &use_case) {
            Ok(Some(_)) => {}
            Ok(None) => log::info!("Skipped duplicate upload {name}"),
            Err(e) => log::error!("{e}"),
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(session.reports())?);
    } else {
        for report in session.reports() {
            print!("{}", render::session_report(report));
        }
    }

    session.logout();
    Ok(())
}

fn build_use_case(
    config: &InspectorConfig,
    kind: ProviderKind,
    composites_dir: Option<PathBuf>,
) -> Result<AnalyzeMediaUseCase, Box<dyn std::error::Error>> {
    let provider: Arc<dyn InspectionProvider> = match kind {
        ProviderKind::Gemini => Arc::new(GeminiProvider::new(
            config.api_key.clone(),
            &config.model,
            &config.api_base,
            Duration::from_secs(config.request_timeout_secs),
        )?),
        ProviderKind::Mock => Arc::new(MockProvider::new()),
    };
    let executor: Box<dyn AnalysisExecutor> = if config.max_in_flight > 1 {
        Box::new(ThreadedAnalysisExecutor::new(config.max_in_flight))
    } else {
        Box::new(SequentialAnalysisExecutor)
    };
    log::info!(
        "Using provider {} (model {}, {} in flight)",
        provider.name(),
        config.model,
        config.max_in_flight
    );

    let sampler = FrameSampler::new(config.chunk_size, config.tile_size)?;
    let aggregator = InspectionAggregator::new(provider, executor, None);
    Ok(AnalyzeMediaUseCase::new(sampler, aggregator, composites_dir)?)
}

fn validate_input(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("Input file not found: {}", path.display()).into());
    }
    Ok(())
}
