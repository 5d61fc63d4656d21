use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;
use voxpace_core::AppConfig;
use voxpace_pacer::{DelaySchedule, Pacer, PacingMode};

#[derive(Parser)]
#[command(
    name = "voxpace",
    about = "Stream a recorded audio file to a transcription endpoint at real-time pace"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Audio file to stream (overrides audio.path)
    audio: Option<PathBuf>,

    /// Bytes per chunk (overrides audio.chunk_size)
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Comma-separated per-chunk delays in milliseconds (overrides pacing.delay_schedule_ms)
    #[arg(long, value_name = "MS,MS,...")]
    delay_schedule: Option<String>,
}

fn load_config(cli: &Cli) -> Result<(AppConfig, bool)> {
    let found = cli.config.exists();
    let mut config = if found {
        AppConfig::load_from_file(&cli.config)
            .with_context(|| format!("failed to load config from {:?}", cli.config))?
    } else {
        AppConfig::from_toml_str("").context("failed to build default config")?
    };

    if let Some(ref audio) = cli.audio {
        config.audio.path = audio.clone();
    }
    if let Some(chunk_size) = cli.chunk_size {
        config.audio.chunk_size = chunk_size;
    }
    if let Some(ref schedule) = cli.delay_schedule {
        let parsed = DelaySchedule::parse(schedule).context("invalid --delay-schedule")?;
        config.pacing.delay_schedule_ms = Some(parsed.to_millis());
    }

    config.validate().context("invalid configuration")?;
    Ok((config, found))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, config_found) = load_config(&cli)?;

    let env_filter = EnvFilter::try_new(&config.general.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::Registry::default().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(false),
    );
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    tracing::info!("voxpace starting");
    if !config_found {
        tracing::warn!("config file {:?} not found, using defaults", cli.config);
    }

    let mode = match config.pacing.delay_schedule_ms {
        Some(ref delays) => {
            tracing::info!(entries = delays.len(), "pacing with explicit delay schedule");
            PacingMode::Schedule(DelaySchedule::new(delays.clone()))
        }
        None => {
            let format = config.audio_format();
            tracing::info!(
                bytes_per_second = format.bytes_per_second(),
                "pacing at real-time audio rate"
            );
            PacingMode::Realtime(format)
        }
    };

    let params = config.stream_params();
    tracing::info!(
        language_code = %params.language_code,
        sample_rate_hz = params.sample_rate_hz,
        bytes_per_sample = params.bytes_per_sample,
        media_encoding = %params.media_encoding,
        channels = params.channels,
        enable_channel_identification = params.enable_channel_identification,
        "stream parameters"
    );

    let client_name = &config.session.client;
    let mut client = voxpace_session::ClientRegistry::new()
        .create(client_name)
        .with_context(|| format!("unknown streaming client '{client_name}'"))?;
    client
        .initialize(config.client_config(client_name))
        .await
        .with_context(|| format!("failed to initialize streaming client '{client_name}'"))?;

    let handlers = voxpace_handler::HandlerRegistry::new()
        .build_all(&config.effective_handlers())
        .await
        .context("failed to set up result handlers")?;

    let source = voxpace_audio::FileChunkSource::open(&config.audio.path, config.audio.chunk_size)
        .await
        .with_context(|| format!("failed to open audio file {:?}", config.audio.path))?;

    let session = client
        .start_stream(&params)
        .await
        .context("failed to start streaming session")?;

    let mut runner = voxpace_runner::SessionRunner::new(
        Pacer::new(mode),
        voxpace_handler::EventDrainer::new(handlers),
    );
    if let Some(deadline) = config.session_deadline() {
        runner = runner.with_deadline(deadline);
    }

    let summary = runner
        .run(Box::new(source), session)
        .await
        .context("streaming session failed")?;

    tracing::info!(
        chunks = summary.pacing.chunks_sent(),
        bytes = summary.pacing.bytes_sent(),
        audio_secs = summary.pacing.elapsed_audio_secs(),
        results = summary.drain.results,
        wall_secs = summary.wall_time.as_secs_f64(),
        "shutting down"
    );

    Ok(())
}
