use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};

use bratgen::{AppState, FfmpegEncoder, FrameTiming, Mode, Orchestrator, Request, ServiceConfig};

#[derive(Parser, Debug)]
#[command(name = "bratgen", version, about = "Brat-style text images and typing videos")]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true, env = "BRATGEN_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve `GET /?text=...&video=...` over HTTP.
    Serve(ServeArgs),
    /// Render one still PNG.
    Image(OneShotArgs),
    /// Render one typing MP4 (requires `ffmpeg`).
    Video(OneShotArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Listen address.
    #[arg(long, env = "BRATGEN_HOST", default_value = "0.0.0.0")]
    host: std::net::IpAddr,

    /// Listen port.
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Args, Debug)]
struct OneShotArgs {
    /// Text to render.
    #[arg(long)]
    text: String,

    /// Where to copy the result.
    #[arg(long)]
    out: PathBuf,

    /// Print the resolved font and the SHA-256 of its bytes.
    #[arg(long)]
    dump_font: bool,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Directory for generated files.
    #[arg(long, env = "BRATGEN_SCRATCH_DIR", default_value = "temp")]
    scratch_dir: PathBuf,

    /// Maximum cached still images.
    #[arg(
        long,
        env = "BRATGEN_IMAGE_CACHE",
        default_value_t = bratgen::DEFAULT_IMAGE_CACHE_CAPACITY
    )]
    image_cache: usize,

    /// Maximum cached videos.
    #[arg(
        long,
        env = "BRATGEN_VIDEO_CACHE",
        default_value_t = bratgen::DEFAULT_VIDEO_CACHE_CAPACITY
    )]
    video_cache: usize,

    /// Seconds a cached artifact stays valid (0 keeps it until evicted).
    #[arg(long, env = "BRATGEN_CACHE_TTL_SECS", default_value_t = 3600)]
    cache_ttl_secs: u64,

    /// Words rendered into a video; the rest are dropped.
    #[arg(long, env = "BRATGEN_MAX_WORDS", default_value_t = 40)]
    max_words: usize,

    /// Deadline for one render (0 disables).
    #[arg(long, env = "BRATGEN_RENDER_TIMEOUT_SECS", default_value_t = 30)]
    render_timeout_secs: u64,

    /// Deadline for one ffmpeg run (0 disables).
    #[arg(long, env = "BRATGEN_ENCODE_TIMEOUT_SECS", default_value_t = 120)]
    encode_timeout_secs: u64,

    /// Font file; defaults to a sans-serif face from the system font database.
    #[arg(long, env = "BRATGEN_FONT")]
    font: Option<PathBuf>,

    /// ffmpeg executable.
    #[arg(long, env = "BRATGEN_FFMPEG", default_value = "ffmpeg")]
    ffmpeg: PathBuf,
}

impl ConfigArgs {
    fn into_config(self) -> ServiceConfig {
        let secs = |s: u64| (s > 0).then(|| Duration::from_secs(s));
        ServiceConfig {
            scratch_dir: self.scratch_dir,
            image_cache_capacity: self.image_cache,
            video_cache_capacity: self.video_cache,
            cache_ttl: secs(self.cache_ttl_secs),
            frames: FrameTiming {
                max_words: self.max_words,
                ..FrameTiming::default()
            },
            render_timeout: secs(self.render_timeout_secs),
            encode_timeout: secs(self.encode_timeout_secs),
            font_path: self.font,
            ffmpeg_program: self.ffmpeg,
            ..ServiceConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    bratgen::telemetry::init_tracing(cli.log_json)?;
    match cli.cmd {
        Command::Serve(args) => cmd_serve(args).await,
        Command::Image(args) => cmd_one_shot(Mode::Image, args).await,
        Command::Video(args) => cmd_one_shot(Mode::Video, args).await,
    }
}

async fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = args.config.into_config();
    warn_if_ffmpeg_missing(&config.ffmpeg_program);
    let orchestrator = Orchestrator::with_defaults(&config)?;
    let app = bratgen::create_router(AppState::new(orchestrator));

    let addr = SocketAddr::new(args.host, args.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    tracing::info!(%addr, scratch = %config.scratch_dir.display(), "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve")?;
    tracing::info!("shut down");
    Ok(())
}

async fn cmd_one_shot(mode: Mode, args: OneShotArgs) -> anyhow::Result<()> {
    let config = args.config.into_config();
    if mode == Mode::Video {
        warn_if_ffmpeg_missing(&config.ffmpeg_program);
    }
    let orchestrator = Orchestrator::with_defaults(&config)?;
    if args.dump_font
        && let Some(handle) = orchestrator.text_engine()
    {
        let engine = handle.get().await?;
        eprintln!("font: {}", engine.source());
        eprintln!("font sha256: {}", engine.font_sha256());
    }
    let artifact = orchestrator.generate(&Request::new(args.text, mode)?).await?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    tokio::fs::copy(&artifact.path, &args.out)
        .await
        .with_context(|| format!("write '{}'", args.out.display()))?;
    // The cache dies with the process, so its file would only linger.
    if let Err(e) = tokio::fs::remove_file(&artifact.path).await {
        tracing::debug!(error = %e, "scratch artifact not removed");
    }

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn warn_if_ffmpeg_missing(program: &Path) {
    if !FfmpegEncoder::new(program).is_runnable() {
        tracing::warn!(
            program = %program.display(),
            "ffmpeg not runnable; video requests will fail"
        );
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
