use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Arc;
use teloxide::prelude::*;

use riffbot::cli::{Cli, Commands};
use riffbot::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps, TelegramDelivery};
use riffcore::core::{config, init_logger, log_cookies_configuration, log_download_configuration};
use riffcore::download::temp::{artifact_prefix, cleanup_prefixed, file_size_mib};
use riffcore::download::{ensure_cookies_file, CookiesSetup, FetchRequest, FfmpegTranscoder, TranscoderKind, YtDlpFetcher};
use riffcore::jobs::JobTracker;
use riffcore::pipeline::{fetch_and_transcode, Pipeline};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Configuration statics read the environment on first use, so .env goes first
    let _ = dotenv();

    // Log panics instead of losing them in a spawned task
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
        if let Some(msg) = panic_info.payload().downcast_ref::<&str>() {
            log::error!("Panic message: {}", msg);
        }
    }));

    init_logger(&config::LOG_FILE_PATH, &config::LOG_LEVEL)?;

    match cli.command {
        None | Some(Commands::Run) => run_bot().await,
        Some(Commands::Check) => run_check(),
        Some(Commands::Fetch { url, output }) => run_fetch(url, output).await,
    }
}

/// Temp directory, cookies file and startup diagnostics
fn prepare_environment() -> Result<()> {
    fs_err::create_dir_all(config::TEMP_FILES_DIR.as_path()).context("Failed to create temp directory")?;

    match ensure_cookies_file(&config::COOKIES_PATH, config::YOUTUBE_COOKIES.as_ref()) {
        Ok(CookiesSetup::Written) => log::info!("Cookies materialized from YOUTUBE_COOKIES"),
        Ok(_) => {}
        Err(e) => log::error!("Failed to write cookies file: {:#}", e),
    }

    log_cookies_configuration();
    log_download_configuration();
    Ok(())
}

async fn run_bot() -> Result<()> {
    prepare_environment()?;

    let bot = create_bot()?;
    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    let pipeline = Arc::new(Pipeline::from_config(JobTracker::new()));
    let deps = HandlerDeps::new(pipeline, Arc::new(TelegramDelivery::new(bot.clone())));

    log::info!("Starting riffbot...");
    Dispatcher::builder(bot, schema(deps))
        .default_handler(|upd| async move {
            log::trace!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("An error has occurred in the dispatcher"))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("Dispatcher shutdown gracefully");
    Ok(())
}

/// First line of `{bin} {arg}`, if the binary could be started
fn tool_version(bin: &str, arg: &str) -> Result<String> {
    let output = Command::new(bin)
        .arg(arg)
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("cannot run {}", bin))?;
    if !output.status.success() {
        anyhow::bail!("{} {} exited with {}", bin, arg, output.status);
    }
    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .unwrap_or_default()
        .to_string())
}

fn run_check() -> Result<()> {
    println!("🔧 riffbot configuration");
    println!("========================");
    println!("yt-dlp:         {}", *config::YTDL_BIN);
    println!("ffmpeg:         {}", *config::FFMPEG_BIN);
    println!("Transcoder:     {}", *config::audio::TRANSCODER);
    println!("Bitrate:        {}", *config::audio::BITRATE);
    match *config::download::MAX_FILE_SIZE_MB {
        Some(limit) => println!("Size ceiling:   {:.0} MB", limit),
        None => println!("Size ceiling:   unlimited"),
    }
    println!("Fragments:      {}", *config::download::CONCURRENT_FRAGMENTS);
    println!("Tick:           {} ms", *config::progress::TICK_MS);
    println!(
        "Timeouts:       yt-dlp {}s, ffmpeg {}s",
        *config::download::YTDLP_TIMEOUT_SECS,
        *config::download::FFMPEG_TIMEOUT_SECS
    );
    println!("Temp directory: {}", config::TEMP_FILES_DIR.display());
    println!(
        "Cookies:        {} ({})",
        config::COOKIES_PATH.display(),
        if config::COOKIES_PATH.exists() { "present" } else { "missing" }
    );
    println!();

    let mut healthy = true;
    match tool_version(&config::YTDL_BIN, "--version") {
        Ok(version) => println!("✅ yt-dlp {}", version),
        Err(e) => {
            healthy = false;
            println!("❌ yt-dlp: {:#}", e);
        }
    }

    let ffmpeg = tool_version(&config::FFMPEG_BIN, "-version");
    match (&ffmpeg, *config::audio::TRANSCODER) {
        (Ok(version), _) => println!("✅ {}", version),
        (Err(e), TranscoderKind::Ffmpeg) => {
            healthy = false;
            println!("❌ ffmpeg: {:#}", e);
        }
        // yt-dlp still needs ffmpeg for extraction, but may find it on its own
        (Err(e), TranscoderKind::Ytdlp) => println!("⚠️ ffmpeg: {:#}", e),
    }

    if !healthy {
        anyhow::bail!("toolchain check failed");
    }
    Ok(())
}

/// Runs the fetch and transcode steps locally with a terminal progress line
async fn run_fetch(url: String, output: Option<PathBuf>) -> Result<()> {
    let url = riffcore::core::validate_media_url(&url)?;
    prepare_environment()?;

    let output_dir = match output {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    fs_err::create_dir_all(&output_dir)?;

    let temp_dir = config::TEMP_FILES_DIR.clone();
    let prefix = artifact_prefix(i64::from(std::process::id()));
    let separate_transcoder = *config::audio::TRANSCODER == TranscoderKind::Ffmpeg;
    let bitrate = config::audio::BITRATE.clone();
    let request = FetchRequest {
        url: url.to_string(),
        output_dir: temp_dir.clone(),
        artifact_prefix: prefix.clone(),
        mp3_bitrate: (!separate_transcoder).then(|| bitrate.clone()),
    };

    println!("🎬 riffbot fetch");
    println!("URL: {}", url);

    let result = tokio::task::spawn_blocking(move || {
        let fetcher = YtDlpFetcher::from_config();
        let transcoder = separate_transcoder.then(FfmpegTranscoder::from_config);
        fetch_and_transcode(
            &fetcher,
            transcoder.as_ref().map(|t| t as &dyn riffcore::download::Transcoder),
            &request,
            &bitrate,
            &mut |status: String| {
                let line = status.replace('\n', " ");
                eprint!("\r\x1b[2K{}", line);
                let _ = std::io::stderr().flush();
            },
        )
    })
    .await?;
    eprintln!();

    let outcome = result.map_err(anyhow::Error::from).and_then(|media| {
        let file_name = media
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}.mp3", media.title));
        let target = output_dir.join(file_name.strip_prefix(&prefix).unwrap_or(&file_name));
        fs_err::copy(&media.path, &target)?;
        Ok((media, target))
    });
    cleanup_prefixed(&temp_dir, &prefix);

    let (media, target) = outcome?;
    println!("✅ {}", media.title);
    println!("💾 {} ({:.2} MB)", target.display(), file_size_mib(&target)?);
    Ok(())
}
