// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{error, info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;

use dualsub::app_config::{self, Config};
use dualsub::app_controller::{Controller, SessionRequest, StyleEdit};
use dualsub::encoder::EncoderPreference;
use dualsub::session::{Session, TrackSlot};
use dualsub::timecode::{format_position, parse_position};

/// CLI Wrapper for EncoderPreference to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliEncoder {
    Auto,
    Software,
    Nvenc,
    Amf,
    Qsv,
}

impl From<CliEncoder> for EncoderPreference {
    fn from(cli_encoder: CliEncoder) -> Self {
        match cli_encoder {
            CliEncoder::Auto => EncoderPreference::Auto,
            CliEncoder::Software => EncoderPreference::Software,
            CliEncoder::Nvenc => EncoderPreference::Nvenc,
            CliEncoder::Amf => EncoderPreference::Amf,
            CliEncoder::Qsv => EncoderPreference::Qsv,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Burn both subtitle tracks into a new video
    #[command(alias = "export")]
    Burn {
        #[command(flatten)]
        session: SessionArgs,

        #[command(flatten)]
        export: ExportArgs,
    },

    /// Export a short preview clip starting at --at
    Clip {
        #[command(flatten)]
        session: SessionArgs,

        #[command(flatten)]
        export: ExportArgs,

        /// Clip length in seconds (default from config)
        #[arg(short, long)]
        duration: Option<u64>,
    },

    /// Play the video with both tracks overlaid
    #[command(alias = "preview")]
    Play {
        #[command(flatten)]
        session: SessionArgs,
    },

    /// Print the subtitle text and placement at --at
    Show {
        #[command(flatten)]
        session: SessionArgs,

        /// Frame width used for placement
        #[arg(long, default_value_t = 1920)]
        width: u32,

        /// Frame height used for placement
        #[arg(long, default_value_t = 1080)]
        height: u32,
    },

    /// List the available position presets
    Presets,

    /// Show which video encoder exports would use
    Encoders,

    /// Generate shell completions for dualsub
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Files, preset and style edits shared by every session command
#[derive(Args, Debug)]
struct SessionArgs {
    /// Video file
    #[arg(value_name = "VIDEO")]
    video: PathBuf,

    /// Subtitle 1 (SRT or WebVTT)
    #[arg(short = '1', long = "sub1", value_name = "FILE")]
    subtitle1: Option<PathBuf>,

    /// Subtitle 2 (SRT or WebVTT)
    #[arg(short = '2', long = "sub2", value_name = "FILE")]
    subtitle2: Option<PathBuf>,

    /// Fill missing tracks with subtitle files named after the video (zh → 1, en → 2)
    #[arg(short, long)]
    auto_subs: bool,

    /// Position preset (none, chinese, english or a configured one)
    #[arg(short, long)]
    preset: Option<String>,

    /// Style edit for subtitle 1, e.g. size=14 or color=#ffff00 (repeatable)
    #[arg(long = "style1", value_name = "KEY=VALUE")]
    style1: Vec<String>,

    /// Style edit for subtitle 2 (repeatable)
    #[arg(long = "style2", value_name = "KEY=VALUE")]
    style2: Vec<String>,

    /// Start position: SS, MM:SS or HH:MM:SS.mmm
    #[arg(long, value_name = "POSITION")]
    at: Option<String>,
}

/// Output options for burn and clip
#[derive(Args, Debug)]
struct ExportArgs {
    /// Output file (default: next to the video)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Video encoder
    #[arg(short, long, value_enum)]
    encoder: Option<CliEncoder>,

    /// libx264 quality, lower is better (0-51)
    #[arg(long)]
    crf: Option<u8>,
}

/// dualsub - bilingual subtitle preview and burn-in
///
/// Previews two independent subtitle tracks over a video and burns both into a
/// new video with ffmpeg.
#[derive(Parser, Debug)]
#[command(name = "dualsub")]
#[command(version)]
#[command(about = "Preview and burn two subtitle tracks into a video")]
#[command(long_about = "dualsub overlays two independent subtitle tracks on a video, previews them with ffplay and burns them in with ffmpeg.

EXAMPLES:
    dualsub burn movie.mkv --sub1 movie.zh.srt --sub2 movie.en.srt
    dualsub burn movie.mkv -a -f                      # Use movie.*.srt, overwrite output
    dualsub burn movie.mkv --sub2 en.srt -p chinese   # Video already has Chinese subtitles
    dualsub clip movie.mkv -a --at 12:30              # 10 second preview clip from 12:30
    dualsub play movie.mkv -a --at 1:02:00 --style2 size=20
    dualsub show movie.mkv -a --at 00:05:01.500       # Text on screen at that moment
    dualsub completions bash > dualsub.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.

REQUIREMENTS:
    ffmpeg, ffprobe and ffplay must be installed; fc-list is used to check fonts.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color and marker for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("1;31", "❌ "),
            Level::Warn => ("1;33", "🚧 "),
            Level::Info => ("1;32", ""),
            Level::Debug => ("1;36", "🔍 "),
            Level::Trace => ("1;35", "📋 "),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (color, marker) = Self::style_for_level(record.level());
            let _ = writeln!(
                std::io::stderr(),
                "\x1B[{}m{} {}{}\x1B[0m",
                color, now, marker, record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() {
    // Max level is lowered or raised once the config is known
    if let Err(e) = CustomLogger::init(LevelFilter::Trace) {
        eprintln!("Failed to initialize logger: {}", e);
    }
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();
    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: CommandLineOptions) -> Result<()> {
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "dualsub", &mut std::io::stdout());
        return Ok(());
    }

    if let Some(level) = &cli.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = Config::load_or_create(&cli.config_path)?;
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone().into();
    } else {
        log::set_max_level(config.log_level.to_level_filter());
    }

    match cli.command {
        Commands::Burn { session, export } => {
            apply_export_overrides(&mut config, &export);
            let controller = build_controller(config)?;
            let session = open_session(&controller, &session).await?;
            let outcome = controller
                .export(&session, export.output.as_deref(), export.force_overwrite)
                .await?;
            info!("Success: {:?}", outcome.output);
        }
        Commands::Clip { session, export, duration } => {
            apply_export_overrides(&mut config, &export);
            if let Some(duration) = duration {
                config.export.preview_duration_secs = duration;
            }
            let controller = build_controller(config)?;
            let session = open_session(&controller, &session).await?;
            let outcome = controller
                .export_clip(&session, export.output.as_deref(), export.force_overwrite)
                .await?;
            info!("Success: {:?}", outcome.output);
        }
        Commands::Play { session } => {
            let controller = build_controller(config)?;
            let session = open_session(&controller, &session).await?;
            controller.preview(&session).await?;
        }
        Commands::Show { session, width, height } => {
            let controller = build_controller(config)?;
            let session = open_session(&controller, &session).await?;
            print_overlay(&controller, &session, width, height);
        }
        Commands::Presets => {
            config.validate().context("Configuration validation failed")?;
            for preset in config.registry().list() {
                let marker = if preset.name.eq_ignore_ascii_case(&config.default_preset) { "*" } else { " " };
                println!("{} {:<12} {}", marker, preset.name, preset.description);
            }
        }
        Commands::Encoders => {
            let controller = build_controller(config)?;
            let encoder = controller.detect_encoder().await;
            println!("Preference: {:?}", controller.config().export.encoder);
            println!("Encoder:    {}", encoder);
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}

fn apply_export_overrides(config: &mut Config, export: &ExportArgs) {
    if let Some(encoder) = &export.encoder {
        config.export.encoder = encoder.clone().into();
    }
    if let Some(crf) = export.crf {
        config.export.crf = crf;
    }
}

fn build_controller(config: Config) -> Result<Controller> {
    config.validate().context("Configuration validation failed")?;
    Controller::with_config(config)
}

/// Turn the session arguments into a loaded session
async fn open_session(controller: &Controller, args: &SessionArgs) -> Result<Session> {
    let mut style_edits = Vec::new();
    for edit in &args.style1 {
        style_edits.push(StyleEdit::parse(TrackSlot::First, edit)?);
    }
    for edit in &args.style2 {
        style_edits.push(StyleEdit::parse(TrackSlot::Second, edit)?);
    }

    let position_ms = match &args.at {
        Some(at) => parse_position(at)?,
        None => 0,
    };

    let mut request = SessionRequest {
        video: args.video.clone(),
        subtitle1: args.subtitle1.clone(),
        subtitle2: args.subtitle2.clone(),
        preset: args.preset.clone(),
        style_edits,
        position_ms,
    };

    if args.auto_subs {
        for path in controller.fill_sibling_subtitles(&mut request)? {
            warn!("Unrecognised subtitle language, not used: {:?}", path);
        }
    }

    let session = controller.prepare_session(&request).await?;
    if let Some(duration) = session.video_duration_ms() {
        if position_ms > duration {
            warn!("--at {} is past the end of the video ({})", format_position(position_ms), format_position(duration));
        }
    }
    Ok(session)
}

fn print_overlay(controller: &Controller, session: &Session, width: u32, height: u32) {
    println!(
        "Position: {} (preset: {})",
        format_position(session.position_ms()),
        session.preset_name()
    );
    for line in controller.overlay_report(session, width, height) {
        match line.layout {
            Some(layout) => {
                println!(
                    "{} at ({:.0}, {:.0}) {:.0}x{:.0}:",
                    line.slot, layout.x, layout.y, layout.width, layout.height
                );
                for text_line in line.text.lines() {
                    println!("    {}", text_line);
                }
            }
            None => println!("{}: (nothing on screen)", line.slot),
        }
    }
}
