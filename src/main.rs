// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, info};
use std::io::Write;
use std::path::PathBuf;

use deckcast::app_config::{self, Config};
use deckcast::app_controller::Controller;

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
    /// Start the HTTP server (default command)
    Serve {
        /// Address to listen on, overrides the config
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on, overrides the config
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Create one presentation video from the command line
    Run {
        /// Document to explain (.txt or .pdf)
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,

        /// Question the narration should answer
        #[arg(short, long, default_value = "")]
        question: String,

        /// Keep the run workspace (script, audio, markup, slide images)
        #[arg(short, long)]
        keep_artifacts: bool,
    },

    /// Generate shell completions for deckcast
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// deckcast - narrated slide-deck videos from documents
///
/// Explains a document in answer to a question: a language model writes a
/// teaching-assistant script and a Reveal.js deck, the script is voiced, the
/// slides are rendered and everything is muxed into an MP4.
#[derive(Parser, Debug)]
#[command(name = "deckcast")]
#[command(version)]
#[command(about = "Narrated slide-deck videos from documents")]
#[command(long_about = "deckcast turns a document and a question into a narrated slide-deck video.

EXAMPLES:
    deckcast                                      # Serve the HTTP API from conf.json
    deckcast serve --port 9000                    # Serve on another port
    deckcast run notes.pdf -q \"What is entropy?\"  # One run from the command line
    deckcast run -q \"Explain recursion\"           # Question only, no document
    deckcast completions bash > deckcast.bash     # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically. API keys are read from the environment
    variables named by llm.api_key_env and speech.api_key_env.

EXTERNAL TOOLS:
    pdftotext, ffmpeg, ffprobe and a Chromium compatible browser must be installed.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "conf.json")]
    config: String,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
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
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Info until the config is loaded
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    if let Some(Commands::Completions { shell }) = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "deckcast", &mut std::io::stdout());
        return Ok(());
    }

    if let Some(level) = &cli.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = Config::load_or_create(&cli.config)?;

    if let Some(level) = &cli.log_level {
        config.log_level = level.clone().into();
    }

    match cli.command {
        Some(Commands::Run {
            input,
            question,
            keep_artifacts,
        }) => {
            if keep_artifacts {
                config.storage.keep_artifacts = true;
            }
            let controller = prepare(config)?;
            let run = controller.run_file(input.as_deref(), &question).await?;

            println!("{}", run.message());
            match run.video_path() {
                Some(path) => {
                    println!("{}", path.display());
                    Ok(())
                }
                None => {
                    error!("No video was produced");
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::Serve { host, port }) => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            prepare(config)?.serve().await
        }
        None => prepare(config)?.serve().await,
        Some(Commands::Completions { .. }) => Ok(()),
    }
}

/// Validate the final configuration, apply its log level and build the controller
fn prepare(config: Config) -> Result<Controller> {
    config
        .validate()
        .context("Configuration validation failed")?;

    log::set_max_level(config.log_level.to_level_filter());
    info!(
        "Workspaces in {:?}, videos in {:?}",
        config.storage.work_dir, config.storage.output_dir
    );

    Controller::with_config(config)
}
