// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;

use xmltl::app_config::{Config, LogLevel};
use xmltl::app_controller::Controller;
use xmltl::language_utils;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate shell completions for xmltl
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// xmltl - resumable batch translation of XML string tables
///
/// Translates the text attribute of every record in a string table through a
/// DeepLX-compatible service, writing the output incrementally so that an
/// interrupted run picks up where it stopped.
#[derive(Parser, Debug)]
#[command(name = "xmltl")]
#[command(version)]
#[command(about = "Resumable, placeholder-safe translation of XML string tables")]
#[command(long_about = "xmltl translates XML string tables batch by batch and can resume interrupted runs.

EXAMPLES:
    xmltl strings.xml                           # Translate using default config
    xmltl -s en -t fr strings.xml               # Translate from English to French
    xmltl -m 3000 strings.xml                   # Smaller batches
    xmltl -o out/strings_fr.xml strings.xml     # Explicit output path
    xmltl --restart strings.xml                 # Ignore any saved progress
    xmltl --log-level debug tables/             # Process an entire directory
    xmltl completions bash > xmltl.bash         # Generate bash completions

CONFIGURATION:
    Configuration is stored in xmltl.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.

RESUMING:
    Progress is saved next to the output as <output>.prc after every batch.
    Press Ctrl-C to stop after the current batch; run the same command again
    to continue.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input XML file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Source language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'de', 'pt-BR')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Maximum characters per batch
    #[arg(short = 'm', long)]
    max_chars: Option<usize>,

    /// Output file (single input file only)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, default_value = "xmltl.json")]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Discard saved progress and translate from the beginning
    #[arg(long)]
    restart: bool,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger { level: LevelFilter::Trace }))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
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
                "\x1B[{}m{} {:<5} {}\x1B[0m",
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
    // The level is adjusted once the config is loaded
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    if let Some(Commands::Completions { shell }) = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "xmltl", &mut std::io::stdout());
        return Ok(());
    }

    let input_path = cli
        .input_path
        .clone()
        .ok_or_else(|| anyhow!("INPUT_PATH is required when no subcommand is specified"))?;

    if let Some(level) = cli.log_level {
        log::set_max_level(LogLevel::from(level).to_level_filter());
    }

    let config = load_config(&cli)?;
    log::set_max_level(config.log_level.to_level_filter());

    info!(
        "Translating {} -> {} ({} chars per batch)",
        language_utils::get_language_name(&config.source_language).unwrap_or_else(|_| config.source_language.clone()),
        language_utils::get_language_name(&config.target_language).unwrap_or_else(|_| config.target_language.clone()),
        config.batch.char_limit
    );

    let controller = Controller::with_config(config)?;
    let summary = controller.run(input_path, cli.output, cli.restart).await?;

    if !summary.failed.is_empty() {
        return Err(anyhow!("{} file(s) failed to translate", summary.failed.len()));
    }
    Ok(())
}

/// Load the config file and apply command line overrides
fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    let mut config = Config::load_or_create(&cli.config_path)?;

    if let Some(source_language) = &cli.source_language {
        config.source_language = source_language.clone();
    }
    if let Some(target_language) = &cli.target_language {
        config.target_language = target_language.clone();
    }
    if let Some(max_chars) = cli.max_chars {
        config.batch.char_limit = max_chars;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level.into();
    }

    config.validate()?;
    Ok(config)
}
