// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use subgloss::app_config::{self, Config, TranslationProvider};
use subgloss::app_controller::{ConsoleProgress, Controller};
use subgloss::file_utils::FileManager;
use subgloss::translation::Glossary;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Gemini,
    #[value(name = "openai")]
    OpenAI,
    Anthropic,
    Ollama,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Gemini => TranslationProvider::Gemini,
            CliTranslationProvider::OpenAI => TranslationProvider::OpenAI,
            CliTranslationProvider::Anthropic => TranslationProvider::Anthropic,
            CliTranslationProvider::Ollama => TranslationProvider::Ollama,
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

/// Options shared by every command that talks to a provider
#[derive(Args, Debug)]
struct SessionArgs {
    /// Input SRT file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Program introduction: names, roles, setting
    #[arg(long, conflicts_with = "context_file", required_unless_present = "context_file")]
    context: Option<String>,

    /// Read the program introduction from a file
    #[arg(long, value_name = "PATH")]
    context_file: Option<PathBuf>,

    /// Glossary file (`original:translated, ...`) used as the starting glossary
    #[arg(short, long, value_name = "PATH")]
    glossary: Option<PathBuf>,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Source language code (e.g., 'ko')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'zh')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze terms, optionally review them, then translate the whole file
    Translate {
        #[command(flatten)]
        session: SessionArgs,

        /// Stop after analysis so the glossary file can be edited
        #[arg(short, long)]
        review: bool,

        /// Output file (default: <stem>.<target>.srt next to the input)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Overwrite the output file if it exists
        #[arg(short, long)]
        force_overwrite: bool,
    },

    /// Only run term analysis and print the suggested glossary
    Analyze {
        #[command(flatten)]
        session: SessionArgs,
    },

    /// Generate shell completions for subgloss
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// subgloss - glossary-consistent subtitle translation with LLMs
///
/// Extracts a terminology glossary from a subtitle file, lets you review it,
/// then translates every line in parallel chunks with that glossary enforced.
#[derive(Parser, Debug)]
#[command(name = "subgloss")]
#[command(version)]
#[command(about = "Glossary-consistent subtitle translation with LLMs")]
#[command(long_about = "subgloss translates SRT subtitles line by line through an LLM while keeping
character names and proper nouns consistent across the whole episode.

EXAMPLES:
    subgloss translate ep01.srt --context \"Running Man, cast: ...\"
    subgloss translate ep01.srt --context-file intro.txt --glossary terms.txt --review
    subgloss analyze ep01.srt --context-file intro.txt --glossary terms.txt
    subgloss completions bash > subgloss.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. If the file doesn't exist,
    a default one is created. API keys are read from the config file or from
    GEMINI_API_KEY, OPENAI_API_KEY or ANTHROPIC_API_KEY.

SUPPORTED PROVIDERS:
    gemini    - Google Gemini API (default: gemini-2.5-flash)
    openai    - OpenAI API (requires API key)
    anthropic - Anthropic Claude API (requires API key)
    ollama    - Local Ollama server (default: llama3.2:3b)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
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
        log::set_boxed_logger(Box::new(CustomLogger::new(level)))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji and ANSI colour for log level
    fn decoration(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌", "1;31"),
            Level::Warn => ("🚧", "1;33"),
            Level::Info => ("", "1;32"),
            Level::Debug => ("🔍", "1;36"),
            Level::Trace => ("📋", "1;35"),
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
            let (emoji, colour) = Self::decoration(record.level());
            let _ = writeln!(
                std::io::stderr(),
                "\x1B[{}m{} {} {}\x1B[0m",
                colour,
                now,
                emoji,
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
    // Registered at the most verbose level; the effective level is set once the config is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "subgloss", &mut std::io::stdout());
            Ok(())
        }
        Commands::Analyze { session } => run_analyze(session).await,
        Commands::Translate {
            session,
            review,
            output,
            force_overwrite,
        } => run_translate(session, review, output, force_overwrite).await,
    }
}

// @loads: Config file plus CLI overrides, then applies the log level
fn load_config(args: &SessionArgs) -> Result<Config> {
    let mut config = Config::load_or_create(&args.config_path)?;

    if let Some(provider) = &args.provider {
        config.translation.provider = provider.clone().into();
    }
    if let Some(model) = &args.model {
        config.translation.active_provider_config_mut().model = model.clone();
    }
    if let Some(source_lang) = &args.source_language {
        config.source_language = source_lang.clone();
    }
    if let Some(target_lang) = &args.target_language {
        config.target_language = target_lang.clone();
    }
    if let Some(log_level) = &args.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;
    log::set_max_level(config.log_level.to_level_filter());
    Ok(config)
}

// @prepares: Controller with context submitted and subtitle uploaded
fn start_session(args: &SessionArgs, config: Config) -> Result<Controller> {
    let program_context = match (&args.context, &args.context_file) {
        (Some(context), _) => context.clone(),
        (None, Some(path)) => FileManager::read_to_string(path)?,
        (None, None) => return Err(anyhow!("Either --context or --context-file is required")),
    };

    if !FileManager::file_exists(&args.input) {
        return Err(anyhow!("Input file does not exist: {:?}", args.input));
    }
    if !FileManager::is_subtitle_file(&args.input) {
        warn!("{:?} does not have an .srt extension; parsing it as SRT anyway", args.input);
    }

    let mut controller = Controller::new(config, Arc::new(ConsoleProgress::new()));

    if let Some(path) = &args.glossary {
        let glossary = FileManager::read_glossary(path)?;
        info!("Loaded {} glossary terms from {:?}", glossary.len(), path);
        controller.edit_glossary(glossary)?;
    }

    controller.submit_context(&program_context)?;
    let subtitles = FileManager::read_to_string(&args.input)?;
    controller.upload(&subtitles)?;
    Ok(controller)
}

async fn run_analyze(args: SessionArgs) -> Result<()> {
    let config = load_config(&args)?;
    let mut controller = start_session(&args, config)?;

    let glossary = controller.analyze().await?;
    if let Some(path) = &args.glossary {
        FileManager::write_glossary(path, &glossary)?;
        info!("Wrote {} glossary terms to {:?}", glossary.len(), path);
    }
    println!("{}", glossary);
    Ok(())
}

async fn run_translate(
    args: SessionArgs,
    review: bool,
    output: Option<PathBuf>,
    force_overwrite: bool,
) -> Result<()> {
    let config = load_config(&args)?;
    let output_path = output.unwrap_or_else(|| {
        FileManager::generate_output_path(&args.input, None, &config.target_language)
    });
    if output_path.exists() && !force_overwrite {
        return Err(anyhow!(
            "Output file already exists: {:?}. Use -f to force overwrite.",
            output_path
        ));
    }

    let mut controller = start_session(&args, config)?;
    let glossary = controller.analyze().await?;
    info!("Glossary has {} terms", glossary.len());

    if review {
        let glossary_path = args
            .glossary
            .clone()
            .unwrap_or_else(|| default_glossary_path(&args.input));
        let edited = review_glossary(&glossary_path, &glossary)?;
        controller.edit_glossary(edited)?;
    }

    let translated = controller.translate().await?;
    FileManager::write_to_file(&output_path, &translated)?;
    info!("Success: {:?}", output_path);
    Ok(())
}

// @generates: `<stem>.glossary.txt` next to the input
fn default_glossary_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    input.with_file_name(format!("{}.glossary.txt", stem))
}

// @interacts: Writes the glossary, waits for the operator, reads it back
fn review_glossary(path: &Path, glossary: &Glossary) -> Result<Glossary> {
    FileManager::write_glossary(path, glossary)?;
    eprintln!(
        "Glossary written to {:?}. Edit it, then press Enter to start translating.",
        path
    );
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    let edited = FileManager::read_glossary(path)?;
    info!("Using {} reviewed glossary terms", edited.len());
    Ok(edited)
}
