// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use doctran::app_config::{self, Config};
use doctran::database::models::{NewTranslation, PageRequest};
use doctran::server::{self, AppState};
use doctran::{
    extract_paragraphs, BatchEvent, BatchOutcome, BatchRequest, DatabaseConnection, Repository,
    TranslationService, TranslationUnit,
};

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
    /// Run the HTTP and WebSocket server
    Serve {
        /// Interface to bind, overrides the config
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on, overrides the config
        #[arg(long)]
        port: Option<u16>,
    },

    /// Translate a document locally
    Translate(TranslateArgs),

    /// Manage the glossary
    #[command(subcommand)]
    Glossary(GlossaryCommand),

    /// Manage the translation history
    #[command(subcommand)]
    History(HistoryCommand),

    /// Generate shell completions for doctran
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// DOCX or plain-text document
    #[arg(value_name = "FILE")]
    input_path: PathBuf,

    /// Target language label or code
    #[arg(short, long)]
    target_lang: Option<String>,

    /// Source language label or code
    #[arg(short, long)]
    lang: Option<String>,

    /// Refine every paragraph with a second pass
    #[arg(short, long)]
    enhance: bool,

    /// Provider for the initial translation
    #[arg(short, long)]
    provider: Option<String>,

    /// Provider for the refinement pass
    #[arg(long)]
    optimized_provider: Option<String>,

    /// Mark the stored glossary terms in the source text
    #[arg(short, long)]
    glossary: bool,

    /// Write the results here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum GlossaryCommand {
    /// Show one page of the glossary
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 50)]
        per_page: u32,
    },
    /// Add a new term
    Add { term: String, translation: String },
    /// Replace the translation of a term
    Update { term: String, translation: String },
    /// Remove a term
    Delete { term: String },
}

#[derive(Subcommand, Debug)]
enum HistoryCommand {
    /// Show saved translations, newest first
    List,
    /// Save a translation
    Add {
        text: String,
        translation: String,
        #[arg(short, long)]
        target_lang: Option<String>,
    },
    /// Remove a saved translation
    Delete { id: i64 },
}

/// doctran - concurrent two-stage document translation
///
/// Translates documents paragraph by paragraph through OpenAI-compatible chat
/// models, optionally refining each paragraph with a second provider.
#[derive(Parser, Debug)]
#[command(name = "doctran")]
#[command(version)]
#[command(about = "Concurrent two-stage document translation")]
#[command(long_about = "doctran translates documents paragraph by paragraph with LLM providers.

EXAMPLES:
    doctran serve                                  # Run the server from conf.json
    doctran serve --port 9000                      # Run the server on another port
    doctran translate report.docx                  # Translate into the default language
    doctran translate -t English -e notes.txt      # Translate and refine into English
    doctran translate -g -o out.json report.docx   # Mark glossary terms, write JSON to a file
    doctran glossary add \"neural network\" 神经网络
    doctran history list
    doctran completions bash > doctran.bash        # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically. Provider credentials are read from
    DEEPSEEK_API_KEY and QWEN_API_KEY when set.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "conf.json")]
    config: PathBuf,

    /// Set logging level
    #[arg(long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger::new(level)))?;
        log::set_max_level(level);
        Ok(())
    }

    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "❌ "),
            Level::Warn => ("\x1B[1;33m", "🚧 "),
            Level::Info => ("\x1B[1;32m", " "),
            Level::Debug => ("\x1B[1;36m", "🔍 "),
            Level::Trace => ("\x1B[1;35m", "📋 "),
        }
    }
}

impl Log for CustomLogger {
    // The global max level is lowered and raised after init, so the
    // construction-time level only bounds what is ever printed.
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (color, emoji) = Self::style_for_level(record.level());
            let _ = writeln!(
                std::io::stderr(),
                "{}{} {} {}\x1B[0m",
                color,
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
    // Accept everything, then narrow with set_max_level once the config is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "doctran", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli.config, cli.log_level.clone())?;

    match cli.command {
        Commands::Serve { host, port } => run_serve(config, host, port).await,
        Commands::Translate(args) => run_translate(config, args).await,
        Commands::Glossary(command) => run_glossary(config, command).await,
        Commands::History(command) => run_history(config, command).await,
        Commands::Completions { .. } => Ok(()),
    }
}

/// Load the configuration and apply the effective log level
fn load_config(path: &Path, cli_log_level: Option<CliLogLevel>) -> Result<Config> {
    let mut config = Config::load_or_create(path)?;

    if let Some(level) = cli_log_level {
        config.log_level = level.into();
    }
    log::set_max_level(config.log_level.to_level_filter());

    config
        .validate()
        .context("Configuration validation failed")?;
    Ok(config)
}

fn open_repository(config: &Config) -> Result<Repository> {
    let path = config.resolved_database_path()?;
    let db = DatabaseConnection::new(&path)
        .with_context(|| format!("Failed to open database at {}", path.display()))?;
    Ok(Repository::new(db))
}

async fn run_serve(mut config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let repository = open_repository(&config)?;
    let service = TranslationService::new(&config);
    info!(
        "Providers: {}",
        service.gateway().provider_names().join(", ")
    );

    server::serve(&config.server, AppState::new(service, repository)).await
}

async fn run_translate(config: Config, args: TranslateArgs) -> Result<()> {
    let bytes = tokio::fs::read(&args.input_path)
        .await
        .with_context(|| format!("Failed to read {}", args.input_path.display()))?;
    let paragraphs = extract_paragraphs(&bytes)
        .with_context(|| format!("Failed to extract paragraphs from {}", args.input_path.display()))?;

    let primary = args
        .provider
        .unwrap_or_else(|| config.providers.default_provider.clone());
    let mut request = BatchRequest {
        optimized_provider: args.optimized_provider.unwrap_or_else(|| primary.clone()),
        primary_provider: primary,
        temperature: config.defaults.temperature,
        lang: args.lang,
        target_lang: args
            .target_lang
            .unwrap_or_else(|| config.defaults.target_language.clone()),
        enhance: args.enhance,
        ..BatchRequest::default()
    };
    if args.glossary {
        request.terms = open_repository(&config)?.glossary_snapshot().await?;
        info!("Marking {} glossary terms", request.terms.len());
    }

    let service = TranslationService::new(&config);
    let cancel = CancellationToken::new();
    let (sender, mut receiver) = mpsc::unbounded_channel::<BatchEvent>();

    let batch = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            let mut sender = sender;
            service.run_batch(paragraphs, &request, &mut sender, &cancel).await
        }
    });

    let progress_bar = ProgressBar::new(0);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} paragraphs ({percent}%) {eta}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    progress_bar.set_style(style.progress_chars("█▓▒░"));

    let mut results: Option<Vec<TranslationUnit>> = None;
    loop {
        tokio::select! {
            event = receiver.recv() => match event {
                Some(BatchEvent::Progress { current, total, result }) => {
                    progress_bar.set_length(total as u64);
                    progress_bar.set_position(current as u64);
                    if result.is_failed() {
                        progress_bar.println(format!("Paragraph {} failed", result.index));
                    }
                }
                Some(BatchEvent::Done { results: done, .. }) => results = Some(done),
                Some(BatchEvent::Error { message }) => warn!("{}", message),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted, cancelling the batch");
                cancel.cancel();
            }
        }
    }
    progress_bar.finish_and_clear();

    let outcome = batch.await.context("Batch task panicked")?;
    let results = match (outcome, results) {
        (BatchOutcome::Completed { .. }, Some(results)) => results,
        (outcome, _) => return Err(anyhow!("Batch did not complete: {:?}", outcome)),
    };

    let failed = results.iter().filter(|unit| unit.is_failed()).count();
    let json = serde_json::to_string_pretty(&results).context("Failed to serialize results")?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Success: {}", path.display());
        }
        None => println!("{}", json),
    }

    if failed > 0 {
        warn!("{} of {} paragraphs failed", failed, results.len());
    }
    Ok(())
}

async fn run_glossary(config: Config, command: GlossaryCommand) -> Result<()> {
    let repository = open_repository(&config)?;
    match command {
        GlossaryCommand::List { page, per_page } => {
            let page = repository
                .list_glossary(PageRequest { page, per_page })
                .await?;
            for term in &page.terms {
                println!("{}\t{}", term.term, term.translation);
            }
            info!(
                "Page {}/{} ({} terms)",
                page.page, page.total_pages, page.total
            );
        }
        GlossaryCommand::Add { term, translation } => {
            let row = repository.add_glossary_term(&term, &translation).await?;
            info!("Added '{}'", row.term);
        }
        GlossaryCommand::Update { term, translation } => {
            let row = repository.update_glossary_term(&term, &translation).await?;
            info!("Updated '{}'", row.term);
        }
        GlossaryCommand::Delete { term } => {
            repository.delete_glossary_term(&term).await?;
            info!("Deleted '{}'", term);
        }
    }
    Ok(())
}

async fn run_history(config: Config, command: HistoryCommand) -> Result<()> {
    let repository = open_repository(&config)?;
    match command {
        HistoryCommand::List => {
            let json = serde_json::to_string_pretty(&repository.list_translations().await?)
                .context("Failed to serialize history")?;
            println!("{}", json);
        }
        HistoryCommand::Add {
            text,
            translation,
            target_lang,
        } => {
            let id = repository
                .save_translation(NewTranslation {
                    original_text: text,
                    translated_text: translation,
                    target_language: target_lang
                        .unwrap_or_else(|| config.defaults.target_language.clone()),
                })
                .await?;
            info!("Saved translation {}", id);
        }
        HistoryCommand::Delete { id } => {
            repository.delete_translation(id).await?;
            info!("Deleted translation {}", id);
        }
    }
    Ok(())
}
