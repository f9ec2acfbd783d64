// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use polysum::api;
use polysum::app_config::{self, Config, ModelProvider};
use polysum::app_controller::Controller;
use polysum::pipeline::{PipelineRun, SummaryPipeline};
use polysum::providers::create_provider;
use polysum::summarization::SummaryParams;

/// CLI Wrapper for ModelProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliModelProvider {
    Ollama,
    #[value(name = "openai")]
    OpenAI,
    Anthropic,
    #[value(name = "lmstudio")]
    LMStudio,
}

impl From<CliModelProvider> for ModelProvider {
    fn from(cli_provider: CliModelProvider) -> Self {
        match cli_provider {
            CliModelProvider::Ollama => ModelProvider::Ollama,
            CliModelProvider::OpenAI => ModelProvider::OpenAI,
            CliModelProvider::Anthropic => ModelProvider::Anthropic,
            CliModelProvider::LMStudio => ModelProvider::LMStudio,
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

/// Options shared by every command that loads the configuration
#[derive(Args, Debug, Clone)]
struct CommonArgs {
    /// Configuration file path
    #[arg(short, long = "config", default_value = "conf.json")]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Model provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliModelProvider>,

    /// Model name to use for translation and summarization
    #[arg(short, long)]
    model: Option<String>,
}

#[derive(Args, Debug)]
struct SummarizeArgs {
    /// Text, Markdown or PDF file, a directory, or '-' for standard input
    #[arg(value_name = "INPUT", required_unless_present = "text")]
    input: Option<PathBuf>,

    /// Summarize this text instead of reading a file
    #[arg(long, conflicts_with = "input")]
    text: Option<String>,

    /// Print the result and its statistics as JSON
    #[arg(long)]
    json: bool,

    /// Overwrite existing summaries when summarizing a directory
    #[arg(short, long)]
    force_overwrite: bool,

    /// Character budget of the text handed to the summarizer
    #[arg(long)]
    input_max_length: Option<usize>,

    /// Longest summary in words
    #[arg(long)]
    max_length: Option<usize>,

    /// Shortest summary in words
    #[arg(long)]
    min_length: Option<usize>,

    /// Beam width for backends that support it
    #[arg(long)]
    beams: Option<u32>,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Summarize a document in its own language
    Summarize(SummarizeArgs),

    /// List the supported languages
    Languages {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Check that the configured provider is reachable
    Check {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Serve the HTTP API
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Generate shell completions for polysum
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// polysum - multilingual document summarization
///
/// Detects the language of a document, translates Romance-language input to
/// English, summarizes it with an LLM provider and translates the summary back.
#[derive(Parser, Debug)]
#[command(name = "polysum")]
#[command(version)]
#[command(about = "Summarize documents in their own language")]
#[command(long_about = "polysum summarizes English, Catalan, Spanish, French, Italian, Portuguese and Romanian text.
Non-English input is translated to English, summarized, and the summary translated back.

EXAMPLES:
    polysum summarize report.pdf                  # Summarize a PDF with the default config
    polysum summarize notes.txt --json            # Print the summary with statistics
    cat article.txt | polysum summarize -         # Summarize standard input
    polysum summarize --text \"Le texte...\"        # Summarize inline text
    polysum summarize -f docs/                    # Summarize every document in a folder
    polysum summarize -p openai -m gpt-4o doc.md  # Use a specific provider and model
    polysum serve --port 5000                     # Serve the HTTP API
    polysum completions bash > polysum.bash       # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.

SUPPORTED PROVIDERS:
    ollama    - Local Ollama server (default)
    openai    - OpenAI API (requires API key)
    anthropic - Anthropic Claude API (requires API key)
    lmstudio  - LM Studio local server (OpenAI-compatible on http://localhost:1234/v1)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
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
        log::set_boxed_logger(Box::new(CustomLogger::new(LevelFilter::Trace)))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    fn get_color_for_level(level: Level) -> &'static str {
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
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {} {}\x1B[0m",
                Self::get_color_for_level(record.level()),
                now,
                Self::get_emoji_for_level(record.level()),
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
    // The level is lowered or raised once the config is known
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "polysum", &mut std::io::stdout());
            Ok(())
        }
        Commands::Summarize(args) => run_summarize(args).await,
        Commands::Languages { common } => run_languages(&common),
        Commands::Check { common } => {
            let config = load_config(&common)?;
            let controller = Controller::with_config(config)?;
            controller.check_connection().await?;
            println!("OK");
            Ok(())
        }
        Commands::Serve { host, port, common } => {
            let mut config = load_config(&common)?;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            config.validate().context("Configuration validation failed")?;

            let provider = create_provider(&config.models)?;
            let pipeline = SummaryPipeline::from_config(&config, provider)?;
            api::serve(&config, pipeline).await
        }
    }
}

/// Load the configuration and apply the command line overrides
fn load_config(options: &CommonArgs) -> Result<Config> {
    // A level given on the command line applies to config loading too
    if let Some(cmd_log_level) = &options.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = Config::load_or_create(&options.config_path)?;

    if let Some(provider) = &options.provider {
        config.models.provider = provider.clone().into();
    }
    if let Some(model) = &options.model {
        config.models.active_provider_config_mut().model = model.clone();
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    log::set_max_level(config.log_level.to_level_filter());
    Ok(config)
}

fn run_languages(options: &CommonArgs) -> Result<()> {
    let config = load_config(options)?;
    let policy = config.languages.policy()?;
    for (code, name) in policy.language_names() {
        let route = if code == polysum::language_policy::WORKING_LANGUAGE {
            "direct"
        } else {
            "translated"
        };
        println!("{:<4} {:<12} {}", code, name, route);
    }
    Ok(())
}

async fn run_summarize(args: SummarizeArgs) -> Result<()> {
    let mut config = load_config(&args.common)?;
    if let Some(input_max_length) = args.input_max_length {
        config.summarization.input_max_length = input_max_length;
    }
    if let Some(max_length) = args.max_length {
        config.summarization.sum_max_length = max_length;
    }
    if let Some(min_length) = args.min_length {
        config.summarization.sum_min_length = min_length;
    }
    if let Some(beams) = args.beams {
        config.summarization.num_beams = beams;
    }

    let params = SummaryParams::from(&config.summarization);
    let controller = Controller::with_config(config)?.with_progress(!args.json);

    if let Some(text) = &args.text {
        let run = controller.summarize_text(text, Some(params)).await?;
        return print_run(&run, args.json);
    }

    let input = args
        .input
        .as_deref()
        .ok_or_else(|| anyhow!("An INPUT path or --text is required"))?;

    if input == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read standard input")?;
        let run = controller.summarize_text(&text, Some(params)).await?;
        print_run(&run, args.json)
    } else if input.is_file() {
        let run = controller.summarize_file(input, Some(params)).await?;
        print_run(&run, args.json)
    } else if input.is_dir() {
        let report = controller.summarize_folder(input, args.force_overwrite).await?;
        if args.json {
            println!(
                "{}",
                serde_json::json!({
                    "processed": report.processed,
                    "skipped": report.skipped,
                    "failed": report.failed,
                })
            );
        }
        if report.failed > 0 {
            return Err(anyhow!("{} file(s) could not be summarized", report.failed));
        }
        Ok(())
    } else {
        Err(anyhow!("Input path does not exist: {:?}", input))
    }
}

fn print_run(run: &PipelineRun, json: bool) -> Result<()> {
    if json {
        let output = serde_json::to_string_pretty(run).context("Failed to serialize result to JSON")?;
        println!("{}", output);
    } else {
        info!(
            "Language: {} | {} -> {} characters",
            run.result.lang, run.stats.input_chars, run.stats.summary_chars
        );
        println!("{}", run.result.text);
    }
    Ok(())
}
