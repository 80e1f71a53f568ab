//! hmm-select - HMM model-order selection and recognition
//!
//! The main entry point for the hmm-select CLI:
//! - `select`: fit one model per category and report the chosen state counts
//! - `recognize`: fit, then classify test items by maximum likelihood
//! - `config`: inspect and validate selector.json
//!
//! JSON payloads go to stdout, logs and structured errors to stderr.

use clap::{Args, Parser, Subcommand};
use hs_common::{Error, StructuredError};
use hs_config::{validate_selector, SelectorConfig, CONFIG_SCHEMA_VERSION};
use hs_core::config::{load_config, ConfigOptions, ResolvedConfig};
use hs_core::exit_codes::ExitCode;
use hs_core::hmm::GaussianHmmTrainer;
use hs_core::input::{load_corpus, load_test_set};
use hs_core::logging::{
    event_names, generate_run_id, init_logging, LogConfig, LogContext, LogFormat, LogLevel, Stage,
};
use hs_core::recognize::recognize;
use hs_core::selection::{select_all, SelectionStrategy};
use serde::Serialize;
use std::path::PathBuf;

/// HMM model-order selection and maximum-likelihood recognition
#[derive(Parser)]
#[command(name = "hmm-select")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path to selector.json (overrides HMM_SELECT_CONFIG and XDG lookup)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv); -v also logs every candidate
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log format on stderr: human or jsonl
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Select the number of hidden states for every category
    Select(SelectArgs),

    /// Select models, then classify test items by maximum likelihood
    Recognize(RecognizeArgs),

    /// Inspect the selector configuration
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
struct SelectArgs {
    /// Training corpus JSON: {"CATEGORY": [[[f64; D]; len]; n]}
    #[arg(long)]
    corpus: PathBuf,

    #[command(flatten)]
    search: SearchArgs,
}

#[derive(Args, Debug)]
struct RecognizeArgs {
    /// Training corpus JSON: {"CATEGORY": [[[f64; D]; len]; n]}
    #[arg(long)]
    corpus: PathBuf,

    /// Test set JSON: {"<id>": [[f64; D]; len]}
    #[arg(long)]
    test: PathBuf,

    #[command(flatten)]
    search: SearchArgs,
}

/// Search options shared by `select` and `recognize`; unset values come
/// from selector.json.
#[derive(Args, Debug)]
struct SearchArgs {
    /// Selection criterion
    #[arg(long, value_enum, default_value_t = SelectionStrategy::Bic)]
    strategy: SelectionStrategy,

    /// Smallest candidate state count
    #[arg(long = "min")]
    min_components: Option<usize>,

    /// Largest candidate state count
    #[arg(long = "max")]
    max_components: Option<usize>,

    /// State count for the constant strategy
    #[arg(long = "constant")]
    n_constant: Option<usize>,

    /// Seed for training and fold shuffles
    #[arg(long)]
    seed: Option<u64>,
}

impl SearchArgs {
    /// Layer the CLI overrides on top of the configured selector.
    fn apply(&self, base: &SelectorConfig, verbose: bool) -> SelectorConfig {
        let mut selector = base.clone();
        if let Some(min) = self.min_components {
            selector.min_components = min;
        }
        if let Some(max) = self.max_components {
            selector.max_components = max;
        }
        if let Some(n) = self.n_constant {
            selector = selector.with_constant(n);
        }
        if let Some(seed) = self.seed {
            selector = selector.with_seed(seed);
        }
        if verbose {
            selector = selector.with_verbose(true);
        }
        selector
    }
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show the effective configuration and where it came from
    Show,

    /// Validate a selector.json file
    Validate {
        /// File to validate (defaults to the resolved config)
        path: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let cli_level = if cli.global.quiet || cli.global.verbose > 0 {
        Some(LogLevel::from_verbosity(cli.global.verbose, cli.global.quiet))
    } else {
        None
    };
    init_logging(&LogConfig::from_env(cli_level, cli.global.log_format));

    let context = LogContext::new(generate_run_id());
    let exit_code = match &cli.command {
        Commands::Select(args) => run_select(&cli.global, &context, args),
        Commands::Recognize(args) => run_recognize(&cli.global, &context, args),
        Commands::Config(args) => run_config(&cli.global, &context, args),
    };

    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Command implementations
// ============================================================================

#[derive(Serialize)]
struct Response<'a, T: Serialize> {
    schema_version: &'a str,
    run_id: &'a str,
    generated_at: String,
    config_hash: &'a str,
    #[serde(flatten)]
    body: T,
}

fn run_select(global: &GlobalOpts, context: &LogContext, args: &SelectArgs) -> ExitCode {
    let span = context.span(Stage::Select);
    let _entered = span.enter();
    tracing::info!(target: event_names::RUN_STARTED, command = "select", "run started");

    let (resolved, selector) = match prepare(global, &args.search) {
        Ok(prepared) => prepared,
        Err(code) => return code,
    };
    let corpus = match load_corpus(&args.corpus) {
        Ok(corpus) => corpus,
        Err(err) => return output_error(&err),
    };

    let trainer = GaussianHmmTrainer::new(resolved.config.trainer.clone());
    let report = select_all(args.search.strategy, &corpus, &trainer, &selector);

    let exit_code = if report.is_complete() {
        ExitCode::Clean
    } else {
        ExitCode::Partial
    };
    let response = Response {
        schema_version: CONFIG_SCHEMA_VERSION,
        run_id: &context.run_id,
        generated_at: chrono::Utc::now().to_rfc3339(),
        config_hash: resolved.snapshot.short_id(),
        body: report.summary(),
    };
    finish(&response, exit_code)
}

fn run_recognize(global: &GlobalOpts, context: &LogContext, args: &RecognizeArgs) -> ExitCode {
    let span = context.span(Stage::Recognize);
    let _entered = span.enter();
    tracing::info!(target: event_names::RUN_STARTED, command = "recognize", "run started");

    let (resolved, selector) = match prepare(global, &args.search) {
        Ok(prepared) => prepared,
        Err(code) => return code,
    };
    let corpus = match load_corpus(&args.corpus) {
        Ok(corpus) => corpus,
        Err(err) => return output_error(&err),
    };
    let test_set = match load_test_set(&args.test) {
        Ok(test_set) => test_set,
        Err(err) => return output_error(&err),
    };
    if let Some((id, item)) = test_set.iter().find(|(_, item)| item.dim() != corpus.dim()) {
        let err = Error::Recognition(format!(
            "test item {} has dimension {}, corpus has {}",
            id,
            item.dim(),
            corpus.dim()
        ));
        return output_error(&err);
    }

    let trainer = GaussianHmmTrainer::new(resolved.config.trainer.clone());
    let report = select_all(args.search.strategy, &corpus, &trainer, &selector);
    let complete = report.is_complete();
    let models = report.into_models();
    let recognition = recognize(&models, &test_set);

    let exit_code = if complete && recognition.unresolved() == 0 {
        ExitCode::Clean
    } else {
        ExitCode::Partial
    };
    let response = Response {
        schema_version: CONFIG_SCHEMA_VERSION,
        run_id: &context.run_id,
        generated_at: chrono::Utc::now().to_rfc3339(),
        config_hash: resolved.snapshot.short_id(),
        body: recognition,
    };
    finish(&response, exit_code)
}

fn run_config(global: &GlobalOpts, context: &LogContext, args: &ConfigArgs) -> ExitCode {
    let span = context.span(Stage::Init);
    let _entered = span.enter();

    match &args.command {
        ConfigCommands::Show => run_config_show(global, context),
        ConfigCommands::Validate { path } => {
            run_config_validate(global, context, path.as_ref())
        }
    }
}

/// Display the effective configuration (defaults if no file was found).
fn run_config_show(global: &GlobalOpts, context: &LogContext) -> ExitCode {
    let resolved = match load_config(&config_options(global, None)) {
        Ok(resolved) => resolved,
        Err(err) => return output_error(&Error::from(err)),
    };

    let response = serde_json::json!({
        "schema_version": CONFIG_SCHEMA_VERSION,
        "run_id": &context.run_id,
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "source": {
            "path": resolved.snapshot.path,
            "origin": resolved.snapshot.source,
            "hash": resolved.snapshot.content_hash,
            "using_defaults": resolved.using_defaults(),
        },
        "effective_hash": resolved.snapshot.effective_hash,
        "values": &resolved.config,
    });
    finish(&response, ExitCode::Clean)
}

/// Validate a selector.json file.
fn run_config_validate(
    global: &GlobalOpts,
    context: &LogContext,
    path: Option<&PathBuf>,
) -> ExitCode {
    let resolved = match load_config(&config_options(global, path)) {
        Ok(resolved) => resolved,
        Err(err) => return output_error(&Error::from(err)),
    };

    let response = serde_json::json!({
        "schema_version": CONFIG_SCHEMA_VERSION,
        "run_id": &context.run_id,
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "status": "valid",
        "path": resolved.snapshot.path,
        "using_defaults": resolved.using_defaults(),
        "effective_hash": resolved.snapshot.effective_hash,
    });
    finish(&response, ExitCode::Clean)
}

// ============================================================================
// Helpers
// ============================================================================

fn config_options(global: &GlobalOpts, path: Option<&PathBuf>) -> ConfigOptions {
    ConfigOptions {
        config_path: path.or(global.config.as_ref()).cloned(),
    }
}

/// Load the config and apply the search overrides.
fn prepare(
    global: &GlobalOpts,
    search: &SearchArgs,
) -> Result<(ResolvedConfig, SelectorConfig), ExitCode> {
    let resolved = load_config(&config_options(global, None))
        .map_err(|err| output_error(&Error::from(err)))?;

    let selector = search.apply(&resolved.config.selector, global.verbose > 0);
    if let Err(err) = validate_selector(&selector) {
        let err = Error::InvalidConfig(format!("invalid command-line override: {}", err));
        emit_error(&err);
        return Err(ExitCode::ArgsError);
    }
    Ok((resolved, selector))
}

/// Print the payload and log the end of the run.
fn finish<T: Serialize>(response: &T, exit_code: ExitCode) -> ExitCode {
    match serde_json::to_string_pretty(response) {
        Ok(json) => println!("{}", json),
        Err(err) => {
            tracing::error!(
                target: event_names::INTERNAL_ERROR,
                error = %err,
                "failed to serialize response"
            );
            return ExitCode::InternalError;
        }
    }
    tracing::info!(
        target: event_names::RUN_FINISHED,
        exit_code = exit_code.code_name(),
        "run finished"
    );
    exit_code
}

fn output_error(err: &Error) -> ExitCode {
    emit_error(err);
    ExitCode::from(err)
}

fn emit_error(err: &Error) {
    let structured = StructuredError::from(err).with_context("remediation", err.remediation());
    eprintln!("{}", structured.to_json());
}
