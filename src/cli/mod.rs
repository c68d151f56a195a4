//! CLI command definitions and handlers

mod classify;
mod config;
mod gen_tests;
mod review;
mod train;

use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::ProgressStyle;
use jreview::classifier::Classifiers;
use jreview::config::UserConfig;
use jreview::store::ModelStore;
use std::path::{Path, PathBuf};

/// Parse and validate workers count (1-64)
fn parse_workers(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("workers must be at least 1".to_string())
    } else if n > 64 {
        Err("workers cannot exceed 64".to_string())
    } else {
        Ok(n)
    }
}

/// jreview - AI code review and unit-test generation for Java projects
#[derive(Parser, Debug)]
#[command(name = "jreview")]
#[command(
    version,
    about = "AI-assisted code review and JUnit test generation for Java projects",
    long_about = "jreview sends every Java source under src/main/java to an OpenAI-compatible \
completion service (DeepSeek by default) for review, tags each file with a category and a \
style cluster from two small local classifiers, and writes the results to a CSV report.\n\n\
The classifiers are trained once from built-in examples and cached under the models directory.",
    after_help = "\
Examples:
  jreview review ./my-app $DEEPSEEK_API_KEY            Review and write back suggested code
  jreview review ./my-app --dry-run --report out.csv   Review without touching sources
  jreview gen-tests ./my-app                           Generate JUnit tests (key from env/config)
  jreview classify src/main/java/App.java --json       Classify files locally, no network
  jreview train --force                                Retrain the local classifiers"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Number of files sent to the completion service at once (1-64)
    #[arg(long, global = true, default_value = "1", value_parser = parse_workers)]
    pub workers: usize,

    /// Directory for trained classifier models
    #[arg(long, global = true, env = "JREVIEW_MODELS_DIR")]
    pub models_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Review every Java file of a project and write a report
    Review {
        /// Project root (the directory that contains src/main/java)
        project_dir: PathBuf,

        /// API key for the completion service (default: config file or environment)
        api_key: Option<String>,

        /// Report file (.csv, or .json for JSON output)
        #[arg(long, short = 'r', default_value = jreview::report::DEFAULT_REPORT)]
        report: PathBuf,

        /// Do not write suggested code back to the source files
        #[arg(long)]
        dry_run: bool,

        /// Backend: deepseek, openai, openrouter, ollama
        #[arg(long, value_parser = ["deepseek", "openai", "openrouter", "ollama"])]
        backend: Option<String>,

        /// Model name (default depends on backend)
        #[arg(long)]
        model: Option<String>,
    },

    /// Generate a JUnit test class for every Java file of a project
    GenTests {
        /// Project root (the directory that contains src/main/java)
        project_dir: PathBuf,

        /// API key for the completion service (default: config file or environment)
        api_key: Option<String>,

        /// Backend: deepseek, openai, openrouter, ollama
        #[arg(long, value_parser = ["deepseek", "openai", "openrouter", "ollama"])]
        backend: Option<String>,

        /// Model name (default depends on backend)
        #[arg(long)]
        model: Option<String>,
    },

    /// Classify files with the local models only
    Classify {
        /// Files to classify
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Train the local classifiers (if needed) and cache them
    Train {
        /// Retrain even if usable models are cached
        #[arg(long)]
        force: bool,
    },

    /// Manage the user configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create ~/.config/jreview/config.toml with commented examples
    Init,
    /// Print the effective configuration (API keys masked)
    Show,
}

/// Run the CLI
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Review {
            project_dir,
            api_key,
            report,
            dry_run,
            backend,
            model,
        } => review::run(
            &project_dir,
            api_key.as_deref(),
            &report,
            dry_run,
            backend.as_deref(),
            model.as_deref(),
            cli.workers,
            cli.models_dir.as_deref(),
        ),

        Commands::GenTests {
            project_dir,
            api_key,
            backend,
            model,
        } => gen_tests::run(
            &project_dir,
            api_key.as_deref(),
            backend.as_deref(),
            model.as_deref(),
            cli.workers,
        ),

        Commands::Classify { files, json } => {
            classify::run(&files, json, cli.models_dir.as_deref())
        }

        Commands::Train { force } => train::run(force, cli.models_dir.as_deref()),

        Commands::Config { action } => match action {
            ConfigAction::Init => config::init(),
            ConfigAction::Show => config::show(cli.models_dir.as_deref()),
        },
    }
}

/// Classifiers backed by the configured (or overridden) models directory
fn open_classifiers(config: &UserConfig, models_dir: Option<&Path>) -> (ModelStore, Classifiers) {
    let store = ModelStore::new(config.models_dir(models_dir));
    let classifiers = Classifiers::new(store.clone(), config.classifier_config());
    (store, classifiers)
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .expect("valid template")
        .progress_chars("█▓▒░  ")
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .expect("valid template")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_workers() {
        assert_eq!(parse_workers("1"), Ok(1));
        assert_eq!(parse_workers("64"), Ok(64));
        assert!(parse_workers("0").is_err());
        assert!(parse_workers("65").is_err());
        assert!(parse_workers("many").is_err());
    }

    #[test]
    fn test_review_args() {
        let cli = Cli::try_parse_from([
            "jreview", "review", "proj", "sk-123", "--dry-run", "--workers", "4",
        ])
        .unwrap();
        assert_eq!(cli.workers, 4);
        match cli.command {
            Commands::Review {
                project_dir,
                api_key,
                report,
                dry_run,
                ..
            } => {
                assert_eq!(project_dir, PathBuf::from("proj"));
                assert_eq!(api_key.as_deref(), Some("sk-123"));
                assert_eq!(report, PathBuf::from("code_review_report.csv"));
                assert!(dry_run);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_gen_tests_accepts_workers() {
        let cli = Cli::try_parse_from(["jreview", "gen-tests", "proj", "--workers", "3"]).unwrap();
        assert_eq!(cli.workers, 3);
        assert!(matches!(cli.command, Commands::GenTests { .. }));
    }

    #[test]
    fn test_classify_requires_files() {
        assert!(Cli::try_parse_from(["jreview", "classify"]).is_err());
        assert!(Cli::try_parse_from(["jreview", "review", "p", "--backend", "claude"]).is_err());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
