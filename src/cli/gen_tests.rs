//! Gen-tests command - write a JUnit test class next to every source file

use super::bar_style;
use anyhow::{Context, Result};
use console::style;
use indicatif::ProgressBar;
use jreview::config::UserConfig;
use jreview::review::{discover_sources, TestGenerator};
use std::path::Path;

pub fn run(
    project_dir: &Path,
    api_key: Option<&str>,
    backend: Option<&str>,
    model: Option<&str>,
    workers: usize,
) -> Result<()> {
    let project_dir = project_dir
        .canonicalize()
        .with_context(|| format!("Path does not exist: {}", project_dir.display()))?;

    let config = UserConfig::load()?;
    let client = config
        .ai_client(backend, model, api_key)
        .context("Cannot set up the completion service")?;

    println!(
        "\n{} Generating tests for {} with {}\n",
        style("🧪").bold(),
        style(project_dir.display()).cyan(),
        client.backend().display_name()
    );

    let total = discover_sources(&project_dir).len();
    let bar = ProgressBar::new(total as u64);
    bar.set_style(bar_style());
    let progress = bar.clone();
    let outcomes = TestGenerator::new(&client)
        .with_workers(workers)
        .with_progress_callback(Box::new(move |path: &Path, _, _| {
            progress.inc(1);
            if let Some(name) = path.file_name() {
                progress.set_message(name.to_string_lossy().into_owned());
            }
        }))
        .generate_project(&project_dir)
        .context("Test generation failed")?;
    bar.finish_and_clear();

    for outcome in &outcomes {
        match (&outcome.test_file, &outcome.error) {
            (Some(test_file), _) => println!(
                "  {} {}",
                style("✓").green(),
                test_file.strip_prefix(&project_dir).unwrap_or(test_file).display()
            ),
            (None, error) => println!(
                "  {} {}: {}",
                style("✗").red(),
                outcome.source.display(),
                error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
    let written = outcomes.iter().filter(|o| o.test_file.is_some()).count();

    println!(
        "{} Wrote {} of {} test classes",
        style("✓").green(),
        written,
        outcomes.len()
    );
    Ok(())
}
