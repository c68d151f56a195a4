//! Review command - classify and review every Java file, then write the report

use super::{bar_style, open_classifiers, spinner_style};
use anyhow::{Context, Result};
use console::style;
use indicatif::ProgressBar;
use jreview::config::UserConfig;
use jreview::report::{self, OutputFormat};
use jreview::review::{discover_sources, ReviewOptions, Reviewer};
use std::path::Path;
use std::time::{Duration, Instant};

#[allow(clippy::too_many_arguments)]
pub fn run(
    project_dir: &Path,
    api_key: Option<&str>,
    report_path: &Path,
    dry_run: bool,
    backend: Option<&str>,
    model: Option<&str>,
    workers: usize,
    models_dir: Option<&Path>,
) -> Result<()> {
    let start = Instant::now();
    let project_dir = project_dir
        .canonicalize()
        .with_context(|| format!("Path does not exist: {}", project_dir.display()))?;

    let config = UserConfig::load()?;
    let client = config
        .ai_client(backend, model, api_key)
        .context("Cannot set up the completion service")?;

    println!(
        "\n{} Reviewing {} with {} ({})\n",
        style("🔍").bold(),
        style(project_dir.display()).cyan(),
        client.backend().display_name(),
        client.model()
    );

    let (store, classifiers) = open_classifiers(&config, models_dir);
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(spinner_style());
    spinner.set_message("Preparing classifiers...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    let readiness = classifiers
        .ensure_ready()
        .with_context(|| format!("Failed to prepare classifiers in {}", store.root().display()))?;
    spinner.finish_with_message(format!(
        "{} Classifiers ready (category {}, style {})",
        style("✓").green(),
        readiness.category,
        readiness.style
    ));

    let files = discover_sources(&project_dir);
    if files.is_empty() {
        println!(
            "{} No Java files under {}",
            style("!").yellow(),
            style(project_dir.join("src/main/java").display()).cyan()
        );
    }

    let bar = ProgressBar::new(files.len() as u64);
    bar.set_style(bar_style());
    let progress = bar.clone();
    let rows = Reviewer::new(&classifiers, &client)
        .with_options(ReviewOptions { dry_run, workers })
        .with_progress_callback(Box::new(move |path: &Path, _, _| {
            progress.inc(1);
            if let Some(name) = path.file_name() {
                progress.set_message(name.to_string_lossy().into_owned());
            }
        }))
        .review_files(&files)?;
    bar.finish_and_clear();

    report::write_report(report_path, &rows, OutputFormat::for_path(report_path))?;

    let failed = rows.iter().filter(|r| !r.is_ok()).count();
    let updated = rows.iter().filter(|r| r.written_back).count();
    println!(
        "{} Reviewed {} files in {:.1}s ({} updated{}, {} failed)",
        style("✓").green(),
        rows.len(),
        start.elapsed().as_secs_f64(),
        updated,
        if dry_run { ", dry run" } else { "" },
        failed
    );
    for row in rows.iter().filter(|r| !r.is_ok()) {
        println!(
            "  {} {}: {}",
            style("✗").red(),
            row.file.display(),
            row.error.as_deref().unwrap_or_default()
        );
    }
    println!(
        "{} Report saved to {}",
        style("📄").bold(),
        style(report_path.display()).cyan()
    );

    Ok(())
}
