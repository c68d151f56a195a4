//! Classify command - run the local models over files, no network

use super::open_classifiers;
use anyhow::{Context, Result};
use console::style;
use jreview::config::UserConfig;
use jreview::report::cluster_label;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
struct Classification {
    file: PathBuf,
    category: String,
    style: usize,
}

pub fn run(files: &[PathBuf], json: bool, models_dir: Option<&Path>) -> Result<()> {
    let config = UserConfig::load()?;
    let (store, classifiers) = open_classifiers(&config, models_dir);
    let readiness = classifiers
        .ensure_ready()
        .with_context(|| format!("Failed to prepare classifiers in {}", store.root().display()))?;
    tracing::debug!(
        "category model {}, style model {}",
        readiness.category,
        readiness.style
    );

    let mut results = Vec::with_capacity(files.len());
    for file in files {
        let code = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        results.push(Classification {
            file: file.clone(),
            category: classifiers.classify_category(&code)?,
            style: classifiers.classify_style(&code)?,
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    for r in &results {
        println!(
            "{}  {}  {}",
            style(r.file.display()).cyan(),
            style(&r.category).bold(),
            style(cluster_label(r.style)).dim()
        );
    }
    Ok(())
}
