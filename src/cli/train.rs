//! Train command - build the local classifiers and cache them

use super::open_classifiers;
use anyhow::{Context, Result};
use console::style;
use jreview::classifier::ModelSource;
use jreview::config::UserConfig;
use std::path::Path;
use std::time::Instant;

pub fn run(force: bool, models_dir: Option<&Path>) -> Result<()> {
    let start = Instant::now();
    let config = UserConfig::load()?;
    let (store, classifiers) = open_classifiers(&config, models_dir);

    let (category, style_source) = if force {
        for identity in [classifiers.category().identity(), classifiers.style().identity()] {
            if store.remove(identity)? {
                tracing::info!("Removed stored '{}' model", identity);
            }
        }
        classifiers
            .retrain()
            .with_context(|| format!("Training failed in {}", store.root().display()))?;
        (ModelSource::Trained, ModelSource::Trained)
    } else {
        let readiness = classifiers
            .ensure_ready()
            .with_context(|| format!("Training failed in {}", store.root().display()))?;
        (readiness.category, readiness.style)
    };

    let report = |name: &str, identity: &str, source: ModelSource| -> Result<()> {
        println!(
            "{} {:<9} {:<8} {}",
            style("✓").green(),
            name,
            source.to_string(),
            style(store.path_for(identity)?.display()).cyan()
        );
        Ok(())
    };
    report("category", classifiers.category().identity(), category)?;
    report("style", classifiers.style().identity(), style_source)?;

    if let Some(model) = classifiers.category().model() {
        println!("  labels: {}", model.labels().join(", "));
    }
    if let Some(model) = classifiers.style().model() {
        println!("  style clusters: {}", model.cluster_count());
    }
    println!("  done in {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}
