//! Review orchestration
//!
//! For every Java source under `src/main/java`: read it, ask both local
//! classifiers about it, send it to the completion service for review, and
//! optionally write the suggested rewrite back. Each file produces one
//! [`ReviewRow`]; a failure on one file is recorded in its row and the batch
//! carries on.

pub mod testgen;

pub use testgen::{test_path_for, TestGenerator, TestOutcome};

use crate::ai::{extract_updated_code, AiError, CodeAssistant};
use crate::classifier::{ClassifierError, Classifiers, ClusterId};
use ignore::WalkBuilder;
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Where production sources live inside a Maven/Gradle project
pub const SOURCE_ROOT: [&str; 3] = ["src", "main", "java"];
pub const TEST_ROOT: [&str; 3] = ["src", "test", "java"];

/// Progress callback: (file, completed, total)
pub type ProgressCallback = Box<dyn Fn(&Path, usize, usize) + Send + Sync>;

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{} is not under src/main/java", .0.display())]
    OutsideSourceRoot(PathBuf),

    #[error(transparent)]
    Classifier(#[from] ClassifierError),

    #[error(transparent)]
    Ai(#[from] AiError),

    #[error("Failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type ReviewResult<T> = Result<T, ReviewError>;

/// `.java` files under `<project_dir>/src/main/java`, sorted.
///
/// A project without that directory yields an empty list.
pub fn discover_sources(project_dir: &Path) -> Vec<PathBuf> {
    let root = SOURCE_ROOT.iter().fold(project_dir.to_path_buf(), |p, c| p.join(c));
    if !root.is_dir() {
        warn!("No source directory at {}", root.display());
        return Vec::new();
    }

    let walker = WalkBuilder::new(&root)
        .hidden(true)
        .git_ignore(true)
        .git_global(false)
        .git_exclude(true)
        .build();

    let mut files: Vec<PathBuf> = walker
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_some_and(|t| t.is_file()))
        .map(|e| e.into_path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("java"))
        .collect();
    files.sort();

    debug!("Discovered {} Java files under {}", files.len(), root.display());
    files
}

/// One line of the review report
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReviewRow {
    pub file: PathBuf,
    pub category: Option<String>,
    pub style: Option<ClusterId>,
    pub review: Option<String>,
    /// Rewrite extracted from the review, if it offered one
    pub updated: Option<String>,
    /// Whether `updated` replaced the file on disk
    pub written_back: bool,
    pub error: Option<String>,
}

impl ReviewRow {
    fn new(file: &Path) -> Self {
        Self {
            file: file.to_path_buf(),
            ..Default::default()
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReviewOptions {
    /// Keep source files untouched even when the review offers a rewrite
    pub dry_run: bool,
    pub workers: usize,
}

impl Default for ReviewOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            workers: 1,
        }
    }
}

/// Drives classification and review over a project
pub struct Reviewer<'a> {
    classifiers: &'a Classifiers,
    assistant: &'a dyn CodeAssistant,
    options: ReviewOptions,
    progress_callback: Option<ProgressCallback>,
}

impl<'a> Reviewer<'a> {
    pub fn new(classifiers: &'a Classifiers, assistant: &'a dyn CodeAssistant) -> Self {
        Self {
            classifiers,
            assistant,
            options: ReviewOptions::default(),
            progress_callback: None,
        }
    }

    pub fn with_options(mut self, options: ReviewOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Review every source file of `project_dir`.
    ///
    /// Fails before touching any file if the classifiers cannot be loaded or
    /// trained. Per-file problems end up in the rows instead.
    pub fn review_project(&self, project_dir: &Path) -> ReviewResult<Vec<ReviewRow>> {
        let readiness = self.classifiers.ensure_ready()?;
        debug!(
            "Classifiers ready (category: {}, style: {})",
            readiness.category, readiness.style
        );

        let files = discover_sources(project_dir);
        info!("Reviewing {} files in {}", files.len(), project_dir.display());
        self.review_files(&files)
    }

    /// Review `files` in order. Rows come back in the same order as `files`
    /// regardless of the worker count.
    pub fn review_files(&self, files: &[PathBuf]) -> ReviewResult<Vec<ReviewRow>> {
        let completed = AtomicUsize::new(0);
        let total = files.len();
        let run = |path: &PathBuf| {
            let row = self.review_file(path);
            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(ref callback) = self.progress_callback {
                callback(path.as_path(), done, total);
            }
            row
        };

        if self.options.workers <= 1 {
            return Ok(files.iter().map(run).collect());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.workers)
            .build()?;
        Ok(pool.install(|| files.par_iter().map(run).collect()))
    }

    /// Review a single file; never fails, errors are recorded in the row.
    pub fn review_file(&self, path: &Path) -> ReviewRow {
        let mut row = ReviewRow::new(path);
        if let Err(e) = self.fill_row(path, &mut row) {
            warn!("Review of {} failed: {}", path.display(), e);
            row.error = Some(e.to_string());
        }
        row
    }

    fn fill_row(&self, path: &Path, row: &mut ReviewRow) -> ReviewResult<()> {
        let code = fs::read_to_string(path).map_err(|source| ReviewError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        row.category = Some(self.classifiers.classify_category(&code)?);
        row.style = Some(self.classifiers.classify_style(&code)?);

        let review = self.assistant.review(&code)?;
        row.updated = extract_updated_code(&review).map(str::to_string);
        row.review = Some(review);

        if let Some(updated) = row.updated.as_deref() {
            if self.options.dry_run {
                debug!("Dry run: leaving {} unchanged", path.display());
            } else {
                fs::write(path, updated).map_err(|source| ReviewError::Write {
                    path: path.to_path_buf(),
                    source,
                })?;
                row.written_back = true;
                info!("Updated {}", path.display());
            }
        }
        Ok(())
    }
}
