//! Unit-test generation
//!
//! Mirrors each source under `src/main/java` into `src/test/java` as
//! `<Name>Test.java`, filled with whatever the completion service produced.

use super::{discover_sources, ProgressCallback, ReviewError, ReviewResult, SOURCE_ROOT, TEST_ROOT};
use crate::ai::{extract_code_block, CodeAssistant};
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{info, warn};

/// `.../src/main/java/a/B.java` → `.../src/test/java/a/BTest.java`.
///
/// The last `src/main/java` run in the path is the one replaced. `None` if the
/// path has no such run or no file name after it.
pub fn test_path_for(source: &Path) -> Option<PathBuf> {
    let components: Vec<Component> = source.components().collect();
    let root = components.windows(SOURCE_ROOT.len()).rposition(|w| {
        w.iter()
            .zip(SOURCE_ROOT)
            .all(|(c, name)| c.as_os_str() == name)
    })?;
    if root + SOURCE_ROOT.len() >= components.len() {
        return None;
    }

    let stem = source.file_stem()?.to_str()?;
    let mut out = PathBuf::new();
    for (i, c) in components.iter().enumerate() {
        match i.checked_sub(root) {
            Some(offset) if offset < TEST_ROOT.len() => out.push(TEST_ROOT[offset]),
            _ => out.push(c.as_os_str()),
        }
    }
    out.set_file_name(format!("{stem}Test.java"));
    Some(out)
}

/// Result of generating a test for one source file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestOutcome {
    pub source: PathBuf,
    pub test_file: Option<PathBuf>,
    pub error: Option<String>,
}

pub struct TestGenerator<'a> {
    assistant: &'a dyn CodeAssistant,
    workers: usize,
    progress_callback: Option<ProgressCallback>,
}

impl<'a> TestGenerator<'a> {
    pub fn new(assistant: &'a dyn CodeAssistant) -> Self {
        Self {
            assistant,
            workers: 1,
            progress_callback: None,
        }
    }

    /// Generate up to `workers` tests at once. Outcomes keep discovery order.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn generate_project(&self, project_dir: &Path) -> ReviewResult<Vec<TestOutcome>> {
        let files = discover_sources(project_dir);
        info!("Generating tests for {} files", files.len());

        let completed = AtomicUsize::new(0);
        let total = files.len();
        let run = |source: &PathBuf| {
            let outcome = self.generate_file(source);
            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(ref callback) = self.progress_callback {
                callback(source.as_path(), done, total);
            }
            outcome
        };

        if self.workers <= 1 {
            return Ok(files.iter().map(run).collect());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()?;
        Ok(pool.install(|| files.par_iter().map(run).collect()))
    }

    /// Generate and write the test class for `source`; errors land in the outcome.
    pub fn generate_file(&self, source: &Path) -> TestOutcome {
        match self.write_test(source) {
            Ok(path) => TestOutcome {
                source: source.to_path_buf(),
                test_file: Some(path),
                error: None,
            },
            Err(e) => {
                warn!("Test generation for {} failed: {}", source.display(), e);
                TestOutcome {
                    source: source.to_path_buf(),
                    test_file: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    fn write_test(&self, source: &Path) -> ReviewResult<PathBuf> {
        let target =
            test_path_for(source).ok_or_else(|| ReviewError::OutsideSourceRoot(source.to_path_buf()))?;
        let code = fs::read_to_string(source).map_err(|source_err| ReviewError::Read {
            path: source.to_path_buf(),
            source: source_err,
        })?;

        let response = self.assistant.unit_test(&code)?;
        let body = extract_code_block(&response).unwrap_or(&response);

        let write_err = |e| ReviewError::Write {
            path: target.clone(),
            source: e,
        };
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(&target, body).map_err(write_err)?;
        info!("Wrote {}", target.display());
        Ok(target)
    }
}
