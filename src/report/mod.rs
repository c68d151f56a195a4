//! Report writers for review results
//!
//! - `csv` - one row per file: `File,Category,Style,Review,Updated,Error`
//! - `json` - the full rows, untruncated

mod csv;
mod json;

use crate::review::ReviewRow;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

/// Default report file name
pub const DEFAULT_REPORT: &str = "code_review_report.csv";

/// Text written when a review offered no rewrite
pub const NO_UPDATE: &str = "No update provided.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow!("Unknown format '{}'. Valid formats: csv, json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl OutputFormat {
    /// Format implied by a report path's extension; CSV unless it ends in `.json`.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => OutputFormat::Json,
            _ => OutputFormat::Csv,
        }
    }
}

/// "cluster N", the label shown for a style cluster id
pub fn cluster_label(id: usize) -> String {
    format!("cluster {}", id)
}

pub fn render(rows: &[ReviewRow], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Csv => Ok(csv::render(rows)),
        OutputFormat::Json => json::render(rows),
    }
}

/// Render `rows` and write them to `path`, replacing any previous report.
///
/// The report goes to a sibling temp file first and is renamed into place.
pub fn write_report(path: &Path, rows: &[ReviewRow], format: OutputFormat) -> Result<()> {
    let content = render(rows, format)?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create report directory {}", dir.display()))?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("Invalid report path: {}", path.display()))?;
    let temp_path = dir.join(format!(".{}.{}.tmp", file_name, std::process::id()));

    let write = || -> std::io::Result<()> {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp_path, path)
    };
    if let Err(e) = write() {
        let _ = fs::remove_file(&temp_path);
        return Err(e).with_context(|| format!("Failed to write report {}", path.display()));
    }

    tracing::info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::PathBuf;

    pub(crate) fn sample_rows() -> Vec<ReviewRow> {
        vec![
            ReviewRow {
                file: PathBuf::from("src/main/java/A.java"),
                category: Some("class".into()),
                style: Some(2),
                review: Some("Fine, but \"final\" helps, really.\nUpdated Code:\nclass A {}".into()),
                updated: Some("class A {}".into()),
                written_back: true,
                error: None,
            },
            ReviewRow {
                file: PathBuf::from("src/main/java/B.java"),
                category: Some("method".into()),
                style: Some(0),
                review: Some("Looks good.".into()),
                updated: None,
                written_back: false,
                error: None,
            },
            ReviewRow {
                file: PathBuf::from("src/main/java/C.java"),
                error: Some("API error: 500 - boom".into()),
                ..Default::default()
            },
        ]
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("xml".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }

    #[test]
    fn test_format_for_path() {
        assert_eq!(OutputFormat::for_path(Path::new("out/report.JSON")), OutputFormat::Json);
        assert_eq!(OutputFormat::for_path(Path::new(DEFAULT_REPORT)), OutputFormat::Csv);
        assert_eq!(OutputFormat::for_path(Path::new("report")), OutputFormat::Csv);
    }

    #[test]
    fn test_write_report_replaces_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(DEFAULT_REPORT);

        write_report(&path, &sample_rows(), OutputFormat::Csv).unwrap();
        write_report(&path, &sample_rows()[..1], OutputFormat::Csv).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("File,Category,Style,Review,Updated,Error\n"));
        assert!(!content.contains("B.java"));

        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
