//! Default artifact locations - uses ~/.local/share/jreview/models/ (or the platform equivalent)

use std::path::PathBuf;

/// Store identity of the category classifier artifact.
pub const CATEGORY_MODEL_ID: &str = "code_review_model";

/// Store identity of the style detector artifact.
pub const STYLE_MODEL_ID: &str = "style_detector";

/// Get the default directory that holds trained artifacts.
/// Uses the platform data dir, falling back to ~/.local/share, then to ./.jreview.
pub fn default_models_dir() -> PathBuf {
    let base = dirs::data_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
        .unwrap_or_else(|| PathBuf::from(".jreview"));

    base.join("jreview").join("models")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_models_dir_format() {
        let dir = default_models_dir();
        assert!(dir.ends_with("jreview/models"));
    }

    #[test]
    fn test_identities_are_distinct() {
        assert_ne!(CATEGORY_MODEL_ID, STYLE_MODEL_ID);
    }
}
