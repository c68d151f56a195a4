//! Embedded training corpora and corpus fingerprints

use super::{ClassifierError, ClassifierResult};
use crate::store::checksum;
use serde::Serialize;

/// Labelled snippets for the category classifier
pub const CATEGORY_CORPUS: &[(&str, &str)] = &[
    (
        "public class Example { private int value; public Example(int value) { this.value = value; } }",
        "class",
    ),
    (
        "private void processData() { System.out.println(\"Processing\"); }",
        "method",
    ),
    (
        "if (value > 10) { System.out.println(\"Large\"); } else { System.out.println(\"Small\"); }",
        "conditional",
    ),
];

/// The same method written three ways, one per style cluster
pub const STYLE_CORPUS: &[&str] = &[
    "public int sum(int a, int b) { return a + b; }",
    "public int sum(int first, int second)\n{\n    int total = first + second;\n    return total;\n}",
    "public int sum(final int x, final int y) {\n\treturn Integer.sum(x, y);\n}",
];

/// Number of style clusters used with [`STYLE_CORPUS`]
pub const DEFAULT_STYLE_CLUSTERS: usize = 3;

/// SHA-256 over the serialized training inputs.
///
/// Stored with every artifact; a mismatch on load means the corpus or the
/// hyper-parameters changed and the artifact must be retrained.
pub fn fingerprint<T: Serialize + ?Sized>(inputs: &T) -> ClassifierResult<String> {
    let bytes = serde_json::to_vec(inputs)
        .map_err(|e| ClassifierError::InvalidCorpus(format!("cannot fingerprint corpus: {e}")))?;
    Ok(checksum(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_category_corpus_has_distinct_labels() {
        let labels: BTreeSet<_> = CATEGORY_CORPUS.iter().map(|(_, l)| *l).collect();
        assert_eq!(labels.len(), CATEGORY_CORPUS.len());
        assert!(labels.contains("class"));
    }

    #[test]
    fn test_style_corpus_fits_default_cluster_count() {
        assert_eq!(STYLE_CORPUS.len(), DEFAULT_STYLE_CLUSTERS);
    }

    #[test]
    fn test_fingerprint_changes_with_corpus() {
        let a = fingerprint(&CATEGORY_CORPUS).unwrap();
        let b = fingerprint(&CATEGORY_CORPUS).unwrap();
        assert_eq!(a, b);

        let mut extended = CATEGORY_CORPUS.to_vec();
        extended.push(("for (int i = 0; i < n; i++) {}", "loop"));
        assert_ne!(a, fingerprint(&extended).unwrap());
    }
}
