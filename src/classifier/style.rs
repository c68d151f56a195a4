//! Style detector: TF-IDF + seeded k-means
//!
//! Cluster ids only mean something relative to the vectorizer the centroids
//! were fitted against, so [`StyleModel`] keeps both and they are persisted
//! as one artifact.

use super::corpus::{self, DEFAULT_STYLE_CLUSTERS};
use super::kmeans::{KMeans, KMeansConfig};
use super::slot::ModelSlot;
use super::tokenizer::Tokenizer;
use super::vectorizer::TfidfVectorizer;
use super::{ClassifierError, ClassifierResult, ClusterId, Deadline, ModelSource, TrainConfig};
use crate::store::{Artifact, ModelStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StyleSettings {
    pub tokenizer: Tokenizer,
    pub kmeans: KMeansConfig,
}

impl Default for StyleSettings {
    fn default() -> Self {
        Self {
            tokenizer: Tokenizer::default(),
            kmeans: KMeansConfig::new(DEFAULT_STYLE_CLUSTERS),
        }
    }
}

impl StyleSettings {
    pub fn with_clusters(mut self, k: usize) -> Self {
        self.kmeans.k = k;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.kmeans.seed = seed;
        self
    }
}

/// Fitted style artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleModel {
    pub vectorizer: TfidfVectorizer,
    pub clusters: KMeans,
}

impl Artifact for StyleModel {
    const KIND: &'static str = "style";
}

impl StyleModel {
    pub fn train<S: AsRef<str>>(
        corpus: &[S],
        settings: &StyleSettings,
        deadline: &Deadline,
    ) -> ClassifierResult<Self> {
        if corpus.is_empty() {
            return Err(ClassifierError::EmptyCorpus);
        }

        let vectorizer = TfidfVectorizer::fit(corpus, settings.tokenizer);
        let samples: Vec<_> = corpus
            .iter()
            .map(|d| vectorizer.transform(d.as_ref()))
            .collect();
        let clusters = KMeans::fit(
            &samples,
            vectorizer.vocabulary_size(),
            settings.kmeans,
            deadline,
        )?;

        Ok(Self {
            vectorizer,
            clusters,
        })
    }

    /// Nearest cluster for `snippet`; empty or unknown text still lands somewhere.
    pub fn classify(&self, snippet: &str) -> ClusterId {
        self.clusters.predict(&self.vectorizer.transform(snippet))
    }

    /// Cluster assigned to each training snippet during fitting
    pub fn training_assignments(&self) -> &[ClusterId] {
        self.clusters.labels()
    }

    pub fn cluster_count(&self) -> usize {
        self.clusters.k()
    }
}

/// Style classifier bound to a store identity and a training corpus
pub struct StyleClassifier {
    slot: ModelSlot<StyleModel>,
    corpus: Vec<String>,
    settings: StyleSettings,
    train_config: TrainConfig,
}

impl StyleClassifier {
    pub fn new<S: AsRef<str>>(store: ModelStore, identity: impl Into<String>, corpus: &[S]) -> Self {
        Self {
            slot: ModelSlot::new(store, identity),
            corpus: corpus.iter().map(|s| s.as_ref().to_string()).collect(),
            settings: StyleSettings::default(),
            train_config: TrainConfig::default(),
        }
    }

    pub fn with_defaults(store: ModelStore) -> Self {
        Self::new(store, crate::store::STYLE_MODEL_ID, corpus::STYLE_CORPUS)
    }

    pub fn with_settings(mut self, settings: StyleSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_train_config(mut self, train_config: TrainConfig) -> Self {
        self.train_config = train_config;
        self
    }

    pub fn fingerprint(&self) -> ClassifierResult<String> {
        corpus::fingerprint(&(StyleModel::KIND, &self.settings, &self.corpus))
    }

    pub fn ensure_ready(&self) -> ClassifierResult<ModelSource> {
        let fingerprint = self.fingerprint()?;
        self.slot.ensure_ready(&fingerprint, || self.train())
    }

    pub fn retrain(&self) -> ClassifierResult<()> {
        let fingerprint = self.fingerprint()?;
        self.slot.retrain(&fingerprint, || self.train())
    }

    fn train(&self) -> ClassifierResult<StyleModel> {
        let deadline = Deadline::after(self.train_config.timeout);
        StyleModel::train(&self.corpus, &self.settings, &deadline)
    }

    pub fn classify(&self, snippet: &str) -> ClassifierResult<ClusterId> {
        let model = self.slot.require("style")?;
        Ok(model.classify(snippet))
    }

    pub fn model(&self) -> Option<Arc<StyleModel>> {
        self.slot.get()
    }

    pub fn training_events(&self) -> usize {
        self.slot.training_events()
    }

    pub fn identity(&self) -> &str {
        self.slot.identity()
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::corpus::STYLE_CORPUS;
    use std::collections::BTreeSet;
    use std::time::Duration;

    fn deadline() -> Deadline {
        Deadline::after(Duration::from_secs(30))
    }

    #[test]
    fn test_each_training_snippet_gets_its_own_cluster() {
        let model = StyleModel::train(STYLE_CORPUS, &StyleSettings::default(), &deadline()).unwrap();
        let ids: BTreeSet<_> = model.training_assignments().iter().copied().collect();
        assert_eq!(ids, BTreeSet::from([0, 1, 2]));

        for (snippet, &id) in STYLE_CORPUS.iter().zip(model.training_assignments()) {
            assert_eq!(model.classify(snippet), id);
        }
    }

    #[test]
    fn test_fixed_seed_is_reproducible() {
        let a = StyleModel::train(STYLE_CORPUS, &StyleSettings::default(), &deadline()).unwrap();
        let b = StyleModel::train(STYLE_CORPUS, &StyleSettings::default(), &deadline()).unwrap();
        assert_eq!(a, b);
        for probe in ["", "public int sum(int a, int b)", "return total;"] {
            assert_eq!(a.classify(probe), b.classify(probe));
        }
    }

    #[test]
    fn test_degenerate_inputs_return_a_cluster() {
        let model = StyleModel::train(STYLE_CORPUS, &StyleSettings::default(), &deadline()).unwrap();
        assert!(model.classify("") < 3);
        assert!(model.classify("∅-vocabulary-gibberish-xyz123") < 3);
    }

    #[test]
    fn test_too_many_clusters_rejected() {
        let settings = StyleSettings::default().with_clusters(STYLE_CORPUS.len() + 1);
        let err = StyleModel::train(STYLE_CORPUS, &settings, &deadline()).unwrap_err();
        assert!(matches!(err, ClassifierError::InvalidClusterCount { k: 4, samples: 3 }));
    }

    #[test]
    fn test_training_timeout_surfaces() {
        let dir = tempfile::tempdir().unwrap();
        let classifier = StyleClassifier::with_defaults(ModelStore::new(dir.path()))
            .with_train_config(TrainConfig {
                timeout: Duration::ZERO,
            });
        let err = classifier.ensure_ready().unwrap_err();
        assert!(matches!(err, ClassifierError::TrainingTimeout { .. }));
        assert!(!dir.path().join("style_detector.bin").exists());
        assert!(classifier.model().is_none());
    }

    #[test]
    fn test_seed_changes_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        let a = StyleClassifier::with_defaults(store.clone());
        let b = StyleClassifier::with_defaults(store)
            .with_settings(StyleSettings::default().with_seed(7));
        assert_ne!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
    }

    #[test]
    fn test_changed_cluster_count_is_retrained() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());

        let two = StyleClassifier::with_defaults(store.clone())
            .with_settings(StyleSettings::default().with_clusters(2));
        assert_eq!(two.ensure_ready().unwrap(), ModelSource::Trained);
        assert_eq!(two.model().unwrap().cluster_count(), 2);

        let three = StyleClassifier::with_defaults(store.clone());
        assert_eq!(three.ensure_ready().unwrap(), ModelSource::Trained);
        assert_eq!(three.model().unwrap().cluster_count(), 3);

        let reopened = StyleClassifier::with_defaults(store);
        assert_eq!(reopened.ensure_ready().unwrap(), ModelSource::Loaded);
        assert_eq!(reopened.training_events(), 0);
    }
}
