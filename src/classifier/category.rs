//! Category classifier: term counts + multinomial naive Bayes

use super::corpus;
use super::naive_bayes::{MultinomialNb, DEFAULT_ALPHA};
use super::slot::ModelSlot;
use super::tokenizer::Tokenizer;
use super::vectorizer::CountVectorizer;
use super::{ClassifierError, ClassifierResult, Deadline, ModelSource, TrainConfig};
use crate::store::{Artifact, ModelStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Hyper-parameters of the category model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategorySettings {
    pub tokenizer: Tokenizer,
    /// Additive smoothing
    pub alpha: f64,
}

impl Default for CategorySettings {
    fn default() -> Self {
        Self {
            tokenizer: Tokenizer::default(),
            alpha: DEFAULT_ALPHA,
        }
    }
}

/// Fitted category artifact. Both halves are saved and loaded together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryModel {
    pub vectorizer: CountVectorizer,
    pub classifier: MultinomialNb,
}

impl Artifact for CategoryModel {
    const KIND: &'static str = "category";
}

impl CategoryModel {
    /// Fit on `(snippet, label)` pairs. Deterministic for a given corpus.
    pub fn train<S, L>(
        corpus: &[(S, L)],
        settings: &CategorySettings,
        deadline: &Deadline,
    ) -> ClassifierResult<Self>
    where
        S: AsRef<str>,
        L: AsRef<str>,
    {
        if corpus.is_empty() {
            return Err(ClassifierError::EmptyCorpus);
        }

        let docs: Vec<&str> = corpus.iter().map(|(s, _)| s.as_ref()).collect();
        let labels: Vec<&str> = corpus.iter().map(|(_, l)| l.as_ref()).collect();

        let vectorizer = CountVectorizer::fit(&docs, settings.tokenizer);
        let samples: Vec<_> = docs.iter().map(|d| vectorizer.transform(d)).collect();
        deadline.check()?;

        let classifier = MultinomialNb::fit(
            &samples,
            &labels,
            vectorizer.vocabulary_size(),
            settings.alpha,
        )?;

        Ok(Self {
            vectorizer,
            classifier,
        })
    }

    /// Most probable label for `snippet`. Never fails; unknown text gets the prior's pick.
    pub fn classify(&self, snippet: &str) -> &str {
        self.classifier.predict(&self.vectorizer.transform(snippet))
    }

    pub fn labels(&self) -> &[String] {
        self.classifier.classes()
    }
}

/// Category classifier bound to a store identity and a training corpus
pub struct CategoryClassifier {
    slot: ModelSlot<CategoryModel>,
    corpus: Vec<(String, String)>,
    settings: CategorySettings,
    train_config: TrainConfig,
}

impl CategoryClassifier {
    pub fn new<S, L>(store: ModelStore, identity: impl Into<String>, corpus: &[(S, L)]) -> Self
    where
        S: AsRef<str>,
        L: AsRef<str>,
    {
        Self {
            slot: ModelSlot::new(store, identity),
            corpus: corpus
                .iter()
                .map(|(s, l)| (s.as_ref().to_string(), l.as_ref().to_string()))
                .collect(),
            settings: CategorySettings::default(),
            train_config: TrainConfig::default(),
        }
    }

    /// Classifier over the embedded corpus, stored under the default identity.
    pub fn with_defaults(store: ModelStore) -> Self {
        Self::new(store, crate::store::CATEGORY_MODEL_ID, corpus::CATEGORY_CORPUS)
    }

    pub fn with_settings(mut self, settings: CategorySettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_train_config(mut self, train_config: TrainConfig) -> Self {
        self.train_config = train_config;
        self
    }

    /// Fingerprint of the corpus and settings this classifier trains on
    pub fn fingerprint(&self) -> ClassifierResult<String> {
        corpus::fingerprint(&(CategoryModel::KIND, &self.settings, &self.corpus))
    }

    pub fn ensure_ready(&self) -> ClassifierResult<ModelSource> {
        let fingerprint = self.fingerprint()?;
        self.slot.ensure_ready(&fingerprint, || self.train())
    }

    pub fn retrain(&self) -> ClassifierResult<()> {
        let fingerprint = self.fingerprint()?;
        self.slot.retrain(&fingerprint, || self.train())
    }

    fn train(&self) -> ClassifierResult<CategoryModel> {
        let deadline = Deadline::after(self.train_config.timeout);
        CategoryModel::train(&self.corpus, &self.settings, &deadline)
    }

    pub fn classify(&self, snippet: &str) -> ClassifierResult<String> {
        let model = self.slot.require("category")?;
        Ok(model.classify(snippet).to_string())
    }

    pub fn model(&self) -> Option<Arc<CategoryModel>> {
        self.slot.get()
    }

    /// Number of times this instance trained a model
    pub fn training_events(&self) -> usize {
        self.slot.training_events()
    }

    pub fn identity(&self) -> &str {
        self.slot.identity()
    }

    pub fn store(&self) -> &ModelStore {
        self.slot.store()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::corpus::CATEGORY_CORPUS;
    use std::time::Duration;

    fn deadline() -> Deadline {
        Deadline::after(Duration::from_secs(30))
    }

    fn trained() -> CategoryModel {
        CategoryModel::train(CATEGORY_CORPUS, &CategorySettings::default(), &deadline()).unwrap()
    }

    #[test]
    fn test_public_class_is_class() {
        assert_eq!(trained().classify("public class Foo {}"), "class");
    }

    #[test]
    fn test_corpus_examples_classify_to_their_labels() {
        let model = trained();
        for (snippet, label) in CATEGORY_CORPUS {
            assert_eq!(model.classify(snippet), *label);
        }
    }

    #[test]
    fn test_degenerate_inputs_return_a_known_label() {
        let model = trained();
        for input in ["", "∅-vocabulary-gibberish-xyz123", "{ } ; ( )"] {
            let label = model.classify(input);
            assert!(model.labels().iter().any(|l| l == label));
        }
    }

    #[test]
    fn test_training_is_deterministic() {
        let a = trained();
        let b = trained();
        assert_eq!(a, b);
        for probe in ["if (x) {}", "void run() {}", "class A"] {
            assert_eq!(a.classify(probe), b.classify(probe));
        }
    }

    #[test]
    fn test_empty_corpus_rejected() {
        let empty: &[(&str, &str)] = &[];
        let err = CategoryModel::train(empty, &CategorySettings::default(), &deadline()).unwrap_err();
        assert!(matches!(err, ClassifierError::EmptyCorpus));
    }

    #[test]
    fn test_lowercase_setting_changes_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        let plain = CategoryClassifier::with_defaults(store.clone());
        let folded = CategoryClassifier::with_defaults(store).with_settings(CategorySettings {
            tokenizer: Tokenizer::lowercase(),
            ..Default::default()
        });
        assert_ne!(plain.fingerprint().unwrap(), folded.fingerprint().unwrap());
    }

    #[test]
    fn test_stale_artifact_is_retrained() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());

        let old = CategoryClassifier::new(store.clone(), "category", &CATEGORY_CORPUS[..2]);
        assert_eq!(old.ensure_ready().unwrap(), ModelSource::Trained);
        assert_eq!(old.model().unwrap().labels().len(), 2);

        let current = CategoryClassifier::new(store.clone(), "category", CATEGORY_CORPUS);
        assert_eq!(current.ensure_ready().unwrap(), ModelSource::Trained);
        assert_eq!(current.model().unwrap().labels().len(), 3);

        let reopened = CategoryClassifier::new(store, "category", CATEGORY_CORPUS);
        assert_eq!(reopened.ensure_ready().unwrap(), ModelSource::Loaded);
        assert_eq!(reopened.training_events(), 0);
    }

    #[test]
    fn test_other_format_version_is_retrained() {
        use crate::store::tests::set_format_version;
        use crate::store::FORMAT_VERSION;

        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        CategoryClassifier::with_defaults(store.clone()).ensure_ready().unwrap();
        let path = store.path_for(crate::store::CATEGORY_MODEL_ID).unwrap();
        set_format_version(&path, FORMAT_VERSION + 1);

        let reopened = CategoryClassifier::with_defaults(store.clone());
        assert_eq!(reopened.ensure_ready().unwrap(), ModelSource::Trained);
        assert_eq!(reopened.training_events(), 1);

        let stored = store
            .load::<CategoryModel>(crate::store::CATEGORY_MODEL_ID)
            .unwrap()
            .expect("artifact rewritten");
        assert_eq!(&stored.artifact, reopened.model().unwrap().as_ref());
    }
}
