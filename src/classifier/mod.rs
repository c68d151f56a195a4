//! Local snippet classifiers
//!
//! Two small statistical models run next to the AI review:
//!
//! - **Category**: bag-of-words counts → multinomial naive Bayes → a label
//!   such as `class`, `method` or `conditional`
//! - **Style**: TF-IDF → seeded k-means → a cluster id in `[0, k)`
//!
//! Each model is an explicit two-part artifact (fitted vectorizer plus fitted
//! estimator) persisted through [`crate::store::ModelStore`]. On first use a
//! model is loaded from the store, or trained from its embedded corpus and
//! saved when nothing usable is stored. Inference is read-only and safe to
//! call from several threads once the model is ready.

pub mod category;
pub mod corpus;
pub mod kmeans;
pub mod naive_bayes;
mod slot;
pub mod style;
pub mod tokenizer;
pub mod vectorizer;

pub use category::{CategoryClassifier, CategoryModel, CategorySettings};
pub use kmeans::{KMeans, KMeansConfig};
pub use naive_bayes::MultinomialNb;
pub use style::{StyleClassifier, StyleModel, StyleSettings};
pub use tokenizer::Tokenizer;
pub use vectorizer::{CountVectorizer, SparseVector, TfidfVectorizer};

use crate::store::{ModelStore, StoreError, CATEGORY_MODEL_ID, STYLE_MODEL_ID};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Default wall-clock budget for one training run
pub const DEFAULT_TRAINING_TIMEOUT: Duration = Duration::from_secs(30);

/// Label of a style cluster, `0..k`
pub type ClusterId = usize;

/// Errors that can occur while training or running the classifiers
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("{model} model is not ready: load or train it before classifying")]
    ModelNotReady { model: &'static str },

    #[error("Training corpus is empty")]
    EmptyCorpus,

    #[error("Invalid training corpus: {0}")]
    InvalidCorpus(String),

    #[error("Cluster count {k} is invalid for {samples} training samples")]
    InvalidClusterCount { k: usize, samples: usize },

    #[error("Training did not finish within {budget:?}")]
    TrainingTimeout { budget: Duration },

    #[error("Model store error: {0}")]
    Store(#[from] StoreError),
}

pub type ClassifierResult<T> = Result<T, ClassifierError>;

/// Training limits
#[derive(Debug, Clone, Copy)]
pub struct TrainConfig {
    pub timeout: Duration,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TRAINING_TIMEOUT,
        }
    }
}

/// Wall-clock budget checked between training steps
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    budget: Duration,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self {
            start: Instant::now(),
            budget,
        }
    }

    pub fn check(&self) -> ClassifierResult<()> {
        if self.start.elapsed() >= self.budget {
            Err(ClassifierError::TrainingTimeout {
                budget: self.budget,
            })
        } else {
            Ok(())
        }
    }
}

/// Where a ready model came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelSource {
    /// Already held in memory
    Cached,
    /// Read from the model store
    Loaded,
    /// Trained from the corpus and written to the store
    Trained,
}

impl std::fmt::Display for ModelSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelSource::Cached => write!(f, "cached"),
            ModelSource::Loaded => write!(f, "loaded"),
            ModelSource::Trained => write!(f, "trained"),
        }
    }
}

/// Outcome of [`Classifiers::ensure_ready`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Readiness {
    pub category: ModelSource,
    pub style: ModelSource,
}

/// Settings for both classifiers
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub category_id: String,
    pub style_id: String,
    pub category: CategorySettings,
    pub style: StyleSettings,
    pub train: TrainConfig,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            category_id: CATEGORY_MODEL_ID.to_string(),
            style_id: STYLE_MODEL_ID.to_string(),
            category: CategorySettings::default(),
            style: StyleSettings::default(),
            train: TrainConfig::default(),
        }
    }
}

/// The pair of classifiers the review pipeline consults for every file
pub struct Classifiers {
    category: CategoryClassifier,
    style: StyleClassifier,
}

impl Classifiers {
    /// Classifiers backed by `store`, trained on the embedded corpora when needed.
    pub fn new(store: ModelStore, config: ClassifierConfig) -> Self {
        let category = CategoryClassifier::new(
            store.clone(),
            config.category_id,
            corpus::CATEGORY_CORPUS,
        )
        .with_settings(config.category)
        .with_train_config(config.train);

        let style = StyleClassifier::new(store, config.style_id, corpus::STYLE_CORPUS)
            .with_settings(config.style)
            .with_train_config(config.train);

        Self { category, style }
    }

    /// Load or train both models. Any failure here is fatal for a run.
    pub fn ensure_ready(&self) -> ClassifierResult<Readiness> {
        Ok(Readiness {
            category: self.category.ensure_ready()?,
            style: self.style.ensure_ready()?,
        })
    }

    /// Retrain both models from their corpora and overwrite the stored artifacts.
    pub fn retrain(&self) -> ClassifierResult<()> {
        self.category.retrain()?;
        self.style.retrain()?;
        Ok(())
    }

    pub fn classify_category(&self, snippet: &str) -> ClassifierResult<String> {
        self.category.classify(snippet)
    }

    pub fn classify_style(&self, snippet: &str) -> ClassifierResult<ClusterId> {
        self.style.classify(snippet)
    }

    pub fn category(&self) -> &CategoryClassifier {
        &self.category
    }

    pub fn style(&self) -> &StyleClassifier {
        &self.style
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_before_ready_fails() {
        let dir = tempfile::tempdir().unwrap();
        let classifiers = Classifiers::new(ModelStore::new(dir.path()), ClassifierConfig::default());

        assert!(matches!(
            classifiers.classify_category("class A {}"),
            Err(ClassifierError::ModelNotReady { .. })
        ));
        assert!(matches!(
            classifiers.classify_style("class A {}"),
            Err(ClassifierError::ModelNotReady { .. })
        ));
    }

    #[test]
    fn test_ready_then_cached() {
        let dir = tempfile::tempdir().unwrap();
        let classifiers = Classifiers::new(ModelStore::new(dir.path()), ClassifierConfig::default());

        let first = classifiers.ensure_ready().unwrap();
        assert_eq!(first.category, ModelSource::Trained);
        assert_eq!(first.style, ModelSource::Trained);

        let second = classifiers.ensure_ready().unwrap();
        assert_eq!(second.category, ModelSource::Cached);
        assert_eq!(second.style, ModelSource::Cached);

        assert_eq!(
            classifiers.classify_category("public class Foo {}").unwrap(),
            "class"
        );
        assert!(classifiers.classify_style("public class Foo {}").unwrap() < 3);
    }

    #[test]
    fn test_deadline() {
        assert!(Deadline::after(Duration::from_secs(60)).check().is_ok());
    }

    #[test]
    fn test_model_source_display() {
        assert_eq!(ModelSource::Trained.to_string(), "trained");
        assert_eq!(ModelSource::Loaded.to_string(), "loaded");
        assert_eq!(ModelSource::Cached.to_string(), "cached");
    }
}
