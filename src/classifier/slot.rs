//! Load-or-train holder for one persisted model
//!
//! The slot's own mutex guards the in-memory model. The store's identity lock
//! is held across load, train and save, so concurrent first callers for the
//! same identity train at most once, even from separate slots.

use super::{ClassifierError, ClassifierResult, ModelSource};
use crate::store::{Artifact, ModelStore, StoreError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

pub(crate) struct ModelSlot<A> {
    store: ModelStore,
    identity: String,
    model: Mutex<Option<Arc<A>>>,
    training_events: AtomicUsize,
}

impl<A: Artifact> ModelSlot<A> {
    pub(crate) fn new(store: ModelStore, identity: impl Into<String>) -> Self {
        Self {
            store,
            identity: identity.into(),
            model: Mutex::new(None),
            training_events: AtomicUsize::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Arc<A>>> {
        self.model.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn get(&self) -> Option<Arc<A>> {
        self.lock().as_ref().map(Arc::clone)
    }

    /// Return the in-memory model, else the stored one if it was trained on
    /// `fingerprint`, else train, persist and keep a fresh one.
    pub(crate) fn ensure_ready<F>(&self, fingerprint: &str, train: F) -> ClassifierResult<ModelSource>
    where
        F: FnOnce() -> ClassifierResult<A>,
    {
        let mut guard = self.lock();
        if guard.is_some() {
            return Ok(ModelSource::Cached);
        }
        let identity_lock = self.store.identity_lock(&self.identity)?;
        let _held = identity_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        match self.store.load::<A>(&self.identity) {
            Ok(Some(stored)) if stored.fingerprint == fingerprint => {
                tracing::debug!("Using stored '{}' model", self.identity);
                *guard = Some(Arc::new(stored.artifact));
                return Ok(ModelSource::Loaded);
            }
            Ok(Some(_)) => {
                tracing::warn!(
                    "Stored '{}' model was trained on a different corpus, retraining",
                    self.identity
                );
            }
            Ok(None) => {
                tracing::info!("No stored '{}' model, training", self.identity);
            }
            Err(StoreError::IncompatibleVersion { found, expected, .. }) => {
                tracing::warn!(
                    "Stored '{}' model has format version {} (current {}), retraining",
                    self.identity,
                    found,
                    expected
                );
            }
            Err(e) => return Err(e.into()),
        }

        let model = self.train_and_save(fingerprint, train)?;
        *guard = Some(model);
        Ok(ModelSource::Trained)
    }

    /// Train unconditionally, overwrite the stored artifact and swap it in.
    pub(crate) fn retrain<F>(&self, fingerprint: &str, train: F) -> ClassifierResult<()>
    where
        F: FnOnce() -> ClassifierResult<A>,
    {
        let mut guard = self.lock();
        let identity_lock = self.store.identity_lock(&self.identity)?;
        let _held = identity_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let model = self.train_and_save(fingerprint, train)?;
        *guard = Some(model);
        Ok(())
    }

    fn train_and_save<F>(&self, fingerprint: &str, train: F) -> ClassifierResult<Arc<A>>
    where
        F: FnOnce() -> ClassifierResult<A>,
    {
        let start = std::time::Instant::now();
        let artifact = train()?;
        self.training_events.fetch_add(1, Ordering::SeqCst);

        let path = self.store.save(&self.identity, &artifact, fingerprint)?;
        tracing::info!(
            "Trained '{}' model in {:?}, saved to {}",
            self.identity,
            start.elapsed(),
            path.display()
        );
        Ok(Arc::new(artifact))
    }

    pub(crate) fn require(&self, model: &'static str) -> ClassifierResult<Arc<A>> {
        self.get().ok_or(ClassifierError::ModelNotReady { model })
    }

    pub(crate) fn training_events(&self) -> usize {
        self.training_events.load(Ordering::SeqCst)
    }

    pub(crate) fn identity(&self) -> &str {
        &self.identity
    }

    pub(crate) fn store(&self) -> &ModelStore {
        &self.store
    }
}
