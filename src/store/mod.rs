//! Durable storage for trained classifier artifacts
//!
//! Each artifact lives in one file, `<root>/<identity>.bin`, holding a
//! bitcode-encoded [`Envelope`] around the bitcode-encoded artifact. The
//! envelope records the artifact kind, the fingerprint of the corpus it was
//! trained on, and a SHA-256 checksum of the payload.
//!
//! A missing file is not an error: [`ModelStore::load`] returns `Ok(None)` and
//! the caller trains. Writes go through a temp file that is synced and renamed
//! over the target, so a reader sees either the old artifact or the new one.
//! [`ModelStore::identity_lock`] hands out one process-wide mutex per artifact
//! file, for callers that need load, train and save to run as one step.

pub mod paths;

pub use paths::{default_models_dir, CATEGORY_MODEL_ID, STYLE_MODEL_ID};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use thiserror::Error;

/// Bump when the envelope or any artifact layout changes.
pub const FORMAT_VERSION: u32 = 1;

const MAGIC: [u8; 4] = *b"JRVW";
const EXTENSION: &str = "bin";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Lock shared by every holder of the same artifact path in this process
pub type IdentityLock = Arc<Mutex<()>>;

fn identity_locks() -> &'static Mutex<HashMap<PathBuf, IdentityLock>> {
    static LOCKS: OnceLock<Mutex<HashMap<PathBuf, IdentityLock>>> = OnceLock::new();
    LOCKS.get_or_init(Default::default)
}

/// Errors raised while reading or writing artifacts
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode artifact '{identity}': {message}")]
    Encode { identity: String, message: String },

    #[error("Failed to decode artifact at {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },

    #[error("Artifact at {} is corrupt: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("Artifact at {} has format version {found}, expected {expected}", path.display())]
    IncompatibleVersion {
        path: PathBuf,
        found: u32,
        expected: u32,
    },

    #[error("Invalid store identity '{0}': use a plain file name without separators")]
    InvalidIdentity(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A value that can be persisted in a [`ModelStore`]
pub trait Artifact: Serialize + DeserializeOwned {
    /// Tag written into the envelope; a file with a different tag is rejected.
    const KIND: &'static str;
}

/// An artifact read back from disk, with the fingerprint it was saved under
#[derive(Debug, Clone)]
pub struct Stored<A> {
    pub artifact: A,
    pub fingerprint: String,
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    magic: [u8; 4],
    format_version: u32,
    kind: String,
    fingerprint: String,
    checksum: String,
    payload: Vec<u8>,
}

/// Filesystem-backed artifact store rooted at an explicit directory
#[derive(Debug, Clone)]
pub struct ModelStore {
    root: PathBuf,
}

impl ModelStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve the file that backs `identity`.
    pub fn path_for(&self, identity: &str) -> StoreResult<PathBuf> {
        validate_identity(identity)?;
        Ok(self.root.join(format!("{identity}.{EXTENSION}")))
    }

    /// The mutex guarding `identity` under this root.
    ///
    /// Keyed by the artifact path as given, so stores opened on the same root
    /// path share it.
    pub fn identity_lock(&self, identity: &str) -> StoreResult<IdentityLock> {
        let path = self.path_for(identity)?;
        let mut locks = identity_locks()
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(Arc::clone(locks.entry(path).or_default()))
    }

    pub fn exists(&self, identity: &str) -> StoreResult<bool> {
        Ok(self.path_for(identity)?.is_file())
    }

    /// Load the artifact stored under `identity`.
    ///
    /// Returns `Ok(None)` when nothing has been saved there yet.
    pub fn load<A: Artifact>(&self, identity: &str) -> StoreResult<Option<Stored<A>>> {
        let path = self.path_for(identity)?;
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No artifact at {}", path.display());
                return Ok(None);
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        let envelope: Envelope = bitcode::deserialize(&bytes).map_err(|e| StoreError::Decode {
            path: path.clone(),
            message: e.to_string(),
        })?;

        if envelope.magic != MAGIC {
            return Err(StoreError::Corrupt {
                path,
                reason: "bad magic tag".to_string(),
            });
        }
        if envelope.format_version != FORMAT_VERSION {
            return Err(StoreError::IncompatibleVersion {
                path,
                found: envelope.format_version,
                expected: FORMAT_VERSION,
            });
        }
        if envelope.kind != A::KIND {
            return Err(StoreError::Corrupt {
                path,
                reason: format!("expected a '{}' artifact, found '{}'", A::KIND, envelope.kind),
            });
        }
        if checksum(&envelope.payload) != envelope.checksum {
            return Err(StoreError::Corrupt {
                path,
                reason: "payload checksum mismatch".to_string(),
            });
        }

        let artifact: A =
            bitcode::deserialize(&envelope.payload).map_err(|e| StoreError::Decode {
                path: path.clone(),
                message: e.to_string(),
            })?;

        tracing::debug!("Loaded '{}' artifact from {}", A::KIND, path.display());
        Ok(Some(Stored {
            artifact,
            fingerprint: envelope.fingerprint,
        }))
    }

    /// Persist `artifact` under `identity`, replacing whatever was there.
    pub fn save<A: Artifact>(
        &self,
        identity: &str,
        artifact: &A,
        fingerprint: &str,
    ) -> StoreResult<PathBuf> {
        let path = self.path_for(identity)?;

        let payload = bitcode::serialize(artifact).map_err(|e| StoreError::Encode {
            identity: identity.to_string(),
            message: e.to_string(),
        })?;
        let envelope = Envelope {
            magic: MAGIC,
            format_version: FORMAT_VERSION,
            kind: A::KIND.to_string(),
            fingerprint: fingerprint.to_string(),
            checksum: checksum(&payload),
            payload,
        };
        let bytes = bitcode::serialize(&envelope).map_err(|e| StoreError::Encode {
            identity: identity.to_string(),
            message: e.to_string(),
        })?;

        fs::create_dir_all(&self.root).map_err(|source| StoreError::Io {
            path: self.root.clone(),
            source,
        })?;

        // Write to temp file first, then rename (atomic on POSIX)
        let tmp_path = self.root.join(format!(
            ".{identity}.{}.{}.tmp",
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        write_synced(&tmp_path, &bytes).map_err(|source| {
            let _ = fs::remove_file(&tmp_path);
            StoreError::Io {
                path: tmp_path.clone(),
                source,
            }
        })?;
        fs::rename(&tmp_path, &path).map_err(|source| {
            let _ = fs::remove_file(&tmp_path);
            StoreError::Io {
                path: path.clone(),
                source,
            }
        })?;

        tracing::debug!(
            "Saved '{}' artifact to {} ({} bytes)",
            A::KIND,
            path.display(),
            bytes.len()
        );
        Ok(path)
    }

    /// Delete the artifact under `identity`. Returns whether a file was removed.
    pub fn remove(&self, identity: &str) -> StoreResult<bool> {
        let path = self.path_for(identity)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn validate_identity(identity: &str) -> StoreResult<()> {
    let bad = identity.is_empty()
        || identity == "."
        || identity == ".."
        || identity.starts_with('.')
        || identity.contains(['/', '\\', '\0']);
    if bad {
        Err(StoreError::InvalidIdentity(identity.to_string()))
    } else {
        Ok(())
    }
}

/// Hex-encoded SHA-256 of `bytes`.
pub fn checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
