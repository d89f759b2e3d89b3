//! Result persistence between the processing flow and the results view.
//!
//! Results are keyed by the [`ResultId`] generated when a run completes, so
//! a newer run never clobbers the entry an older results view is reading.
//! Values are stored JSON-encoded in both implementations; a value that no
//! longer decodes is reported as [`MediDiagnoseError::CorruptResult`] rather
//! than panicking.

use crate::error::MediDiagnoseError;
use crate::model::PersistedResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Identifier of a finished diagnosis run: milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResultId(u64);

impl ResultId {
    pub fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    pub fn as_millis(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ResultId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(ResultId)
    }
}

/// Hands out time-based ids that strictly increase, even when two runs
/// finish within the same millisecond.
#[derive(Debug, Default)]
pub struct ResultIdClock {
    last: AtomicU64,
}

impl ResultIdClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> ResultId {
        let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
        let mut prev = self.last.load(Ordering::SeqCst);
        loop {
            let candidate = now.max(prev + 1);
            match self
                .last
                .compare_exchange(prev, candidate, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return ResultId(candidate),
                Err(actual) => prev = actual,
            }
        }
    }
}

/// Keyed storage for finished runs.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Store `result` under `id`, replacing any previous value.
    async fn put(&self, id: ResultId, result: &PersistedResult) -> Result<(), MediDiagnoseError>;

    /// Fetch the result for `id`; `Ok(None)` when nothing was stored.
    async fn get(&self, id: ResultId) -> Result<Option<PersistedResult>, MediDiagnoseError>;
}

fn decode(id: ResultId, raw: &str) -> Result<PersistedResult, MediDiagnoseError> {
    serde_json::from_str(raw).map_err(|e| MediDiagnoseError::CorruptResult {
        id: id.to_string(),
        detail: e.to_string(),
    })
}

fn encode(id: ResultId, result: &PersistedResult) -> Result<String, MediDiagnoseError> {
    serde_json::to_string(result).map_err(|e| MediDiagnoseError::StoreWriteFailed {
        id: id.to_string(),
        reason: e.to_string(),
    })
}

// ── In-memory ────────────────────────────────────────────────────────────

/// Process-lifetime store; entries vanish when the store is dropped.
#[derive(Debug, Default)]
pub struct MemoryResultStore {
    entries: Mutex<HashMap<ResultId, String>>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw (possibly malformed) JSON value.
    pub fn put_raw(&self, id: ResultId, raw: impl Into<String>) {
        self.lock().insert(id, raw.into());
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ResultId, String>> {
        // A panic while holding the lock cannot leave a half-written entry.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ResultStore for MemoryResultStore {
    async fn put(&self, id: ResultId, result: &PersistedResult) -> Result<(), MediDiagnoseError> {
        let raw = encode(id, result)?;
        self.lock().insert(id, raw);
        debug!("Stored result {} in memory", id);
        Ok(())
    }

    async fn get(&self, id: ResultId) -> Result<Option<PersistedResult>, MediDiagnoseError> {
        let raw = self.lock().get(&id).cloned();
        raw.map(|r| decode(id, &r)).transpose()
    }
}

// ── File-backed ──────────────────────────────────────────────────────────

/// One `<id>.json` file per result inside a directory.
#[derive(Debug, Clone)]
pub struct FileResultStore {
    dir: PathBuf,
}

impl FileResultStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, id: ResultId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Ids of every stored result, oldest first.
    pub async fn list(&self) -> Result<Vec<ResultId>, MediDiagnoseError> {
        let read_failed = |e: std::io::Error| MediDiagnoseError::StoreReadFailed {
            id: "*".to_string(),
            reason: format!("listing {}: {e}", self.dir.display()),
        };

        let mut ids = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ids),
            Err(e) => return Err(read_failed(e)),
        };

        while let Some(entry) = entries.next_entry().await.map_err(read_failed)? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match path.file_stem().and_then(|s| s.to_str()).map(str::parse) {
                Some(Ok(id)) => ids.push(id),
                _ => warn!("Ignoring unexpected file in store: {}", path.display()),
            }
        }

        ids.sort_unstable();
        Ok(ids)
    }
}

#[async_trait]
impl ResultStore for FileResultStore {
    async fn put(&self, id: ResultId, result: &PersistedResult) -> Result<(), MediDiagnoseError> {
        let write_err = |e: std::io::Error| MediDiagnoseError::StoreWriteFailed {
            id: id.to_string(),
            reason: e.to_string(),
        };
        let raw = encode(id, result)?;

        tokio::fs::create_dir_all(&self.dir).await.map_err(write_err)?;

        // Atomic write: a reader never sees a half-written result.
        let path = self.path_for(id);
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, raw).await.map_err(write_err)?;
        tokio::fs::rename(&tmp_path, &path).await.map_err(write_err)?;

        debug!("Stored result {} at {}", id, path.display());
        Ok(())
    }

    async fn get(&self, id: ResultId) -> Result<Option<PersistedResult>, MediDiagnoseError> {
        let path = self.path_for(id);
        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => decode(id, &raw).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(MediDiagnoseError::StoreReadFailed {
                id: id.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}
