use crate::task::Snapshot;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("task document not found at {}", path.display())]
    Missing { path: PathBuf },
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },
}

impl StoreError {
    pub fn is_missing(&self) -> bool {
        matches!(self, StoreError::Missing { .. })
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, StoreError::Malformed { .. })
    }
}

/// Read-only view of the task document maintained by the orchestrator tool.
/// Nothing is cached; every fetch goes back to disk.
#[derive(Debug, Clone)]
pub struct TaskStore {
    path: PathBuf,
}

impl TaskStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn fetch(&self) -> Result<Snapshot, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::Missing {
                    path: self.path.clone(),
                });
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let snapshot = parse_snapshot(&self.path, &content)?;
        debug!(
            event = "store_fetch",
            path = %self.path.display(),
            tasks = snapshot.len()
        );
        Ok(snapshot)
    }
}

pub fn parse_snapshot(path: &Path, content: &str) -> Result<Snapshot, StoreError> {
    let snapshot: Snapshot =
        serde_json::from_str(content).map_err(|err| StoreError::Malformed {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
    snapshot
        .validate()
        .map_err(|reason| StoreError::Malformed {
            path: path.to_path_buf(),
            reason,
        })?;
    Ok(snapshot)
}
