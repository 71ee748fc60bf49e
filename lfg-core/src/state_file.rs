//! Optional on-disk copy of the active-topic table.
//!
//! The forum stays the source of truth: a record is only used by restore when
//! its topic is still open. The file just keeps what titles cannot carry
//! (original creation time, origin channel).

use crate::entities::RequestTopic;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum StateFileError {
    #[error("failed to access state file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode state file: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateDocument {
    #[serde(default)]
    topics: Vec<RequestTopic>,
}

#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the saved topics. A missing or unreadable file yields an empty
    /// table.
    pub fn load(&self) -> Vec<RequestTopic> {
        match self.try_load() {
            Ok(topics) => topics,
            Err(StateFileError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No state file yet");
                Vec::new()
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Ignoring unreadable state file"
                );
                Vec::new()
            }
        }
    }

    fn try_load(&self) -> Result<Vec<RequestTopic>, StateFileError> {
        let content = std::fs::read_to_string(&self.path)?;
        let document: StateDocument = serde_json::from_str(&content)?;
        Ok(document.topics)
    }

    /// Replace the file with `topics`.
    pub fn save(&self, topics: &[RequestTopic]) -> Result<(), StateFileError> {
        let document = StateDocument {
            topics: topics.to_vec(),
        };
        let json = serde_json::to_string_pretty(&document)?;

        // Write atomically: write to temp file, then rename
        let temp_path = self.path.with_extension("json.tmp");
        std::fs::write(&temp_path, json)?;
        std::fs::rename(&temp_path, &self.path)?;

        Ok(())
    }
}
