//! Checkpointing the notice set to disk.
//!
//! A snapshot is the persisted-state shape of every notice; loading it back
//! reproduces identical field values.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::model::Notice;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub notices: Vec<Notice>,
}

impl Snapshot {
    /// Read a snapshot file. A missing file is an empty store, not an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let snapshot: Snapshot = serde_json::from_str(&content)?;
        debug!(path = %path.display(), notices = snapshot.notices.len(), "snapshot loaded");
        Ok(Some(snapshot))
    }

    /// Write the snapshot next to `path` and rename it into place.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(self)?)?;
        std::fs::rename(&tmp, path)?;
        debug!(path = %path.display(), notices = self.notices.len(), "snapshot saved");
        Ok(())
    }
}
