// =============================================================================
// Snapshot Store — durable JSON files, one per snapshot
// =============================================================================
//
// Files are named `<lowercase symbol>_<YYYYMMDD_HHMMSS>.json` from the
// document's own creation timestamp. Writes go to a `.tmp` sibling first and
// are renamed into place, so a reader never sees a half-written snapshot.
// Two saves for the same symbol within one second overwrite each other.
// =============================================================================

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::document::SnapshotDocument;
use crate::error::SnapshotError;

/// File-name timestamp format.
const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Persists and reloads snapshot documents.
pub struct SnapshotStore;

impl SnapshotStore {
    /// Deterministic file name for `document` saved under `symbol`.
    pub fn file_name(document: &SnapshotDocument, symbol: &str) -> String {
        format!(
            "{}_{}.json",
            symbol.to_lowercase(),
            document.timestamp.format(FILE_TIMESTAMP_FORMAT)
        )
    }

    /// Write `document` into `directory`, creating it if needed, and return
    /// the path of the new file.
    pub fn save(
        document: &SnapshotDocument,
        directory: &Path,
        symbol: &str,
    ) -> Result<PathBuf, SnapshotError> {
        std::fs::create_dir_all(directory).map_err(|source| SnapshotError::Storage {
            path: directory.to_path_buf(),
            source,
        })?;

        let path = directory.join(Self::file_name(document, symbol));
        let content = serde_json::to_string_pretty(document).map_err(SnapshotError::Serialize)?;

        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &content).map_err(|source| SnapshotError::Storage {
            path: tmp_path.clone(),
            source,
        })?;
        if let Err(source) = std::fs::rename(&tmp_path, &path) {
            if let Err(e) = std::fs::remove_file(&tmp_path) {
                debug!(path = %tmp_path.display(), error = %e, "could not remove temp file");
            }
            return Err(SnapshotError::Storage { path, source });
        }

        info!(path = %path.display(), bytes = content.len(), "snapshot saved");
        Ok(path)
    }

    /// Read back a document written by [`SnapshotStore::save`].
    pub fn load(path: &Path) -> Result<SnapshotDocument, SnapshotError> {
        let content = std::fs::read_to_string(path).map_err(|source| SnapshotError::Storage {
            path: path.to_path_buf(),
            source,
        })?;

        let document: SnapshotDocument =
            serde_json::from_str(&content).map_err(|source| SnapshotError::CorruptSnapshot {
                path: path.to_path_buf(),
                source,
            })?;

        debug!(path = %path.display(), symbol = %document.symbol, "snapshot loaded");
        Ok(document)
    }
}
