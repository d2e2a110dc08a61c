/// Loading and saving the JSON snapshot behind the CLI's `MemoryStore`.
use rankboard_core::{MemoryStore, Snapshot};
use std::path::Path;

use crate::bail;

/// Default snapshot file, relative to the working directory.
pub const DEFAULT_DATA_FILE: &str = "rankboard.json";

/// Load every leaderboard from `path`. A missing file is an empty store.
pub fn load_store(path: &Path) -> MemoryStore {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no snapshot yet, starting empty");
            return MemoryStore::new();
        }
        Err(e) => bail(format!("Failed to read {}: {e}", path.display())),
    };

    let snapshot: Snapshot = serde_json::from_str(&content)
        .unwrap_or_else(|e| bail(format!("Failed to parse {}: {e}", path.display())));

    MemoryStore::from_snapshot(snapshot)
        .unwrap_or_else(|e| bail(format!("Invalid snapshot {}: {e}", path.display())))
}

/// Write every leaderboard to `path`, via a sibling temp file and a rename.
pub fn save_store(path: &Path, store: &MemoryStore) {
    let snapshot = store.snapshot();
    let json = serde_json::to_string_pretty(&snapshot)
        .unwrap_or_else(|e| bail(format!("Failed to serialize snapshot: {e}")));

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).unwrap_or_else(|e| {
            bail(format!("Failed to create directory {}: {e}", parent.display()))
        });
    }

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)
        .unwrap_or_else(|e| bail(format!("Failed to write {}: {e}", tmp.display())));
    std::fs::rename(&tmp, path)
        .unwrap_or_else(|e| bail(format!("Failed to replace {}: {e}", path.display())));

    tracing::debug!(
        path = %path.display(),
        leaderboards = snapshot.leaderboards.len(),
        "saved snapshot"
    );
}
