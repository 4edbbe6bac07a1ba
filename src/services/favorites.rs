use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tempfile::NamedTempFile;

use crate::errors::StoreError;
use crate::models::{CatalogItem, FavoriteEntry};

/// Persisted, deduplicated favorites keyed by catalog URL.
///
/// Every mutating call rewrites the whole collection to disk before the
/// in-memory copy is updated, so a failed write leaves both unchanged.
#[derive(Debug)]
pub struct FavoritesStore {
    path: PathBuf,
    entries: Mutex<Vec<FavoriteEntry>>,
}

impl FavoritesStore {
    /// Hydrate from `path`. A missing or unreadable file yields an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = load_entries(&path);
        tracing::info!(path = %path.display(), count = entries.len(), "loaded favorites");
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if the item was inserted, `false` if already present.
    pub fn add(&self, item: CatalogItem) -> Result<bool, StoreError> {
        self.mutate(|entries| {
            if entries.iter().any(|f| f.item.url == item.url) {
                return false;
            }
            entries.push(FavoriteEntry::new(item));
            true
        })
    }

    /// Returns `true` if an entry was removed.
    pub fn remove(&self, url: &str) -> Result<bool, StoreError> {
        self.mutate(|entries| {
            let before = entries.len();
            entries.retain(|f| f.item.url != url);
            entries.len() != before
        })
    }

    pub fn is_member(&self, url: &str) -> bool {
        self.entries().iter().any(|f| f.item.url == url)
    }

    /// Replace the notes of an existing entry. Absent keys are left alone.
    pub fn update_notes(&self, url: &str, notes: impl Into<String>) -> Result<bool, StoreError> {
        let notes = notes.into();
        self.mutate(|entries| match entries.iter_mut().find(|f| f.item.url == url) {
            Some(entry) => {
                entry.notes = notes;
                true
            }
            None => false,
        })
    }

    pub fn get(&self, url: &str) -> Option<FavoriteEntry> {
        self.entries().iter().find(|f| f.item.url == url).cloned()
    }

    /// All entries in insertion order.
    pub fn list(&self) -> Vec<FavoriteEntry> {
        self.entries().clone()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    fn entries(&self) -> MutexGuard<'_, Vec<FavoriteEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn mutate<F>(&self, f: F) -> Result<bool, StoreError>
    where
        F: FnOnce(&mut Vec<FavoriteEntry>) -> bool,
    {
        let mut entries = self.entries();
        let mut next = entries.clone();
        let changed = f(&mut next);

        save_entries(&self.path, &next).map_err(|e| {
            tracing::error!(path = %self.path.display(), error = %e, "failed to persist favorites");
            e
        })?;

        *entries = next;
        Ok(changed)
    }
}

fn load_entries(path: &Path) -> Vec<FavoriteEntry> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not read favorites, starting empty");
            return Vec::new();
        }
    };

    match serde_json::from_slice(&data) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "malformed favorites file, starting empty");
            Vec::new()
        }
    }
}

/// Write the full collection via a temp file in the same directory, then rename.
fn save_entries(path: &Path, entries: &[FavoriteEntry]) -> Result<(), StoreError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    serde_json::to_writer(&mut tmp, entries)?;
    tmp.flush()?;
    tmp.persist(path)?;
    Ok(())
}
