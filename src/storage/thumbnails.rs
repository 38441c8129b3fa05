//! Persistent user → thumbnail mapping
//!
//! The whole mapping lives in memory and is mirrored to a flat JSON object on disk
//! (`{"<user_id>": "<file_id>"}`). Every change rewrites the file through a temporary sibling and an
//! atomic rename; the in-memory map is only updated once the write succeeded.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use teloxide::types::UserId;
use tokio::sync::RwLock;

use crate::core::error::PersistenceError;
use crate::core::types::ThumbnailRef;

/// Thumbnail references keyed by user id, backed by a JSON file.
pub struct ThumbnailStore {
    path: PathBuf,
    entries: RwLock<HashMap<String, ThumbnailRef>>,
}

impl ThumbnailStore {
    /// Loads the mapping from `path`. A missing file yields an empty store.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let path = path.into();

        let entries = match fs_err::tokio::read_to_string(&path).await {
            Ok(raw) if raw.trim().is_empty() => HashMap::new(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No thumbnail file at {}, starting empty", path.display());
                HashMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        log::info!("Loaded {} thumbnail(s) from {}", entries.len(), path.display());

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Thumbnail currently stored for `user`.
    pub async fn get(&self, user: UserId) -> Option<ThumbnailRef> {
        self.entries.read().await.get(&key(user)).cloned()
    }

    /// Stores `thumbnail` for `user`, replacing any previous one.
    ///
    /// The file is written before the in-memory map changes, so a failed write leaves both at the
    /// previous value. Writers are serialized by the map's write lock.
    pub async fn set(&self, user: UserId, thumbnail: ThumbnailRef) -> Result<(), PersistenceError> {
        let mut entries = self.entries.write().await;

        let mut next = entries.clone();
        next.insert(key(user), thumbnail);
        self.persist(&next).await?;

        *entries = next;
        log::info!("Thumbnail saved for user {} ({} total)", user, entries.len());
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// All entries sorted by user id key.
    pub async fn entries(&self) -> Vec<(String, ThumbnailRef)> {
        let entries = self.entries.read().await;
        let sorted: BTreeMap<_, _> = entries.iter().collect();
        sorted.into_iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    async fn persist(&self, entries: &HashMap<String, ThumbnailRef>) -> Result<(), PersistenceError> {
        let sorted: BTreeMap<_, _> = entries.iter().collect();
        let body = serde_json::to_vec_pretty(&sorted)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs_err::tokio::create_dir_all(parent).await?;
            }
        }

        let tmp = temp_sibling(&self.path);
        if let Err(e) = fs_err::tokio::write(&tmp, &body).await {
            fs_err::tokio::remove_file(&tmp).await.ok();
            return Err(e.into());
        }
        if let Err(e) = fs_err::tokio::rename(&tmp, &self.path).await {
            fs_err::tokio::remove_file(&tmp).await.ok();
            return Err(e.into());
        }
        Ok(())
    }
}

fn key(user: UserId) -> String {
    user.0.to_string()
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "thumbnails.json".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}
