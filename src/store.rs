use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::Result;
use crate::models::PersonRecord;

pub const USERS_KEY: &str = "users";
pub const SETTINGS_KEY: &str = "settings";

/// Flat key-value store of JSON blobs, one `<key>.json` file per key.
#[derive(Debug, Clone)]
pub struct BlobStore {
    dir: PathBuf,
}

impl BlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.path_for(key);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    /// Replaces the blob atomically: readers see either the old or the new
    /// contents, never a partial write.
    pub async fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let raw = serde_json::to_vec_pretty(value)?;
        let dir = self.dir.clone();
        let path = self.path_for(key);
        tokio::task::spawn_blocking(move || atomic_write(&dir, &path, &raw))
            .await
            .map_err(std::io::Error::other)??;
        tracing::debug!(key, dir = %self.dir.display(), "saved blob");
        Ok(())
    }

    /// Stored users for a read-modify-write. A missing blob is an empty
    /// directory; an unreadable one is an error so it is never overwritten.
    pub async fn users(&self) -> Result<Vec<PersonRecord>> {
        Ok(self.get::<Vec<PersonRecord>>(USERS_KEY).await?.unwrap_or_default())
    }

    /// Read-only view: a missing or unreadable `users` blob yields an empty
    /// directory.
    pub async fn load_users(&self) -> Vec<PersonRecord> {
        match self.get::<Vec<PersonRecord>>(USERS_KEY).await {
            Ok(users) => users.unwrap_or_default(),
            Err(err) => {
                tracing::warn!(error = %err, "could not load users, starting empty");
                Vec::new()
            }
        }
    }

    pub async fn save_users(&self, users: &[PersonRecord]) -> Result<()> {
        self.put(USERS_KEY, &users).await?;
        tracing::info!(count = users.len(), "saved users");
        Ok(())
    }
}

fn atomic_write(dir: &Path, path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
