//! Storage for uploaded PDF files.
//!
//! Database rows only hold the path a [`FileStore`] hands back. The server
//! writes to a local directory; the in-memory backend lives in
//! `store::memory`.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::backend::store::{StoreError, UserId};

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Persist `bytes` under `name` and return the path to record
    async fn save(&self, name: &str, bytes: &[u8]) -> Result<String, StoreError>;

    /// Remove a previously saved file; a missing file is not an error
    async fn delete(&self, path: &str) -> Result<(), StoreError>;
}

/// Server-generated file name, so nothing from the client reaches the path
pub fn upload_name(owner_id: UserId) -> String {
    format!("{}_{:016x}.pdf", owner_id, rand::random::<u64>())
}

/// Files under one directory on the local disk
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn save(&self, name: &str, bytes: &[u8]) -> Result<String, StoreError> {
        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.root.join(name);
        tokio::fs::write(&path, bytes).await?;
        Ok(path.to_string_lossy().into_owned())
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
