//! Persistence of the state snapshot.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;
use zeroize::Zeroizing;

use crate::error::{MeshError, Result};
use crate::state::MeshState;

/// Default location of the state document, relative to the working directory.
pub const DEFAULT_DATA_PATH: &str = "data/db.json";

/// Loads and saves the whole state snapshot.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Returns `None` when nothing has been saved yet.
    async fn load(&self) -> Result<Option<MeshState>>;

    async fn save(&self, state: &MeshState) -> Result<()>;
}

/// Stores the snapshot as a JSON document on disk.
///
/// The document holds the CA private key, so it is written owner-only and
/// replaced atomically through a temporary sibling file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn load(&self) -> Result<Option<MeshState>> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => Zeroizing::new(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no state document yet");
                return Ok(None);
            }
            Err(e) => return Err(MeshError::io("read", &self.path, e)),
        };
        let state = serde_json::from_str(&text)?;
        debug!(path = %self.path.display(), "state loaded");
        Ok(Some(state))
    }

    async fn save(&self, state: &MeshState) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            let mut builder = tokio::fs::DirBuilder::new();
            builder.recursive(true);
            #[cfg(unix)]
            builder.mode(0o750);
            builder
                .create(parent)
                .await
                .map_err(|e| MeshError::io("create directory", parent, e))?;
        }

        let json = Zeroizing::new(serde_json::to_vec_pretty(state)?);
        let tmp = self.tmp_path();

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);
        let mut file = options
            .open(&tmp)
            .await
            .map_err(|e| MeshError::io("create", &tmp, e))?;
        file.write_all(&json)
            .await
            .map_err(|e| MeshError::io("write", &tmp, e))?;
        file.sync_all()
            .await
            .map_err(|e| MeshError::io("sync", &tmp, e))?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| MeshError::io("replace", &self.path, e))?;
        debug!(path = %self.path.display(), "state saved");
        Ok(())
    }
}

/// Keeps the snapshot in memory. Useful for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    saved: Mutex<Option<MeshState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: MeshState) -> Self {
        Self {
            saved: Mutex::new(Some(state)),
        }
    }

    /// The last saved snapshot.
    pub async fn snapshot(&self) -> Option<MeshState> {
        self.saved.lock().await.clone()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn load(&self) -> Result<Option<MeshState>> {
        Ok(self.saved.lock().await.clone())
    }

    async fn save(&self, state: &MeshState) -> Result<()> {
        *self.saved.lock().await = Some(state.clone());
        Ok(())
    }
}
