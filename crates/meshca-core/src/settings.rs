//! Runtime settings for the control plane.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::signer::{NebulaCert, Workspace, DEFAULT_SIGNER};
use crate::store::{JsonFileStore, DEFAULT_DATA_PATH};

/// Settings read from a TOML file. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Signer executable (default: `nebula-cert` on `PATH`).
    #[serde(default = "default_signer_program")]
    pub signer_program: PathBuf,

    /// State document location (default: `data/db.json`).
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,

    /// Parent directory for ephemeral signer work directories
    /// (default: the system temp dir).
    #[serde(default)]
    pub work_dir: Option<PathBuf>,

    /// Kill the signer after this many seconds (default: no limit).
    #[serde(default)]
    pub signer_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            signer_program: default_signer_program(),
            data_path: default_data_path(),
            work_dir: None,
            signer_timeout_secs: None,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .map_err(|e| crate::MeshError::io("read", path, e))?;
            toml::from_str(&content).map_err(|e| crate::MeshError::Settings(e.to_string()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn signer_timeout(&self) -> Option<Duration> {
        self.signer_timeout_secs.map(Duration::from_secs)
    }

    pub fn signer(&self) -> NebulaCert {
        NebulaCert::new(&self.signer_program).with_timeout(self.signer_timeout())
    }

    pub fn workspace(&self) -> Workspace {
        Workspace::new(self.work_dir.clone())
    }

    pub fn store(&self) -> JsonFileStore {
        JsonFileStore::new(&self.data_path)
    }
}

fn default_signer_program() -> PathBuf {
    PathBuf::from(DEFAULT_SIGNER)
}

fn default_data_path() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_PATH)
}
