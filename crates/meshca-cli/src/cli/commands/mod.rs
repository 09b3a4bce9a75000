//! Command implementations.

pub mod ca;
pub mod cert;
pub mod config;
pub mod network;
pub mod show;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use meshca_core::{MeshController, Settings};

use crate::output::OutputFormat;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Resolved settings (file, environment, flags)
    pub settings: Settings,

    /// Settings file consulted, if any
    pub settings_path: Option<PathBuf>,

    /// Output format
    pub output_format: OutputFormat,
}

impl Context {
    /// Open the mesh state with the configured signer and store.
    pub async fn controller(&self) -> anyhow::Result<MeshController> {
        let store = self.settings.store();
        let mesh = MeshController::open(
            Arc::new(self.settings.signer()),
            Arc::new(store.clone()),
            self.settings.workspace(),
        )
        .await
        .with_context(|| format!("Failed to open mesh state at {}", store.path().display()))?;
        Ok(mesh)
    }
}
