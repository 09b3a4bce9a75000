//! Settings resolution: settings file, then environment and flags.

use anyhow::{Context as _, Result};
use directories::ProjectDirs;
use meshca_core::Settings;
use std::path::PathBuf;

use crate::cli::args::Cli;

/// Per-user settings file location.
pub fn default_path() -> Option<PathBuf> {
    ProjectDirs::from("org", "meshca", "meshca").map(|dirs| dirs.config_dir().join("meshca.toml"))
}

/// Settings file in use: `--config` / `MESHCA_CONFIG`, else the per-user file.
pub fn settings_path(cli: &Cli) -> Option<PathBuf> {
    cli.config.clone().or_else(default_path)
}

/// Load settings and apply command-line overrides.
pub fn load(cli: &Cli) -> Result<Settings> {
    let mut settings = match settings_path(cli) {
        Some(path) => Settings::load(&path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };
    apply_overrides(&mut settings, cli);
    Ok(settings)
}

fn apply_overrides(settings: &mut Settings, cli: &Cli) {
    if let Some(program) = &cli.nebula_cert {
        settings.signer_program.clone_from(program);
    }
    if let Some(path) = &cli.data_path {
        settings.data_path.clone_from(path);
    }
    if cli.work_dir.is_some() {
        settings.work_dir.clone_from(&cli.work_dir);
    }
}
