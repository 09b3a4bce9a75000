//! Gateway to the external signer (`nebula-cert`).
//!
//! Every signer call runs inside a private, ephemeral work directory. Key
//! material is staged there only for the duration of the call and the
//! directory is removed when its [`TempDir`] guard drops, on every exit path.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MeshError, Result};

/// Default signer executable, looked up on `PATH`.
pub const DEFAULT_SIGNER: &str = "nebula-cert";

const WORK_DIR_PREFIX: &str = "meshca-";

/// Failures reported by a [`Signer`].
#[derive(Error, Debug)]
pub enum SignerError {
    /// The process could not be started at all
    #[error("could not start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran and exited unsuccessfully
    #[error("`{program}` exited with {}: {stderr}", exit_label(*.code))]
    Exit {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The process exceeded the configured deadline and was killed
    #[error("`{program}` did not finish within {after:?}")]
    Timeout { program: String, after: Duration },
}

fn exit_label(code: Option<i32>) -> String {
    code.map_or_else(|| "a signal".to_string(), |c| format!("code {c}"))
}

/// Capability to run the signer with an argument list inside a directory.
///
/// The signer reads and writes its key/certificate files relative to `cwd`.
#[async_trait]
pub trait Signer: Send + Sync {
    async fn invoke(&self, args: &[String], cwd: &Path) -> std::result::Result<(), SignerError>;
}

/// Runs the real `nebula-cert` binary.
#[derive(Debug, Clone)]
pub struct NebulaCert {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl NebulaCert {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: None,
        }
    }

    /// Kill the signer if it runs longer than `limit`.
    #[must_use]
    pub const fn with_timeout(mut self, limit: Option<Duration>) -> Self {
        self.timeout = limit;
        self
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }
}

impl Default for NebulaCert {
    fn default() -> Self {
        Self::new(DEFAULT_SIGNER)
    }
}

#[async_trait]
impl Signer for NebulaCert {
    async fn invoke(&self, args: &[String], cwd: &Path) -> std::result::Result<(), SignerError> {
        let program = self.program_name();
        debug!(program = %program, ?args, cwd = %cwd.display(), "invoking signer");

        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let run = cmd.output();
        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, run)
                .await
                .map_err(|_| SignerError::Timeout {
                    program: program.clone(),
                    after: limit,
                })?,
            None => run.await,
        }
        .map_err(|source| SignerError::Spawn {
            program: program.clone(),
            source,
        })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        warn!(program = %program, code = ?output.status.code(), stderr = %stderr, "signer failed");
        Err(SignerError::Exit {
            program,
            code: output.status.code(),
            stderr,
        })
    }
}

/// Where ephemeral signer work directories are created.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    base: Option<PathBuf>,
}

impl Workspace {
    /// Use `base` as the parent of work directories, or the system temp dir.
    pub const fn new(base: Option<PathBuf>) -> Self {
        Self { base }
    }

    pub fn base(&self) -> Option<&Path> {
        self.base.as_deref()
    }

    /// Create a fresh private directory, removed when the guard drops.
    pub(crate) fn acquire(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORK_DIR_PREFIX);
        let created = match &self.base {
            Some(base) => builder.tempdir_in(base),
            None => builder.tempdir(),
        };
        created.map_err(|e| {
            let parent = self.base.clone().unwrap_or_else(std::env::temp_dir);
            MeshError::io("create work directory in", parent, e)
        })
    }
}

/// Write `contents` to `dir/name`. Secret files get owner-only permissions.
pub(crate) async fn write_artifact(
    dir: &Path,
    name: &str,
    contents: &str,
    secret: bool,
) -> Result<()> {
    let path = dir.join(name);
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(if secret { 0o600 } else { 0o644 });
    #[cfg(not(unix))]
    let _ = secret;

    let mut file = options
        .open(&path)
        .await
        .map_err(|e| MeshError::io("create", &path, e))?;
    file.write_all(contents.as_bytes())
        .await
        .map_err(|e| MeshError::io("write", &path, e))?;
    file.flush()
        .await
        .map_err(|e| MeshError::io("write", &path, e))?;
    Ok(())
}

/// Read a file the signer was expected to produce. An empty file counts as missing.
pub(crate) async fn read_artifact(dir: &Path, name: &str) -> Result<String> {
    let path = dir.join(name);
    let contents = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| MeshError::io("read", &path, e))?;
    if contents.trim().is_empty() {
        let empty =
            std::io::Error::new(std::io::ErrorKind::InvalidData, "signer wrote an empty file");
        return Err(MeshError::io("read", &path, empty));
    }
    Ok(contents)
}
