//! Certificate Authority creation.
//!
//! The CA is produced by `nebula-cert ca` in a throwaway directory. All three
//! fields (name, certificate, key) are read before a value is returned, so
//! a caller either gets a complete CA or an error.

use tracing::info;

use crate::error::{MeshError, Result};
use crate::secret::SecretString;
use crate::signer::{read_artifact, Signer, Workspace};

/// File the signer writes the CA private key to.
pub const CA_KEY_FILE: &str = "ca.key";
/// File the signer writes the CA certificate to.
pub const CA_CERT_FILE: &str = "ca.crt";

/// An established CA: name, public certificate and private key, all present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateAuthority {
    name: String,
    certificate: String,
    private_key: SecretString,
}

impl CertificateAuthority {
    /// Rebuild a CA from stored parts. Returns `None` unless both the
    /// certificate and the key are present.
    pub fn from_parts(
        name: impl Into<String>,
        certificate: impl Into<String>,
        private_key: SecretString,
    ) -> Option<Self> {
        let certificate = certificate.into();
        if certificate.trim().is_empty() || private_key.is_empty() {
            return None;
        }
        Some(Self {
            name: name.into(),
            certificate,
            private_key,
        })
    }

    /// Run `nebula-cert ca -name <name>` and collect the generated key pair.
    ///
    /// Fails with a signer error if the process fails and with an I/O error
    /// if either output file is missing. The work directory is removed on
    /// every path.
    pub async fn create(name: &str, signer: &dyn Signer, workspace: &Workspace) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MeshError::validation("CA name must not be empty"));
        }

        let dir = workspace.acquire()?;
        let args = vec!["ca".to_string(), "-name".to_string(), name.to_string()];
        signer.invoke(&args, dir.path()).await?;

        let private_key = SecretString::from(read_artifact(dir.path(), CA_KEY_FILE).await?);
        let certificate = read_artifact(dir.path(), CA_CERT_FILE).await?;

        info!(ca = name, "certificate authority created");
        Ok(Self {
            name: name.to_string(),
            certificate,
            private_key,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// CA certificate in the signer's PEM format.
    pub fn certificate(&self) -> &str {
        &self.certificate
    }

    pub(crate) const fn private_key(&self) -> &SecretString {
        &self.private_key
    }

    pub(crate) fn into_parts(self) -> (String, String, SecretString) {
        (self.name, self.certificate, self.private_key)
    }
}
