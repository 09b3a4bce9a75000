//! Host certificate issuance against an established CA.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ca::{CertificateAuthority, CA_CERT_FILE, CA_KEY_FILE};
use crate::error::{MeshError, Result};
use crate::secret::SecretString;
use crate::signer::{read_artifact, write_artifact, Signer, Workspace};
use crate::topology::parse_cidr;

pub const HOST_CERT_FILE: &str = "host.crt";
pub const HOST_KEY_FILE: &str = "host.key";
pub const HOST_PUB_FILE: &str = "host.pub";

/// A request to sign a certificate for one mesh host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostCertificateRequest {
    /// Host identity embedded in the certificate
    pub name: String,
    /// Overlay address with prefix, e.g. `10.0.0.5/24`
    #[serde(alias = "ip")]
    pub ip_range: String,
    /// Host-generated public key; when absent the signer generates a key pair
    #[serde(default, rename = "pub", skip_serializing_if = "Option::is_none")]
    pub pub_key: Option<String>,
}

impl HostCertificateRequest {
    pub fn new(name: impl Into<String>, ip_range: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ip_range: ip_range.into(),
            pub_key: None,
        }
    }

    #[must_use]
    pub fn with_public_key(mut self, key: impl Into<String>) -> Self {
        self.pub_key = Some(key.into());
        self
    }

    /// The supplied public key, treating a blank string as absent.
    pub fn public_key(&self) -> Option<&str> {
        self.pub_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(MeshError::validation("host name must not be empty"));
        }
        if parse_cidr(&self.ip_range).is_none() {
            return Err(MeshError::validation(format!(
                "ip range '{}' for host '{}' is not of the form address/prefix",
                self.ip_range, self.name
            )));
        }
        Ok(())
    }

    fn signer_args(&self) -> Vec<String> {
        let mut args: Vec<String> = [
            "sign",
            "-name",
            self.name.trim(),
            "-ip",
            self.ip_range.trim(),
            "-out-crt",
            HOST_CERT_FILE,
        ]
        .iter()
        .map(ToString::to_string)
        .collect();

        let (flag, file) = if self.public_key().is_some() {
            ("-in-pub", HOST_PUB_FILE)
        } else {
            ("-out-key", HOST_KEY_FILE)
        };
        args.push(flag.to_string());
        args.push(file.to_string());
        args
    }
}

/// A signed host certificate. `private_key` is only set when the key pair
/// was generated on the host's behalf.
#[derive(Debug, Clone, Serialize)]
pub struct HostCertificateResult {
    #[serde(rename = "crt")]
    pub certificate: String,
    #[serde(rename = "key", skip_serializing_if = "Option::is_none")]
    pub private_key: Option<SecretString>,
}

/// Signs host certificates with the CA key via the signer.
pub struct CertificateIssuer<'a> {
    signer: &'a dyn Signer,
    workspace: &'a Workspace,
}

impl<'a> CertificateIssuer<'a> {
    pub const fn new(signer: &'a dyn Signer, workspace: &'a Workspace) -> Self {
        Self { signer, workspace }
    }

    /// Sign `request` with `ca`.
    ///
    /// The CA key is staged in plaintext inside a private work directory for
    /// the duration of the call only. Either every required artifact is read
    /// back or the call fails; no partial result is returned.
    pub async fn sign(
        &self,
        ca: Option<&CertificateAuthority>,
        request: &HostCertificateRequest,
    ) -> Result<HostCertificateResult> {
        let ca = ca.ok_or(MeshError::CaNotEstablished)?;
        request.validate()?;

        let dir = self.workspace.acquire()?;
        write_artifact(dir.path(), CA_KEY_FILE, ca.private_key().expose(), true).await?;
        write_artifact(dir.path(), CA_CERT_FILE, ca.certificate(), false).await?;
        if let Some(key) = request.public_key() {
            write_artifact(dir.path(), HOST_PUB_FILE, key, false).await?;
        }

        self.signer.invoke(&request.signer_args(), dir.path()).await?;

        let certificate = read_artifact(dir.path(), HOST_CERT_FILE).await?;
        let private_key = if request.public_key().is_some() {
            None
        } else {
            Some(SecretString::from(read_artifact(dir.path(), HOST_KEY_FILE).await?))
        };

        info!(
            host = %request.name,
            ip = %request.ip_range,
            generated_key = private_key.is_some(),
            ca = ca.name(),
            "host certificate signed"
        );
        Ok(HostCertificateResult {
            certificate,
            private_key,
        })
    }
}
