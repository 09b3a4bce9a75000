//! Administrator state snapshot: the CA and the topology.
//!
//! On disk the snapshot uses the `db.json` layout:
//! public CA data under `ca`, the CA key under `secrets.ca.key`, and the
//! networks list. A document with an incomplete CA loads as "no CA".

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::ca::CertificateAuthority;
use crate::secret::SecretString;
use crate::topology::{Network, Topology};

/// Everything the administrator owns: CA material and networks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StateDocument", into = "StateDocument")]
pub struct MeshState {
    pub ca: Option<CertificateAuthority>,
    pub topology: Topology,
}

impl MeshState {
    pub const fn is_established(&self) -> bool {
        self.ca.is_some()
    }

    /// Public view of the state, without secrets.
    pub fn summary(&self) -> MeshSummary {
        MeshSummary {
            ca: self.ca.as_ref().map(|ca| CaSummary {
                name: ca.name().to_string(),
                crt: ca.certificate().to_string(),
            }),
            networks: self.topology.networks().to_vec(),
        }
    }
}

/// State as shown to callers: CA identity and certificate, plus networks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeshSummary {
    pub ca: Option<CaSummary>,
    pub networks: Vec<Network>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaSummary {
    pub name: String,
    pub crt: String,
}

#[derive(Default, Serialize, Deserialize)]
struct StateDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ca: Option<CaDocument>,
    #[serde(default)]
    secrets: SecretsDocument,
    // Older documents carry `"networks": null` for an empty mesh.
    #[serde(default)]
    networks: Option<Topology>,
}

#[derive(Default, Serialize, Deserialize)]
struct CaDocument {
    #[serde(default)]
    name: String,
    #[serde(default)]
    crt: String,
}

#[derive(Default, Serialize, Deserialize)]
struct SecretsDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ca: Option<CaSecretDocument>,
}

#[derive(Serialize, Deserialize)]
struct CaSecretDocument {
    #[serde(default)]
    key: SecretString,
}

impl From<StateDocument> for MeshState {
    fn from(doc: StateDocument) -> Self {
        let ca = match (doc.ca, doc.secrets.ca) {
            (Some(ca), Some(secret)) => {
                let established = CertificateAuthority::from_parts(ca.name, ca.crt, secret.key);
                if established.is_none() {
                    warn!("stored CA is incomplete; treating the mesh as having no CA");
                }
                established
            }
            (Some(ca), None) if !ca.crt.trim().is_empty() => {
                warn!(ca = %ca.name, "stored CA certificate has no private key; ignoring it");
                None
            }
            _ => None,
        };
        Self {
            ca,
            topology: doc.networks.unwrap_or_default(),
        }
    }
}

impl From<MeshState> for StateDocument {
    fn from(state: MeshState) -> Self {
        let (ca, secrets) = match state.ca {
            Some(ca) => {
                let (name, crt, key) = ca.into_parts();
                (
                    Some(CaDocument { name, crt }),
                    SecretsDocument {
                        ca: Some(CaSecretDocument { key }),
                    },
                )
            }
            None => (None, SecretsDocument::default()),
        };
        Self {
            ca,
            secrets,
            networks: Some(state.topology),
        }
    }
}
