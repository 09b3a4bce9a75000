//! Control plane for a Nebula overlay mesh.
//!
//! This crate owns the administrator side of a mesh:
//!
//! - **CA lifecycle**: create the Certificate Authority through the external
//!   `nebula-cert` tool and keep its key material ([`CertificateAuthority`])
//! - **Issuance**: sign host certificates with that CA ([`CertificateIssuer`])
//! - **Topology**: networks, hosts and their roles ([`Topology`])
//! - **Node config**: derive each node's configuration document ([`NodeConfig`])
//! - **Persistence**: save the whole state as one document ([`StateStore`])
//!
//! [`MeshController`] ties these together and serializes every change.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use meshca_core::{HostCertificateRequest, MeshController, Settings};
//!
//! async fn issue() -> meshca_core::Result<()> {
//!     let settings = Settings::default();
//!     let mesh = MeshController::open(
//!         Arc::new(settings.signer()),
//!         Arc::new(settings.store()),
//!         settings.workspace(),
//!     )
//!     .await?;
//!
//!     mesh.create_ca("mesh1").await?;
//!     let cert = mesh
//!         .sign_certificate(&HostCertificateRequest::new("node-a", "10.0.0.5/24"))
//!         .await?;
//!     println!("{}", cert.certificate);
//!     Ok(())
//! }
//! ```

pub mod ca;
pub mod controller;
mod error;
pub mod issuer;
pub mod node_config;
mod secret;
pub mod settings;
pub mod signer;
pub mod state;
pub mod store;
pub mod topology;

pub use ca::CertificateAuthority;
pub use controller::MeshController;
pub use error::{ErrorKind, MeshError, Result};
pub use issuer::{CertificateIssuer, HostCertificateRequest, HostCertificateResult};
pub use node_config::{HostConfigParams, NodeConfig};
pub use secret::SecretString;
pub use settings::Settings;
pub use signer::{NebulaCert, Signer, SignerError, Workspace};
pub use state::{CaSummary, MeshState, MeshSummary};
pub use store::{JsonFileStore, MemoryStore, StateStore};
pub use topology::{Host, HostRole, Network, Topology};
