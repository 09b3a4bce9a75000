//! # meshca-cli
//!
//! Administrator command-line interface for a Nebula overlay mesh.
//!
//! ## Features
//!
//! - **CA lifecycle**: create or replace the mesh CA via `nebula-cert`
//! - **Issuance**: sign host certificates, with generated or supplied keys
//! - **Topology**: replace and inspect networks and hosts
//! - **Node configs**: render lighthouse and host configuration documents
//! - **Multiple output formats**: Pretty tables, JSON, YAML

pub mod cli;
pub mod config;
pub mod output;

pub use cli::run;
