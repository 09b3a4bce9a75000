//! Command-line argument definitions using clap.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::output::OutputFormat;

/// Administer a Nebula overlay mesh
///
/// Creates the mesh Certificate Authority, signs host certificates and
/// renders node configuration. Requires `nebula-cert` on PATH (or
/// --nebula-cert).
#[derive(Parser, Debug)]
#[command(name = "meshca")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "pretty")]
    pub output: OutputFormat,

    /// Settings file (TOML)
    #[arg(long, env = "MESHCA_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Path to the nebula-cert executable
    #[arg(long, env = "NEBULA_CERT", global = true)]
    pub nebula_cert: Option<PathBuf>,

    /// State document location
    #[arg(long, env = "DATA_PATH", global = true)]
    pub data_path: Option<PathBuf>,

    /// Parent directory for temporary signer work directories
    #[arg(long, global = true)]
    pub work_dir: Option<PathBuf>,

    /// Log filter (e.g. "info", "meshca_core=debug")
    #[arg(long, env = "MESHCA_LOG", global = true, default_value = "warn")]
    pub log_level: String,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Certificate Authority management
    Ca(CaArgs),

    /// Host certificate issuance
    Cert(CertArgs),

    /// Mesh networks and hosts
    Network(NetworkArgs),

    /// Render node configuration documents
    Config(ConfigArgs),

    /// Show the mesh state (CA certificate and networks, no secrets)
    Show,
}

// ============================================================================
// CA command
// ============================================================================

#[derive(Args, Debug)]
pub struct CaArgs {
    #[command(subcommand)]
    pub command: CaCommands,
}

#[derive(Subcommand, Debug)]
pub enum CaCommands {
    /// Create the CA, replacing any existing one
    ///
    /// Certificates signed by a previous CA stop being trusted.
    Create {
        /// CA name embedded in its certificate
        name: String,
    },

    /// Show the CA name and certificate
    Show,
}

// ============================================================================
// Cert command
// ============================================================================

#[derive(Args, Debug)]
pub struct CertArgs {
    #[command(subcommand)]
    pub command: CertCommands,
}

#[derive(Subcommand, Debug)]
pub enum CertCommands {
    /// Sign a host certificate with the mesh CA
    Sign(SignArgs),
}

#[derive(Args, Debug)]
pub struct SignArgs {
    /// Host name
    #[arg(long)]
    pub name: String,

    /// Overlay address with prefix (e.g. 10.0.0.5/24)
    #[arg(long)]
    pub ip: String,

    /// Host public key file; without it a key pair is generated
    #[arg(long = "pub", value_name = "FILE")]
    pub pub_key: Option<PathBuf>,

    /// Write host.crt (and host.key) into this directory instead of printing
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,
}

// ============================================================================
// Network command
// ============================================================================

#[derive(Args, Debug)]
pub struct NetworkArgs {
    #[command(subcommand)]
    pub command: NetworkCommands,
}

#[derive(Subcommand, Debug)]
pub enum NetworkCommands {
    /// Replace every network with the list in FILE (JSON or YAML)
    Replace {
        /// Networks document
        file: PathBuf,
    },

    /// List networks and their hosts
    Show,
}

// ============================================================================
// Config command
// ============================================================================

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Configuration for a lighthouse
    Lighthouse,

    /// Configuration for a regular host
    Host(HostConfigArgs),

    /// Print the settings file path in use
    Path,
}

#[derive(Args, Debug)]
pub struct HostConfigArgs {
    /// Network the host belongs to
    #[arg(long, requires = "host", conflicts_with = "params")]
    pub network: Option<String>,

    /// Host name within the network
    #[arg(long, requires = "network")]
    pub host: Option<String>,

    /// Explicit parameters (JSON or YAML) instead of the stored topology
    #[arg(long, value_name = "FILE", required_unless_present = "network")]
    pub params: Option<PathBuf>,
}
