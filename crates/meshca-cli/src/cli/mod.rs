//! CLI argument parsing and command dispatch.

pub mod args;
pub mod commands;

use anyhow::Result;
use args::{Cli, Commands};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config;

/// Run the CLI application.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let settings = config::load(&cli)?;
    tracing::debug!(?settings, "settings resolved");

    let ctx = commands::Context {
        settings,
        settings_path: config::settings_path(&cli),
        output_format: cli.output,
    };

    match cli.command {
        Commands::Ca(args) => commands::ca::execute(ctx, args).await,
        Commands::Cert(args) => commands::cert::execute(ctx, args).await,
        Commands::Network(args) => commands::network::execute(ctx, args).await,
        Commands::Config(args) => commands::config::execute(ctx, args).await,
        Commands::Show => commands::show::execute(ctx).await,
    }
}

/// Logs go to stderr so documents on stdout stay machine-readable.
fn init_tracing(cli: &Cli) {
    let level = match cli.verbose {
        0 => cli.log_level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
