//! `meshca config` - Render node configuration documents.

use anyhow::Result;
use meshca_core::node_config;
use meshca_core::HostConfigParams;

use super::Context;
use crate::cli::args::{ConfigArgs, ConfigCommands, HostConfigArgs};
use crate::output::{parse_document, render_document};

pub async fn execute(ctx: Context, args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Lighthouse => {
            print!("{}", render_document(ctx.output_format, &node_config::lighthouse_config())?);
            Ok(())
        }
        ConfigCommands::Host(args) => host_config(ctx, args).await,
        ConfigCommands::Path => {
            match &ctx.settings_path {
                Some(path) => println!("{}", path.display()),
                None => println!("(no settings file; using defaults)"),
            }
            Ok(())
        }
    }
}

async fn host_config(ctx: Context, args: HostConfigArgs) -> Result<()> {
    let config = if let Some(path) = &args.params {
        let params: HostConfigParams = parse_document(path)?;
        node_config::host_config(&params)
    } else {
        let (Some(network), Some(host)) = (&args.network, &args.host) else {
            anyhow::bail!("Either --params FILE or --network and --host is required");
        };
        ctx.controller().await?.host_config_for(network, host).await?
    };

    print!("{}", render_document(ctx.output_format, &config)?);
    Ok(())
}
