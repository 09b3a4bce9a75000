//! `meshca ca` - Certificate Authority management.

use anyhow::Result;
use colored::Colorize;
use meshca_core::CaSummary;

use super::Context;
use crate::cli::args::{CaArgs, CaCommands};
use crate::output::OutputFormat;

pub async fn execute(ctx: Context, args: CaArgs) -> Result<()> {
    match args.command {
        CaCommands::Create { name } => create_ca(ctx, &name).await,
        CaCommands::Show => show_ca(ctx).await,
    }
}

async fn create_ca(ctx: Context, name: &str) -> Result<()> {
    let mesh = ctx.controller().await?;
    let replacing = mesh.is_established().await;

    let crt = mesh.create_ca(name).await?;
    let ca = CaSummary {
        name: name.trim().to_string(),
        crt,
    };

    if replacing && ctx.output_format == OutputFormat::Pretty {
        eprintln!(
            "{} The previous CA was replaced. Hosts signed by it must be re-issued.",
            "Warning:".yellow().bold()
        );
    }
    print_ca(&ctx, &ca)?;
    if ctx.output_format == OutputFormat::Pretty {
        eprintln!("{} CA {} created.", "Success:".green().bold(), ca.name.cyan());
    }
    Ok(())
}

async fn show_ca(ctx: Context) -> Result<()> {
    let mesh = ctx.controller().await?;
    let Some(ca) = mesh.summary().await.ca else {
        anyhow::bail!(
            "No CA has been created yet.\n\n\
             Create one with:\n  \
             meshca ca create <NAME>"
        );
    };
    print_ca(&ctx, &ca)
}

fn print_ca(ctx: &Context, ca: &CaSummary) -> Result<()> {
    match ctx.output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(ca)?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(ca)?);
        }
        OutputFormat::Pretty => {
            println!("{} {}", "CA:".bold(), ca.name.cyan().bold());
            println!();
            println!("{}", ca.crt.trim_end());
        }
    }
    Ok(())
}
