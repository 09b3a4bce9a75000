//! `meshca show` - Public view of the mesh state.

use anyhow::Result;
use colored::Colorize;

use super::network::print_networks;
use super::Context;
use crate::output::OutputFormat;

pub async fn execute(ctx: Context) -> Result<()> {
    let summary = ctx.controller().await?.summary().await;

    match ctx.output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(&summary)?);
        }
        OutputFormat::Pretty => {
            println!("{}", "Mesh".bold().underline());
            println!();
            match &summary.ca {
                Some(ca) => println!("  {} {}", "CA:".bold(), ca.name.cyan()),
                None => println!("  {} {}", "CA:".bold(), "(not created)".dimmed()),
            }
            println!("  {} {}", "Data:".bold(), ctx.settings.data_path.display());
            println!();
            print_networks(&summary.networks);

            if summary.ca.is_none() {
                println!();
                println!("{}", "Tip: Create the CA first with 'meshca ca create <NAME>'".yellow());
            }
        }
    }
    Ok(())
}
