//! `meshca network` - Replace and inspect the mesh topology.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use meshca_core::{HostRole, Network};
use tabled::{settings::Style, Table, Tabled};

use super::Context;
use crate::cli::args::{NetworkArgs, NetworkCommands};
use crate::output::{parse_document, OutputFormat};

#[derive(Tabled)]
struct HostRow {
    #[tabled(rename = "Network")]
    network: String,
    #[tabled(rename = "Host")]
    host: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Overlay IP")]
    ip: String,
    #[tabled(rename = "Relay")]
    relay: String,
    #[tabled(rename = "Public Endpoint")]
    endpoint: String,
}

pub async fn execute(ctx: Context, args: NetworkArgs) -> Result<()> {
    match args.command {
        NetworkCommands::Replace { file } => replace(ctx, &file).await,
        NetworkCommands::Show => show(ctx).await,
    }
}

async fn replace(ctx: Context, file: &Path) -> Result<()> {
    let networks: Vec<Network> = parse_document(file)?;
    let (count, hosts) = (networks.len(), networks.iter().map(|n| n.hosts.len()).sum::<usize>());

    let mesh = ctx.controller().await?;
    mesh.replace_networks(networks).await?;

    match ctx.output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&mesh.networks().await)?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(&mesh.networks().await)?);
        }
        OutputFormat::Pretty => {
            println!(
                "{} Topology replaced: {} network(s), {} host(s).",
                "Success:".green().bold(),
                count,
                hosts
            );
        }
    }
    Ok(())
}

async fn show(ctx: Context) -> Result<()> {
    let networks = ctx.controller().await?.networks().await;

    match ctx.output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&networks)?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(&networks)?);
        }
        OutputFormat::Pretty => print_networks(&networks),
    }
    Ok(())
}

pub(crate) fn print_networks(networks: &[Network]) {
    if networks.is_empty() {
        println!("{}", "No networks defined.".dimmed());
        return;
    }

    for network in networks {
        let range = if network.ip_range.is_empty() {
            "-"
        } else {
            network.ip_range.as_str()
        };
        println!(
            "  {} {} ({} host(s))",
            network.name.cyan().bold(),
            range,
            network.hosts.len()
        );
    }
    println!();

    let rows: Vec<HostRow> = networks
        .iter()
        .flat_map(|network| {
            network.hosts.iter().map(|host| HostRow {
                network: network.name.clone(),
                host: host.name.clone(),
                role: role_label(host.role),
                ip: if host.ip.is_empty() {
                    "-".into()
                } else {
                    host.ip.clone()
                },
                relay: if host.is_relay() { "yes" } else { "no" }.to_string(),
                endpoint: host.public_endpoint().unwrap_or("-").to_string(),
            })
        })
        .collect();

    if !rows.is_empty() {
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }
}

fn role_label(role: HostRole) -> String {
    match role {
        HostRole::Lighthouse => "lighthouse".yellow().to_string(),
        HostRole::Relay => "relay".magenta().to_string(),
        HostRole::Regular => "host".to_string(),
    }
}
