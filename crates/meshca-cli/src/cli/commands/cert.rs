//! `meshca cert` - Host certificate issuance.

use std::io::Write;
use std::path::Path;

use anyhow::{Context as _, Result};
use colored::Colorize;
use meshca_core::issuer::{HOST_CERT_FILE, HOST_KEY_FILE};
use meshca_core::{HostCertificateRequest, HostCertificateResult};

use super::Context;
use crate::cli::args::{CertArgs, CertCommands, SignArgs};
use crate::output::OutputFormat;

pub async fn execute(ctx: Context, args: CertArgs) -> Result<()> {
    match args.command {
        CertCommands::Sign(args) => sign(ctx, args).await,
    }
}

async fn sign(ctx: Context, args: SignArgs) -> Result<()> {
    let mut request = HostCertificateRequest::new(&args.name, &args.ip);
    if let Some(path) = &args.pub_key {
        let key = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read public key {}", path.display()))?;
        request = request.with_public_key(key);
    }

    let mesh = ctx.controller().await?;
    let issued = mesh.sign_certificate(&request).await?;

    if let Some(dir) = &args.out_dir {
        write_outputs(dir, &issued)?;
        if ctx.output_format == OutputFormat::Pretty {
            eprintln!(
                "{} Certificate for {} written to {}.",
                "Success:".green().bold(),
                args.name.cyan(),
                dir.display()
            );
        }
        return Ok(());
    }

    match ctx.output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&issued)?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(&issued)?);
        }
        OutputFormat::Pretty => {
            println!("{}", issued.certificate.trim_end());
            if let Some(key) = &issued.private_key {
                println!("{}", key.expose().trim_end());
                eprintln!(
                    "{} The private key above is not stored anywhere. Keep it safe.",
                    "Note:".yellow().bold()
                );
            }
        }
    }
    Ok(())
}

fn write_outputs(dir: &Path, issued: &HostCertificateResult) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    write_file(&dir.join(HOST_CERT_FILE), &issued.certificate, 0o644)?;
    if let Some(key) = &issued.private_key {
        write_file(&dir.join(HOST_KEY_FILE), key.expose(), 0o600)?;
    }
    Ok(())
}

fn write_file(path: &Path, contents: &str, mode: u32) -> Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    let mut file = options
        .open(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
