//! meshca - Nebula mesh administration
//!
//! Creates the mesh CA, signs host certificates and renders node configs.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    meshca_cli::run().await
}
