//! Service entry-point: loads settings, wires dependencies and runs the
//! listeners and ingestion loop until shutdown.

use color_eyre::eyre::{Context, Result, eyre};
use ortho_config::OrthoConfig;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use auth_backend::server::{ServiceGraph, ServiceSettings, shutdown_signal};

#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings =
        ServiceSettings::load().map_err(|err| eyre!("failed to load configuration: {err}"))?;
    let graph = ServiceGraph::connect(&settings)
        .await
        .wrap_err("failed to initialise dependencies")?;
    let coordinator = graph
        .into_coordinator(&settings)
        .wrap_err("failed to start listeners")?;

    coordinator
        .run(CancellationToken::new(), shutdown_signal())
        .await
        .wrap_err("service stopped with an error")?;
    info!("shutdown complete");
    Ok(())
}
