use docsift_core::Config;
use docsift_infra::{init_telemetry, LogFormat};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    init_telemetry(LogFormat::from_env(), "docsift-api", config.environment())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    // Storage is resolved here, so misconfiguration stops the process before it binds
    let (_state, router) = docsift_api::setup::initialize_app(config.clone()).await?;

    docsift_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
