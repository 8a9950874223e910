mod config;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, LoggingConfig};
use probe_llm::{ClientFactory, Prober};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config.logging);

    tracing::info!(
        provider = ?config.provider.kind,
        model = %config.request.model,
        effort = %config.request.reasoning_effort,
        "Starting reasoning probe"
    );

    let client = ClientFactory::create_client(config.provider_config()?)?;
    let request = config.probe_request();

    let mut prober = Prober::new(config.report.detail_limit, std::io::stdout());
    prober.run(client.as_ref(), &request).await?;

    Ok(())
}

/// Logs go to stderr; stdout carries the probe report.
fn init_logging(config: &LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}
