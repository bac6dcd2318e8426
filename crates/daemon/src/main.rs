use bridge_core::BridgeConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = BridgeConfig::from_env();
    if let Err(e) = bridge_daemon::run(config).await {
        tracing::error!(error = %e, "MQTT bridge exited with an error");
        std::process::exit(1);
    }
}
