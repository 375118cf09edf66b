use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vehicle_tracker::{server, AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let test_mode = std::env::var("TEST_MODE").map(|v| v == "1" || v == "true").unwrap_or(false);

    let config = if test_mode {
        tracing::info!("Running in TEST MODE - in-memory database");
        AppConfig::test_config()
    } else {
        AppConfig::load()?
    };

    tracing::info!(
        port = config.server.port,
        database = %config.database.url,
        send_buffer = config.hub.send_buffer,
        test_mode,
        "Vehicle tracker starting"
    );

    server::run(config).await
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "vehicle_tracker=info,tracker_hub=info,tracker_store=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}
