use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{debug, info};
use tracing_appender::rolling;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, layer::SubscriberExt};

use yolink_bridge::config::{Config, LoggingConfig};
use yolink_bridge::http::{self, AppState};
use yolink_bridge::live::{SessionRegistry, broadcaster};
use yolink_bridge::telemetry::{DeviceStateCache, TelemetrySubscriber, UpdateFeed};
use yolink_bridge::yolink_api::YoLinkClient;

const CONFIG_PATH: &str = "config.toml";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn init_logging(config: &LoggingConfig) {
    // Console pretty logger, RUST_LOG wins over the configured level
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.console_level));
    let mut layers: Vec<BoxedLayer> = vec![fmt::layer().pretty().with_filter(console_filter).boxed()];

    // One file per level
    if let Some(log_dir) = &config.directory {
        let debug_file = rolling::daily(log_dir, &config.debug_file);
        let info_file = rolling::daily(log_dir, &config.info_file);
        let warn_file = rolling::daily(log_dir, &config.warn_file);
        let error_file = rolling::daily(log_dir, &config.error_file);

        layers.push(
            fmt::layer()
                .with_writer(debug_file)
                .with_ansi(false)
                .with_filter(EnvFilter::new("debug"))
                .boxed(),
        );
        layers.push(
            fmt::layer()
                .with_writer(info_file)
                .with_ansi(false)
                .with_filter(tracing_subscriber::filter::LevelFilter::INFO)
                .boxed(),
        );
        layers.push(
            fmt::layer()
                .with_writer(warn_file)
                .with_ansi(false)
                .with_filter(tracing_subscriber::filter::LevelFilter::WARN)
                .boxed(),
        );
        layers.push(
            fmt::layer()
                .with_writer(error_file)
                .with_ansi(false)
                .with_filter(tracing_subscriber::filter::LevelFilter::ERROR)
                .boxed(),
        );
    }

    tracing_subscriber::registry().with(layers).init();
}

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    let config = Config::load(CONFIG_PATH)?;
    init_logging(&config.logging);
    debug!("Loaded configuration: {:?}", config);

    let api = Arc::new(YoLinkClient::new(
        &config.yolink,
        Duration::from_secs(config.intervals.request_timeout_seconds),
    )?);
    let states = DeviceStateCache::new();
    let (feed, updates) = UpdateFeed::channel(config.limits.update_feed_size);
    let registry = SessionRegistry::new(config.limits.session_queue_size);

    tokio::spawn(broadcaster::run(updates, registry.clone()));

    // The subscriber retries its own startup, the HTTP side does not wait for it
    let subscriber = TelemetrySubscriber::new(&config, states.clone(), feed);
    tokio::spawn(subscriber.run(api.clone()));

    let app = http::router(
        AppState {
            api,
            states,
            registry,
        },
        Some(&config.server.static_dir),
    );

    let listener = TcpListener::bind(("0.0.0.0", config.server.port)).await?;
    info!("Server starting on port {}...", config.server.port);
    axum::serve(listener, app).await?;
    Ok(())
}
