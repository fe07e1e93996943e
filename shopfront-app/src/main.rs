use shopfront_app::{demo, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shopfront_app=debug,shopfront_order=debug,shopfront_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = shopfront_store::Config::load()?;
    tracing::info!(
        "Starting storefront session (submission timeout {}s, lookup timeout {}s)",
        config.checkout.submission_timeout_secs,
        config.tracking.lookup_timeout_secs
    );

    let state = AppState::new(config);
    demo::run(&state).await
}
