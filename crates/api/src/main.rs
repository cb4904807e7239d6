use anyhow::Context;

use foodshed_api::config::{self, AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    foodshed_observability::init(config::log_format_from_env());

    let config = AppConfig::from_env();
    let services = foodshed_api::app::services::build_services(&config)
        .context("failed to open catalog")?;
    let app = foodshed_api::app::build_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
