use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use freightdesk::{create_router, AppConfig, AppState, FreightError};

#[tokio::main]
async fn main() -> Result<(), FreightError> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "freightdesk=info,tower_http=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));

    let app_state = AppState::new(config).await?;
    let app = create_router(Arc::new(app_state))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| FreightError::Configuration(format!("cannot bind {}: {}", addr, e)))?;
    tracing::info!("freightdesk listening on {}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| FreightError::internal_error(e.to_string()))
}
