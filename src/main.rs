use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cache;
mod config;
mod docs;
mod error;
mod routes;
mod utils;
mod weather;

use cache::{CacheService, RedisStore};
use config::Config;
use routes::{create_router, AppState};
use weather::{client::WeatherApiClient, service::WeatherService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weather_cache_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Fails fast when the upstream API is not configured
    let config = Config::from_env()?;

    tracing::info!("Connecting to Redis");
    let store = Arc::new(RedisStore::connect(&config.redis_url).await?);
    let cache = CacheService::new(store.clone(), config.redis_ttl_seconds);

    let weather_client = WeatherApiClient::new(&config)?;
    let weather = Arc::new(WeatherService::new(cache.clone(), weather_client));

    let state = AppState { cache, weather };

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/api-docs", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if cache::release(store) {
        tracing::info!("Redis disconnected");
    } else {
        tracing::warn!("Redis connection still referenced at shutdown; it closes on exit");
    }
    tracing::info!("Server closed.");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("SIGINT received. Shutting down..."),
        _ = terminate => tracing::info!("SIGTERM received. Shutting down..."),
    }
}
