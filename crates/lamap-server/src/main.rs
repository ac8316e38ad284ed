mod api;
mod checkins;
mod middleware;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};
use crate::checkins::CheckinStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = lamap_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let zones = match &config.zones_path {
        Some(path) => lamap_core::load_zones(path)?,
        None => lamap_core::builtin_zones(),
    };
    tracing::info!(zones = zones.len(), env = %config.env, "loaded zone definitions");

    let overpass = lamap_osm::OverpassClient::with_base_url(
        config.overpass_timeout_secs,
        &config.http_user_agent,
        &config.overpass_base_url,
    )?
    .with_retry(config.http_max_retries, config.http_retry_backoff_base_ms)
    .with_cache_ttl(config.poi_cache_ttl_secs);

    let nominatim = lamap_osm::NominatimClient::with_base_url(
        config.nominatim_timeout_secs,
        &config.http_user_agent,
        &config.nominatim_base_url,
    )?
    .with_retry(config.http_max_retries, config.http_retry_backoff_base_ms);

    let app = build_app(AppState {
        zones: Arc::new(zones),
        overpass: Arc::new(overpass),
        nominatim: Arc::new(nominatim),
        checkins: CheckinStore::seeded(),
    });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "lamap server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
