//! Backend entry-point: loads settings, connects adapters and serves the API.

mod server;

use std::sync::Arc;

use actix_web::web;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use card_tracker::domain::SystemTag;
use card_tracker::inbound::http::health::HealthState;
use card_tracker::inbound::http::session_config::{BuildMode, session_settings};
use card_tracker::outbound::auth::ApiTokenAuthBridge;
use card_tracker::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use card_tracker::outbound::redis::RedisPool;
use card_tracker::settings::AppSettings;
use ortho_config::OrthoConfig as _;
use server::{ServerConfig, create_server};

fn io_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(format!("{context}: {err}"))
}

async fn server_config(settings: &AppSettings) -> std::io::Result<ServerConfig> {
    let session = session_settings(settings, BuildMode::from_debug_assertions())
        .map_err(|err| io_error("invalid session configuration", err))?;
    info!(
        key_id = %session.key_id(),
        "session signing key loaded"
    );
    let bind_addr = settings
        .bind_addr()
        .map_err(|err| io_error("invalid settings", err))?;
    let source =
        SystemTag::new(settings.system_tag()).map_err(|err| io_error("invalid system tag", err))?;

    let tokens = match &settings.api_token_file {
        Some(path) => ApiTokenAuthBridge::from_file(path)
            .map_err(|err| io_error("failed to load API tokens", err))?,
        None => {
            warn!("no API token file configured; sign-in is disabled");
            ApiTokenAuthBridge::new()
        }
    };

    let mut config = ServerConfig::new(
        session.key,
        session.cookie_secure,
        session.same_site,
        bind_addr,
        source,
    )
    .with_tokens(Arc::new(tokens))
    .with_cache(settings.cache_namespace(), settings.cache_ttl());

    if let Some(url) = settings.database_url.as_deref() {
        let applied = run_pending_migrations(url)
            .await
            .map_err(|err| io_error("migrations failed", err))?;
        info!(applied, "database migrations applied");
        let pool = DbPool::new(PoolConfig::new(url).with_max_size(settings.db_max_connections()))
            .await
            .map_err(|err| io_error("database unavailable", err))?;
        config = config.with_db_pool(pool);
    }
    if let Some(url) = settings.redis_url.as_deref() {
        let pool = RedisPool::connect(url, settings.redis_max_connections())
            .await
            .map_err(|err| io_error("redis unavailable", err))?;
        config = config.with_redis_pool(pool);
    }
    Ok(config)
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load_from_iter(std::env::args_os())
        .map_err(|err| io_error("failed to load settings", err))?;
    let config = server_config(&settings).await?;
    info!(bind_addr = %config.bind_addr(), "starting server");

    let health_state = web::Data::new(HealthState::new());
    create_server(health_state, config)?.await
}
