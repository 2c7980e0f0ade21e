//! Application Startup
//!
//! Application building and server initialization.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use redis::aio::ConnectionManager;
use sqlx::PgPool;
use tokio::net::TcpListener;

use crate::application::services::{AuthService, AuthServiceImpl};
use crate::config::Settings;
use crate::infrastructure::cache::{self, keys, RedisCache, SettingsCache};
use crate::infrastructure::database;
use crate::infrastructure::repositories::{PgSessionRepository, PgUserRepository};
use crate::presentation::http::{handlers::health, routes};
use crate::shared::snowflake::SnowflakeGenerator;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// `None` when `REDIS_URL` is not configured
    pub redis: Option<ConnectionManager>,
    pub snowflake: Arc<SnowflakeGenerator>,
    pub settings: Arc<Settings>,
    pub settings_cache: SettingsCache,
}

impl AppState {
    /// Assemble state from already-opened connections.
    pub fn new(db: PgPool, redis: Option<ConnectionManager>, settings: Settings) -> Self {
        let snowflake = Arc::new(SnowflakeGenerator::with_epoch(
            settings.snowflake.machine_id as u64,
            0,
            settings.snowflake.epoch,
        ));
        let settings_cache = match &redis {
            Some(conn) => SettingsCache::new(
                Some(RedisCache::with_prefix(conn.clone(), keys::NAMESPACE)),
                settings.redis.settings_cache_ttl_secs,
            ),
            None => SettingsCache::disabled(),
        };

        Self {
            db,
            redis,
            snowflake,
            settings: Arc::new(settings),
            settings_cache,
        }
    }
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        health::init_server_start();

        let db = database::create_pool(&settings.database)
            .await
            .context("failed to connect to PostgreSQL")?;

        if settings.database.run_migrations {
            database::run_migrations(&db)
                .await
                .context("failed to run database migrations")?;
            tracing::info!("Database migrations applied");
        }

        let redis = connect_redis(&settings).await;
        let addr: SocketAddr = settings
            .server_addr()
            .parse()
            .with_context(|| format!("invalid server address {}", settings.server_addr()))?;

        let state = AppState::new(db, redis, settings);
        bootstrap_admin(&state).await?;

        let router = routes::create_router(state);

        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Listening on {}", addr);

        Ok(Self { listener, router })
    }

    /// Run the server until Ctrl+C or SIGTERM
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

/// Redis is optional; a failed connection is logged and the server runs without it.
async fn connect_redis(settings: &Settings) -> Option<ConnectionManager> {
    let url = settings.redis.url.as_deref().filter(|u| !u.is_empty())?;
    match cache::create_redis_client(url).await {
        Ok(conn) => Some(conn),
        Err(e) => {
            tracing::warn!(error = %e, "Redis unavailable, caching and rate limiting disabled");
            None
        }
    }
}

async fn bootstrap_admin(state: &AppState) -> Result<()> {
    let (Some(email), Some(password)) = (
        state.settings.admin.email.as_deref(),
        state.settings.admin.password.as_deref(),
    ) else {
        return Ok(());
    };

    let auth = AuthServiceImpl::new(
        Arc::new(PgUserRepository::new(state.db.clone())),
        Arc::new(PgSessionRepository::new(state.db.clone())),
        state.snowflake.clone(),
        state.settings.jwt.clone(),
    );
    let admin = auth
        .ensure_admin(email, password)
        .await
        .map_err(|e| anyhow::anyhow!("admin bootstrap failed: {}", e))?;
    tracing::info!(user_id = admin.id, "Admin account ready");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
