use anyhow::Result;
use api::{build_router, AppState};
use axum::http::HeaderValue;
use migration::{Migrator, MigratorTrait};
use shared::{get_db_connection, Config, Notifier};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const EVENT_BUFFER: usize = 256;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));
    if std::env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false) {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("🚀 Starting AlgoDesk API server...");

    let config = Config::from_env()?;
    let db = get_db_connection(&config.database_url).await?;
    info!("Connected to database");

    if config.run_migrations {
        Migrator::up(&db, None).await?;
        info!("Migrations applied");
    }

    let mut notifier = Notifier::new(EVENT_BUFFER);
    if let Some(redis_url) = &config.redis_url {
        notifier = notifier.with_redis(redis_url).await?;
        info!("Mirroring events to Redis");
    }

    let state = AppState::new(db, &config, notifier);

    match (&config.admin_email, &config.admin_password) {
        (Some(email), Some(password)) => {
            let admin = state.user_service.bootstrap_admin(email, password).await?;
            info!("👤 Admin account ready: {}", admin.email);
        }
        (Some(_), None) | (None, Some(_)) => {
            warn!("ADMIN_EMAIL and ADMIN_PASSWORD must both be set to bootstrap an admin");
        }
        (None, None) => {}
    }

    let cors = match &config.cors_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin.parse::<HeaderValue>()?)
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = build_router(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("API server listening on http://{}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
