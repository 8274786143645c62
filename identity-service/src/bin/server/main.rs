use std::sync::Arc;

use auth::Authenticator;
use identity_service::config::Config;
use identity_service::domain::credential::ports::AuthServicePort;
use identity_service::domain::credential::service::AuthService;
use identity_service::inbound::http::router::create_router;
use identity_service::outbound::repositories::InMemoryCredentialStore;
use identity_service::outbound::repositories::PostgresCredentialStore;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "identity_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "identity-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    // Fails on an empty secret or unusable hashing costs before anything binds.
    let config = Config::load().inspect_err(|e| {
        tracing::error!(error = %e, "Invalid configuration, refusing to start");
    })?;

    tracing::info!(
        http_port = config.server.http_port,
        token_validity_hours = config.jwt.expiration_hours,
        password_memory_kib = config.password.memory_kib,
        password_iterations = config.password.iterations,
        credential_store = if config.database.is_some() { "postgresql" } else { "memory" },
        "Configuration loaded"
    );

    let authenticator = Arc::new(
        Authenticator::new(config.jwt.secret.as_bytes(), config.token_validity()?)?
            .with_hashing_params(config.hashing_params())?,
    );

    let auth_service: Arc<dyn AuthServicePort> = match &config.database {
        Some(database) => {
            let pg_pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(&database.url)
                .await?;
            tracing::info!(
                max_connections = 5,
                database = "postgresql",
                "Database connection pool created"
            );

            sqlx::migrate!("./migrations").run(&pg_pool).await?;
            tracing::info!(database = "postgresql", "Database migrations completed");

            let store = Arc::new(PostgresCredentialStore::new(pg_pool));
            Arc::new(AuthService::new(store, authenticator))
        }
        None => {
            tracing::warn!("No database configured, credentials are kept in memory");
            let store = Arc::new(InMemoryCredentialStore::new());
            Arc::new(AuthService::new(store, authenticator))
        }
    };

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(auth_service);
    axum::serve(http_listener, http_application).await?;

    tracing::info!("Server exited successfully");

    Ok(())
}
