use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use nearbite_api::{
    api::{create_router, AppState},
    config::{Config, DataSource},
    db,
    services::{
        providers::{InMemoryProvider, PgProvider},
        Providers,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("nearbite_api=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let scoring = config.scoring()?;

    let providers = match config.data_source {
        DataSource::Postgres => {
            let pool = db::create_pool(&config.database_url, config.db_max_connections).await?;
            if config.run_migrations {
                db::run_migrations(&pool).await?;
            }
            tracing::info!("Using PostgreSQL data source");
            Providers::from_shared(PgProvider::new(pool))
        }
        DataSource::Memory => {
            tracing::warn!("Using empty in-memory data source");
            Providers::from_shared(InMemoryProvider::new())
        }
    };

    let app = create_router(AppState::new(providers, scoring));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {}", address))?;
    tracing::info!("Server running on http://{}", address);

    axum::serve(listener, app).await?;
    Ok(())
}
