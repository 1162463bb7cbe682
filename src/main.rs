use anyhow::Context;
use sqlx::sqlite::SqlitePoolOptions;
use stackmatch::{AppState, auth, db, rooms};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let db_pool = SqlitePoolOptions::new()
        .max_connections(16)
        .connect(&dotenv::var("DATABASE_URL").context("DATABASE_URL is not set")?)
        .await?;
    db::init(&db_pool).await?;

    let verifier =
        auth::Verifier::from_secret(&dotenv::var("JWT_SECRET").context("JWT_SECRET is not set")?);
    let app = stackmatch::app(AppState {
        db_pool,
        verifier,
        rooms: rooms::Registry::default(),
    });

    let addr = dotenv::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_owned());
    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
