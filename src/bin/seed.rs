//! Loads a handful of demo users so the discover/like/chat flow has
//! something to work with. Safe to run twice; existing names are
//! skipped.

use anyhow::Context;
use sqlx::sqlite::SqlitePoolOptions;
use stackmatch::db;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const USERS: &[(&str, &str, &[&str])] = &[
    (
        "Riya",
        "backend person, will judge your database schema",
        &["TypeScript", "Node.js", "PostgreSQL", "Docker"],
    ),
    (
        "Marcus",
        "systems programmer, allergic to garbage collection",
        &["Rust", "Go", "SQLite", "Docker"],
    ),
    (
        "Elif",
        "frontend, yes the div is centered",
        &["TypeScript", "React", "Vue.js"],
    ),
    (
        "Jonas",
        "data wrangler",
        &["Python", "Pandas", "NumPy", "PostgreSQL"],
    ),
    (
        "Priya",
        "mobile + a little of everything",
        &["Kotlin", "Swift", "React Native"],
    ),
    (
        "Tomás",
        "infra, dreams in YAML",
        &["Go", "Kubernetes", "Terraform", "Docker"],
    ),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let db_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&dotenv::var("DATABASE_URL").context("DATABASE_URL is not set")?)
        .await?;
    db::init(&db_pool).await?;

    for &(name, bio, tags) in USERS {
        let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE name=?")
            .bind(name)
            .fetch_optional(&db_pool)
            .await?;
        if existing.is_some() {
            tracing::info!(%name, "already seeded");
            continue;
        }

        let id = Uuid::now_v7();
        sqlx::query("INSERT INTO users (id,name,bio,created_at) VALUES (?,?,?,?)")
            .bind(id.to_string())
            .bind(name)
            .bind(bio)
            .bind(db::now_millis())
            .execute(&db_pool)
            .await?;
        for &tag in tags {
            sqlx::query("INSERT INTO user_tags (user_id,tag) VALUES (?,?)")
                .bind(id.to_string())
                .bind(tag)
                .execute(&db_pool)
                .await?;
        }
        tracing::info!(%id, %name, "seeded user");
    }
    Ok(())
}
