use std::collections::BTreeSet;

use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Idempotent schema bootstrap, run at startup. The unique indexes on
/// likes and matches are what keep concurrent mutual likes from ever
/// producing a second row.
pub async fn init(db_pool: &SqlitePool) -> sqlx::Result<()> {
    for stmt in [
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            bio TEXT NOT NULL DEFAULT '',
            created_at INTEGER NOT NULL
        )",
        "CREATE TABLE IF NOT EXISTS user_tags (
            user_id TEXT NOT NULL,
            tag TEXT NOT NULL,
            PRIMARY KEY (user_id, tag)
        )",
        "CREATE TABLE IF NOT EXISTS likes (
            id TEXT PRIMARY KEY,
            liker_id TEXT NOT NULL,
            liked_id TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            UNIQUE (liker_id, liked_id)
        )",
        "CREATE TABLE IF NOT EXISTS matches (
            id TEXT PRIMARY KEY,
            user_low_id TEXT NOT NULL,
            user_high_id TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            UNIQUE (user_low_id, user_high_id)
        )",
        "CREATE TABLE IF NOT EXISTS messages (
            id TEXT PRIMARY KEY,
            match_id TEXT NOT NULL,
            sender_id TEXT NOT NULL,
            content TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS messages_by_match ON messages (match_id, created_at, id)",
    ] {
        sqlx::query(stmt).execute(db_pool).await?;
    }
    Ok(())
}

pub fn now_millis() -> i64 {
    (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub bio: String,
    pub tags: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: Uuid,
    pub liker_id: Uuid,
    pub liked_id: Uuid,
    pub created_at: i64,
    // unique: liker_id, liked_id
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: Uuid,
    pub user_low_id: Uuid,
    pub user_high_id: Uuid,
    pub created_at: i64,
    // unique: user_low_id, user_high_id; user_low_id < user_high_id
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub match_id: Uuid,
    pub sender: Sender,
    pub content: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Sender {
    pub id: Uuid,
    pub name: String,
}

#[cfg(test)]
pub(crate) mod testutil {
    use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
    use uuid::Uuid;

    // single connection, or every pooled connection gets its own
    // empty :memory: database
    pub(crate) async fn pool() -> SqlitePool {
        let db_pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        super::init(&db_pool).await.unwrap();
        db_pool
    }

    pub(crate) async fn add_user(db_pool: &SqlitePool, name: &str, tags: &[&str]) -> Uuid {
        let id = Uuid::now_v7();
        sqlx::query("INSERT INTO users (id,name,bio,created_at) VALUES (?,?,?,?)")
            .bind(id.to_string())
            .bind(name)
            .bind("")
            .bind(super::now_millis())
            .execute(db_pool)
            .await
            .unwrap();
        for &tag in tags {
            sqlx::query("INSERT INTO user_tags (user_id,tag) VALUES (?,?)")
                .bind(id.to_string())
                .bind(tag)
                .execute(db_pool)
                .await
                .unwrap();
        }
        id
    }
}
