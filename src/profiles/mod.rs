mod view;

use std::collections::BTreeSet;

use axum::{Router, routing::get};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{AppResult, AppState, db::Profile};

pub fn router() -> Router<AppState> {
    Router::new().route("/{user_id}", get(view::profile))
}

/// Read-only view over the externally managed profile store.
pub async fn fetch_user(db_pool: &SqlitePool, id: Uuid) -> AppResult<Option<Profile>> {
    let row: Option<(String, String)> = sqlx::query_as("SELECT name,bio FROM users WHERE id=?")
        .bind(id.to_string())
        .fetch_optional(db_pool)
        .await?;
    let Some((name, bio)) = row else {
        return Ok(None);
    };
    Ok(Some(Profile {
        id,
        name,
        bio,
        tags: fetch_tags(db_pool, id).await?,
    }))
}

pub async fn fetch_all(db_pool: &SqlitePool) -> AppResult<Vec<Profile>> {
    let rows: Vec<(String, String, String)> = sqlx::query_as("SELECT id,name,bio FROM users")
        .fetch_all(db_pool)
        .await?;
    let mut users = Vec::with_capacity(rows.len());
    for (id, name, bio) in rows {
        let id = Uuid::parse_str(&id)?;
        users.push(Profile {
            id,
            name,
            bio,
            tags: fetch_tags(db_pool, id).await?,
        });
    }
    Ok(users)
}

async fn fetch_tags(db_pool: &SqlitePool, id: Uuid) -> AppResult<BTreeSet<String>> {
    let tags: Vec<(String,)> = sqlx::query_as("SELECT tag FROM user_tags WHERE user_id=?")
        .bind(id.to_string())
        .fetch_all(db_pool)
        .await?;
    Ok(tags.into_iter().map(|(tag,)| tag).collect())
}
