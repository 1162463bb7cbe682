use axum::{
    Json, debug_handler,
    extract::{Path, State},
};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{AppError, AppResult, auth::AuthUser, db::Profile};

#[debug_handler(state = crate::AppState)]
pub(crate) async fn profile(
    State(db_pool): State<SqlitePool>,
    AuthUser(_viewer): AuthUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Profile>> {
    match super::fetch_user(&db_pool, user_id).await? {
        Some(profile) => Ok(Json(profile)),
        None => Err(AppError::NotFound("user not found")),
    }
}
