mod like;
mod matches;

use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

pub use like::{LikeOutcome, record_like};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/like", post(like::like_user))
        .route("/matches", get(matches::get_matches))
}
