use axum::http::{HeaderValue, StatusCode, header::AUTHORIZATION};
use axum_test::TestServer;
use jsonwebtoken::{EncodingKey, Header};
use serde_json::{Value, json};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use stackmatch::{
    AppState,
    auth::{Claims, Verifier},
    db,
    rooms::{Registry, msg},
};
use uuid::Uuid;

const SECRET: &str = "integration-secret";

async fn server() -> (TestServer, SqlitePool, Registry) {
    let db_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    db::init(&db_pool).await.unwrap();
    let rooms = Registry::default();
    let state = AppState {
        db_pool: db_pool.clone(),
        verifier: Verifier::from_secret(SECRET),
        rooms: rooms.clone(),
    };
    let server = TestServer::new(stackmatch::app(state)).unwrap();
    (server, db_pool, rooms)
}

fn bearer(user_id: Uuid) -> HeaderValue {
    let exp = (time::OffsetDateTime::now_utc().unix_timestamp() + 3600) as usize;
    let token = jsonwebtoken::encode(
        &Header::default(),
        &Claims {
            sub: user_id.to_string(),
            exp,
        },
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();
    HeaderValue::from_str(&format!("Bearer {token}")).unwrap()
}

async fn add_user(db_pool: &SqlitePool, name: &str, tags: &[&str]) -> Uuid {
    let id = Uuid::now_v7();
    sqlx::query("INSERT INTO users (id,name,bio,created_at) VALUES (?,?,?,?)")
        .bind(id.to_string())
        .bind(name)
        .bind("")
        .bind(db::now_millis())
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

#[tokio::test]
async fn requests_without_a_credential_are_rejected() {
    let (server, _db_pool, _rooms) = server().await;

    let response = server.get("/discover").await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = server
        .get("/discover")
        .add_header(AUTHORIZATION, HeaderValue::from_static("Bearer not-a-token"))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn mutual_likes_form_a_match_exactly_once() {
    let (server, db_pool, _rooms) = server().await;
    let a = add_user(&db_pool, "a", &[]).await;
    let b = add_user(&db_pool, "b", &[]).await;

    let response = server
        .post("/swipes/like")
        .add_header(AUTHORIZATION, bearer(a))
        .json(&json!({ "likedUserId": b }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["isMatch"], false);
    assert!(body["match"].is_null());

    let response = server
        .post("/swipes/like")
        .add_header(AUTHORIZATION, bearer(b))
        .json(&json!({ "likedUserId": a }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["isMatch"], true);
    assert_eq!(body["match"]["userLowId"], a.min(b).to_string());
    assert_eq!(body["match"]["userHighId"], a.max(b).to_string());

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM matches")
        .fetch_one(&db_pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn bad_likes_map_to_the_right_statuses() {
    let (server, db_pool, _rooms) = server().await;
    let a = add_user(&db_pool, "a", &[]).await;
    let b = add_user(&db_pool, "b", &[]).await;

    // self
    let response = server
        .post("/swipes/like")
        .add_header(AUTHORIZATION, bearer(a))
        .json(&json!({ "likedUserId": a }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    // unknown target
    let response = server
        .post("/swipes/like")
        .add_header(AUTHORIZATION, bearer(a))
        .json(&json!({ "likedUserId": Uuid::now_v7() }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    // duplicate
    server
        .post("/swipes/like")
        .add_header(AUTHORIZATION, bearer(a))
        .json(&json!({ "likedUserId": b }))
        .await
        .assert_status_ok();
    let response = server
        .post("/swipes/like")
        .add_header(AUTHORIZATION, bearer(a))
        .json(&json!({ "likedUserId": b }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn matches_listing_shows_the_other_participant() {
    let (server, db_pool, _rooms) = server().await;
    let a = add_user(&db_pool, "ada", &["Rust"]).await;
    let b = add_user(&db_pool, "brian", &["Go"]).await;
    stackmatch::swipes::record_like(&db_pool, a, b).await.unwrap();
    stackmatch::swipes::record_like(&db_pool, b, a).await.unwrap();

    let response = server
        .get("/swipes/matches")
        .add_header(AUTHORIZATION, bearer(a))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["user"]["name"], "brian");

    let response = server
        .get("/swipes/matches")
        .add_header(AUTHORIZATION, bearer(b))
        .await;
    let body: Value = response.json();
    assert_eq!(body[0]["user"]["name"], "ada");
}

#[tokio::test]
async fn discover_ranks_by_overlap_and_hides_liked_matched_and_self() {
    let (server, db_pool, _rooms) = server().await;
    let me = add_user(&db_pool, "me", &["ts", "react"]).await;
    let twin = add_user(&db_pool, "twin", &["ts", "react"]).await;
    let near = add_user(&db_pool, "near", &["ts", "go"]).await;
    let far = add_user(&db_pool, "far", &["cobol"]).await;
    let liked = add_user(&db_pool, "liked", &["ts", "react"]).await;
    stackmatch::swipes::record_like(&db_pool, me, liked).await.unwrap();

    let response = server
        .get("/discover")
        .add_header(AUTHORIZATION, bearer(me))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let feed = body.as_array().unwrap();

    assert_eq!(feed.len(), 3, "liked and self are hidden");
    assert_eq!(feed[0]["user"]["id"], twin.to_string());
    assert_eq!(feed[0]["score"], 1.0);
    assert_eq!(feed[1]["user"]["id"], near.to_string());
    assert_eq!(feed[2]["user"]["id"], far.to_string());
    assert_eq!(feed[2]["score"], 0.0);
}

#[tokio::test]
async fn chat_history_is_members_only_and_in_send_order() {
    let (server, db_pool, rooms) = server().await;
    let a = add_user(&db_pool, "a", &[]).await;
    let b = add_user(&db_pool, "b", &[]).await;
    let outsider = add_user(&db_pool, "c", &[]).await;
    stackmatch::swipes::record_like(&db_pool, a, b).await.unwrap();
    let outcome = stackmatch::swipes::record_like(&db_pool, b, a).await.unwrap();
    let match_id = outcome.matched.unwrap().id;

    msg::send_message(&db_pool, &rooms, match_id, a, "hi".to_owned())
        .await
        .unwrap();
    msg::send_message(&db_pool, &rooms, match_id, b, "hello".to_owned())
        .await
        .unwrap();
    msg::send_message(&db_pool, &rooms, match_id, a, "coffee?".to_owned())
        .await
        .unwrap();

    let response = server
        .get(&format!("/chat/{match_id}/messages"))
        .add_header(AUTHORIZATION, bearer(outsider))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let response = server
        .get(&format!("/chat/{match_id}/messages"))
        .add_header(AUTHORIZATION, bearer(b))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let contents: Vec<&str> = body["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, ["hi", "hello", "coffee?"]);
    assert_eq!(body["messages"][0]["sender"]["name"], "a");
}

#[tokio::test]
async fn chat_list_previews_the_latest_message() {
    let (server, db_pool, rooms) = server().await;
    let a = add_user(&db_pool, "a", &[]).await;
    let b = add_user(&db_pool, "b", &[]).await;
    stackmatch::swipes::record_like(&db_pool, a, b).await.unwrap();
    let outcome = stackmatch::swipes::record_like(&db_pool, b, a).await.unwrap();
    let match_id = outcome.matched.unwrap().id;

    msg::send_message(&db_pool, &rooms, match_id, a, "first".to_owned())
        .await
        .unwrap();
    msg::send_message(&db_pool, &rooms, match_id, b, "latest".to_owned())
        .await
        .unwrap();

    let response = server
        .get("/chat")
        .add_header(AUTHORIZATION, bearer(a))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["otherUser"]["name"], "b");
    assert_eq!(body[0]["lastMessage"]["content"], "latest");
}

#[tokio::test]
async fn profiles_are_readable_by_id() {
    let (server, db_pool, _rooms) = server().await;
    let a = add_user(&db_pool, "ada", &["Rust", "SQLite"]).await;
    let b = add_user(&db_pool, "brian", &[]).await;

    let response = server
        .get(&format!("/p/{a}"))
        .add_header(AUTHORIZATION, bearer(b))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["name"], "ada");
    assert_eq!(body["tags"], json!(["Rust", "SQLite"]));

    let response = server
        .get(&format!("/p/{}", Uuid::now_v7()))
        .add_header(AUTHORIZATION, bearer(b))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}
