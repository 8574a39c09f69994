mod common;

use axum::http::header::AUTHORIZATION;
use room_common::id::prefixed_ulid;

// ---------------------------------------------------------------------------
// POST /api/v1/auth/login
// ---------------------------------------------------------------------------

#[tokio::test]
async fn login_with_valid_identity_token_returns_tokens_and_profile() {
    let Some((server, state)) = common::try_server().await else {
        return;
    };

    let user_id = prefixed_ulid("usr");
    let token = common::mint_identity_token(&user_id, "alice", Some("vi"));

    let resp = server
        .post("/api/v1/auth/login")
        .json(&serde_json::json!({ "identity_token": token }))
        .await;

    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();

    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 3600);
    assert!(body["access_token"].as_str().unwrap().starts_with("rat_"));
    assert!(body["refresh_token"].as_str().unwrap().starts_with("rrt_"));
    assert!(body["ws_ticket"].as_str().unwrap().starts_with("wst_"));

    // Fresh profile starts at the bottom of the ladder, with the provider's
    // locale hint honored.
    assert_eq!(body["profile"]["id"], user_id);
    assert_eq!(body["profile"]["level"], 1);
    assert_eq!(body["profile"]["xp"], 0);
    assert_eq!(body["profile"]["language"], "vi");

    common::cleanup_profile(&state.db, &user_id).await;
}

#[tokio::test]
async fn login_with_garbage_token_is_unauthorized() {
    let Some((server, _state)) = common::try_server().await else {
        return;
    };

    let resp = server
        .post("/api/v1/auth/login")
        .json(&serde_json::json!({ "identity_token": "not-a-jwt" }))
        .await;

    resp.assert_status_unauthorized();
    assert_eq!(resp.json::<serde_json::Value>()["error"]["code"], "UNAUTHORIZED");
}

// ---------------------------------------------------------------------------
// POST /api/v1/auth/refresh
// ---------------------------------------------------------------------------

#[tokio::test]
async fn refresh_token_is_single_use() {
    let Some((server, state)) = common::try_server().await else {
        return;
    };

    let user_id = prefixed_ulid("usr");
    let token = common::mint_identity_token(&user_id, "bob", None);
    let login: serde_json::Value = server
        .post("/api/v1/auth/login")
        .json(&serde_json::json!({ "identity_token": token }))
        .await
        .json();
    let refresh_token = login["refresh_token"].as_str().unwrap();

    let first = server
        .post("/api/v1/auth/refresh")
        .json(&serde_json::json!({ "refresh_token": refresh_token }))
        .await;
    first.assert_status_ok();
    let rotated: serde_json::Value = first.json();
    assert_ne!(rotated["refresh_token"].as_str().unwrap(), refresh_token);

    // Replaying the consumed token fails.
    let second = server
        .post("/api/v1/auth/refresh")
        .json(&serde_json::json!({ "refresh_token": refresh_token }))
        .await;
    second.assert_status_unauthorized();

    common::cleanup_profile(&state.db, &user_id).await;
}

// ---------------------------------------------------------------------------
// Bearer auth
// ---------------------------------------------------------------------------

#[tokio::test]
async fn protected_route_rejects_missing_and_bogus_tokens() {
    let Some((server, _state)) = common::try_server().await else {
        return;
    };

    let resp = server.get("/api/v1/users/@me").await;
    resp.assert_status_unauthorized();

    let resp = server
        .get("/api/v1/users/@me")
        .add_header(AUTHORIZATION, "Bearer rat_bogus".to_string())
        .await;
    resp.assert_status_unauthorized();
}
