mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use room_common::id::prefixed_ulid;

#[tokio::test]
async fn follow_toggles_on_and_off() {
    let Some((server, state)) = common::try_server().await else {
        return;
    };

    let follower_id = prefixed_ulid("usr");
    let followed_id = prefixed_ulid("usr");
    let follower_token = common::login(&server, &follower_id, "follower").await;
    common::login(&server, &followed_id, "followed").await;

    let on: serde_json::Value = server
        .put(&format!("/api/v1/users/{followed_id}/follow"))
        .add_header(AUTHORIZATION, format!("Bearer {follower_token}"))
        .await
        .json();
    assert_eq!(on["following"], true);
    assert_eq!(on["followers_count"], 1);

    let counts: serde_json::Value = server
        .get(&format!("/api/v1/users/{followed_id}/follows"))
        .await
        .json();
    assert_eq!(counts["followers_count"], 1);
    assert_eq!(counts["following_count"], 0);

    let off: serde_json::Value = server
        .put(&format!("/api/v1/users/{followed_id}/follow"))
        .add_header(AUTHORIZATION, format!("Bearer {follower_token}"))
        .await
        .json();
    assert_eq!(off["following"], false);
    assert_eq!(off["followers_count"], 0);

    common::cleanup_profile(&state.db, &follower_id).await;
    common::cleanup_profile(&state.db, &followed_id).await;
}

#[tokio::test]
async fn self_follow_is_rejected() {
    let Some((server, state)) = common::try_server().await else {
        return;
    };

    let user_id = prefixed_ulid("usr");
    let token = common::login(&server, &user_id, "narcissist").await;

    let resp = server
        .put(&format!("/api/v1/users/{user_id}/follow"))
        .add_header(AUTHORIZATION, format!("Bearer {token}"))
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        resp.json::<serde_json::Value>()["error"]["code"],
        "VALIDATION_ERROR"
    );

    common::cleanup_profile(&state.db, &user_id).await;
}

#[tokio::test]
async fn following_a_missing_user_is_not_found() {
    let Some((server, state)) = common::try_server().await else {
        return;
    };

    let user_id = prefixed_ulid("usr");
    let token = common::login(&server, &user_id, "lonely").await;

    server
        .put(&format!("/api/v1/users/{}/follow", prefixed_ulid("usr")))
        .add_header(AUTHORIZATION, format!("Bearer {token}"))
        .await
        .assert_status_not_found();

    common::cleanup_profile(&state.db, &user_id).await;
}
