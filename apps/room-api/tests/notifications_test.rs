mod common;

use axum::http::header::AUTHORIZATION;
use room_common::id::prefixed_ulid;

#[tokio::test]
async fn like_notifies_the_author_but_not_for_self_likes() {
    let Some((server, state)) = common::try_server().await else {
        return;
    };

    let author_id = prefixed_ulid("usr");
    let fan_id = prefixed_ulid("usr");
    let author_token = common::login(&server, &author_id, "notified").await;
    let fan_token = common::login(&server, &fan_id, "the-fan").await;

    let post: serde_json::Value = server
        .post("/api/v1/posts")
        .add_header(AUTHORIZATION, format!("Bearer {author_token}"))
        .json(&serde_json::json!({ "content": "like this" }))
        .await
        .json();
    let post_id = post["id"].as_str().unwrap();

    // Liking your own post is silent.
    server
        .put(&format!("/api/v1/posts/{post_id}/like"))
        .add_header(AUTHORIZATION, format!("Bearer {author_token}"))
        .await
        .assert_status_ok();

    // Someone else liking it lands in the inbox.
    server
        .put(&format!("/api/v1/posts/{post_id}/like"))
        .add_header(AUTHORIZATION, format!("Bearer {fan_token}"))
        .await
        .assert_status_ok();

    let inbox: serde_json::Value = server
        .get("/api/v1/notifications")
        .add_header(AUTHORIZATION, format!("Bearer {author_token}"))
        .await
        .json();
    let notifications = inbox["notifications"].as_array().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["type"], "like");
    assert_eq!(notifications[0]["actor_id"], fan_id);
    assert_eq!(notifications[0]["post_id"], post_id);
    assert_eq!(notifications[0]["is_read"], false);

    common::cleanup_profile(&state.db, &fan_id).await;
    common::cleanup_profile(&state.db, &author_id).await;
}

#[tokio::test]
async fn unread_count_and_read_all() {
    let Some((server, state)) = common::try_server().await else {
        return;
    };

    let author_id = prefixed_ulid("usr");
    let commenter_id = prefixed_ulid("usr");
    let author_token = common::login(&server, &author_id, "busy").await;
    let commenter_token = common::login(&server, &commenter_id, "chatty").await;

    let post: serde_json::Value = server
        .post("/api/v1/posts")
        .add_header(AUTHORIZATION, format!("Bearer {author_token}"))
        .json(&serde_json::json!({ "content": "comment away" }))
        .await
        .json();
    let post_id = post["id"].as_str().unwrap();

    for text in ["hi", "hello", "hey"] {
        server
            .post(&format!("/api/v1/posts/{post_id}/comments"))
            .add_header(AUTHORIZATION, format!("Bearer {commenter_token}"))
            .json(&serde_json::json!({ "content": text }))
            .await;
    }

    let count: serde_json::Value = server
        .get("/api/v1/notifications/unread-count")
        .add_header(AUTHORIZATION, format!("Bearer {author_token}"))
        .await
        .json();
    assert_eq!(count["unread_count"], 3);

    let marked: serde_json::Value = server
        .post("/api/v1/notifications/read-all")
        .add_header(AUTHORIZATION, format!("Bearer {author_token}"))
        .await
        .json();
    assert_eq!(marked["marked_read"], 3);

    let count: serde_json::Value = server
        .get("/api/v1/notifications/unread-count")
        .add_header(AUTHORIZATION, format!("Bearer {author_token}"))
        .await
        .json();
    assert_eq!(count["unread_count"], 0);

    common::cleanup_profile(&state.db, &commenter_id).await;
    common::cleanup_profile(&state.db, &author_id).await;
}

#[tokio::test]
async fn pagination_walks_the_inbox_newest_first() {
    let Some((server, state)) = common::try_server().await else {
        return;
    };

    let author_id = prefixed_ulid("usr");
    let fan_id = prefixed_ulid("usr");
    let author_token = common::login(&server, &author_id, "paged").await;
    let fan_token = common::login(&server, &fan_id, "pager").await;

    for i in 0..3 {
        let post: serde_json::Value = server
            .post("/api/v1/posts")
            .add_header(AUTHORIZATION, format!("Bearer {author_token}"))
            .json(&serde_json::json!({ "content": format!("post {i}") }))
            .await
            .json();
        server
            .put(&format!("/api/v1/posts/{}/like", post["id"].as_str().unwrap()))
            .add_header(AUTHORIZATION, format!("Bearer {fan_token}"))
            .await
            .assert_status_ok();
    }

    let first: serde_json::Value = server
        .get("/api/v1/notifications?limit=2")
        .add_header(AUTHORIZATION, format!("Bearer {author_token}"))
        .await
        .json();
    assert_eq!(first["notifications"].as_array().unwrap().len(), 2);
    assert_eq!(first["has_more"], true);

    let cursor = first["notifications"][1]["id"].as_str().unwrap();
    let second: serde_json::Value = server
        .get(&format!("/api/v1/notifications?limit=2&before={cursor}"))
        .add_header(AUTHORIZATION, format!("Bearer {author_token}"))
        .await
        .json();
    assert_eq!(second["notifications"].as_array().unwrap().len(), 1);
    assert_eq!(second["has_more"], false);

    common::cleanup_profile(&state.db, &fan_id).await;
    common::cleanup_profile(&state.db, &author_id).await;
}
