mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use room_common::id::prefixed_ulid;

#[tokio::test]
async fn create_community_slugifies_and_enrolls_the_owner() {
    let Some((server, state)) = common::try_server().await else {
        return;
    };

    let owner_id = prefixed_ulid("usr");
    let token = common::login(&server, &owner_id, "founder").await;

    let suffix = prefixed_ulid("com");
    let resp = server
        .post("/api/v1/communities")
        .add_header(AUTHORIZATION, format!("Bearer {token}"))
        .json(&serde_json::json!({
            "name": format!("Night Owls {suffix}"),
            "description": "late study sessions"
        }))
        .await;

    resp.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = resp.json();
    let community_id = body["id"].as_str().unwrap().to_string();
    assert!(body["slug"]
        .as_str()
        .unwrap()
        .starts_with("night-owls-com-"));
    assert_eq!(body["owner_id"], owner_id);
    assert_eq!(body["member_count"], 1);
    assert_eq!(body["require_approval"], false);

    // Lookup by slug round-trips.
    let by_slug: serde_json::Value = server
        .get(&format!("/api/v1/communities/{}", body["slug"].as_str().unwrap()))
        .await
        .json();
    assert_eq!(by_slug["id"], community_id);

    common::cleanup_community(&state.db, &community_id).await;
    common::cleanup_profile(&state.db, &owner_id).await;
}

#[tokio::test]
async fn membership_toggles_and_owner_cannot_leave() {
    let Some((server, state)) = common::try_server().await else {
        return;
    };

    let owner_id = prefixed_ulid("usr");
    let member_id = prefixed_ulid("usr");
    let owner_token = common::login(&server, &owner_id, "club-owner").await;
    let member_token = common::login(&server, &member_id, "joiner").await;

    let community: serde_json::Value = server
        .post("/api/v1/communities")
        .add_header(AUTHORIZATION, format!("Bearer {owner_token}"))
        .json(&serde_json::json!({ "name": format!("Club {}", prefixed_ulid("com")) }))
        .await
        .json();
    let community_id = community["id"].as_str().unwrap().to_string();

    let joined: serde_json::Value = server
        .put(&format!("/api/v1/communities/{community_id}/membership"))
        .add_header(AUTHORIZATION, format!("Bearer {member_token}"))
        .await
        .json();
    assert_eq!(joined["member"], true);
    assert_eq!(joined["member_count"], 2);

    let left: serde_json::Value = server
        .put(&format!("/api/v1/communities/{community_id}/membership"))
        .add_header(AUTHORIZATION, format!("Bearer {member_token}"))
        .await
        .json();
    assert_eq!(left["member"], false);
    assert_eq!(left["member_count"], 1);

    server
        .put(&format!("/api/v1/communities/{community_id}/membership"))
        .add_header(AUTHORIZATION, format!("Bearer {owner_token}"))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    common::cleanup_community(&state.db, &community_id).await;
    common::cleanup_profile(&state.db, &member_id).await;
    common::cleanup_profile(&state.db, &owner_id).await;
}

#[tokio::test]
async fn posting_requires_membership_and_level() {
    let Some((server, state)) = common::try_server().await else {
        return;
    };

    let owner_id = prefixed_ulid("usr");
    let outsider_id = prefixed_ulid("usr");
    let owner_token = common::login(&server, &owner_id, "strict-owner").await;
    let outsider_token = common::login(&server, &outsider_id, "outsider").await;

    let community: serde_json::Value = server
        .post("/api/v1/communities")
        .add_header(AUTHORIZATION, format!("Bearer {owner_token}"))
        .json(&serde_json::json!({
            "name": format!("Strict {}", prefixed_ulid("com")),
            "min_level_to_post": 3
        }))
        .await
        .json();
    let community_id = community["id"].as_str().unwrap().to_string();

    // Not a member yet.
    server
        .post("/api/v1/posts")
        .add_header(AUTHORIZATION, format!("Bearer {outsider_token}"))
        .json(&serde_json::json!({ "content": "hi", "community_id": community_id }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    // Member, but below the level floor.
    server
        .put(&format!("/api/v1/communities/{community_id}/membership"))
        .add_header(AUTHORIZATION, format!("Bearer {outsider_token}"))
        .await
        .assert_status_ok();
    server
        .post("/api/v1/posts")
        .add_header(AUTHORIZATION, format!("Bearer {outsider_token}"))
        .json(&serde_json::json!({ "content": "hi", "community_id": community_id }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    common::cleanup_community(&state.db, &community_id).await;
    common::cleanup_profile(&state.db, &outsider_id).await;
    common::cleanup_profile(&state.db, &owner_id).await;
}
