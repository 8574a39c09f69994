mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use room_common::id::prefixed_ulid;

/// Create a community that routes posts through the approval queue and a
/// pending post inside it. Returns (community_id, post_id).
async fn pending_post(
    server: &axum_test::TestServer,
    owner_token: &str,
) -> (String, String) {
    let community: serde_json::Value = server
        .post("/api/v1/communities")
        .add_header(AUTHORIZATION, format!("Bearer {owner_token}"))
        .json(&serde_json::json!({
            "name": format!("Moderated {}", prefixed_ulid("com")),
            "require_approval": true
        }))
        .await
        .json();
    let community_id = community["id"].as_str().unwrap().to_string();

    let post: serde_json::Value = server
        .post("/api/v1/posts")
        .add_header(AUTHORIZATION, format!("Bearer {owner_token}"))
        .json(&serde_json::json!({
            "content": "awaiting review",
            "community_id": community_id
        }))
        .await
        .json();
    assert_eq!(post["status"], "pending");

    (community_id, post["id"].as_str().unwrap().to_string())
}

// ---------------------------------------------------------------------------
// Advisory votes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn votes_tally_and_repeat_votes_are_noops() {
    let Some((server, state)) = common::try_server().await else {
        return;
    };

    let owner_id = prefixed_ulid("usr");
    let voter_id = prefixed_ulid("usr");
    let owner_token = common::login(&server, &owner_id, "mod-owner").await;
    let voter_token = common::login(&server, &voter_id, "mod-voter").await;

    let (community_id, post_id) = pending_post(&server, &owner_token).await;

    let first: serde_json::Value = server
        .post(&format!("/api/v1/posts/{post_id}/approvals"))
        .add_header(AUTHORIZATION, format!("Bearer {voter_token}"))
        .await
        .json();
    assert_eq!(first["vote_recorded"], true);
    assert_eq!(first["approvals_count"], 1);

    let again: serde_json::Value = server
        .post(&format!("/api/v1/posts/{post_id}/approvals"))
        .add_header(AUTHORIZATION, format!("Bearer {voter_token}"))
        .await
        .json();
    assert_eq!(again["vote_recorded"], false);
    assert_eq!(again["approvals_count"], 1);
    assert_eq!(again["message"], "You already voted on this post");

    // Votes never change the status by themselves.
    let tally: serde_json::Value = server
        .get(&format!("/api/v1/posts/{post_id}/approvals"))
        .await
        .json();
    assert_eq!(tally["approvals_count"], 1);
    assert_eq!(tally["voters"][0], voter_id);

    common::cleanup_community(&state.db, &community_id).await;
    common::cleanup_profile(&state.db, &voter_id).await;
    common::cleanup_profile(&state.db, &owner_id).await;
}

// ---------------------------------------------------------------------------
// Admin transitions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn only_admins_can_approve() {
    let Some((server, state)) = common::try_server().await else {
        return;
    };

    let owner_id = prefixed_ulid("usr");
    let owner_token = common::login(&server, &owner_id, "plain-owner").await;
    let (community_id, post_id) = pending_post(&server, &owner_token).await;

    server
        .post(&format!("/api/v1/posts/{post_id}/approve"))
        .add_header(AUTHORIZATION, format!("Bearer {owner_token}"))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    common::cleanup_community(&state.db, &community_id).await;
    common::cleanup_profile(&state.db, &owner_id).await;
}

#[tokio::test]
async fn approval_awards_xp_and_is_terminal() {
    let Some((server, state)) = common::try_server().await else {
        return;
    };

    let author_id = prefixed_ulid("usr");
    let admin_id = prefixed_ulid("usr");
    let author_token = common::login(&server, &author_id, "pending-author").await;
    let admin_token = common::login(&server, &admin_id, "the-admin").await;
    common::make_admin(&state.db, &admin_id).await;

    let (community_id, post_id) = pending_post(&server, &author_token).await;

    // Pending posts earn nothing yet.
    let before: serde_json::Value = server
        .get("/api/v1/users/@me")
        .add_header(AUTHORIZATION, format!("Bearer {author_token}"))
        .await
        .json();
    assert_eq!(before["xp"], 0);

    let approved: serde_json::Value = server
        .post(&format!("/api/v1/posts/{post_id}/approve"))
        .add_header(AUTHORIZATION, format!("Bearer {admin_token}"))
        .await
        .json();
    assert_eq!(approved["status"], "approved");

    let after: serde_json::Value = server
        .get("/api/v1/users/@me")
        .add_header(AUTHORIZATION, format!("Bearer {author_token}"))
        .await
        .json();
    assert_eq!(after["xp"], 5);

    // Approved is terminal; no take-backs.
    server
        .post(&format!("/api/v1/posts/{post_id}/reject"))
        .add_header(AUTHORIZATION, format!("Bearer {admin_token}"))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    // The author got a system notification about the decision.
    let inbox: serde_json::Value = server
        .get("/api/v1/notifications")
        .add_header(AUTHORIZATION, format!("Bearer {author_token}"))
        .await
        .json();
    let types: Vec<&str> = inbox["notifications"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["type"].as_str().unwrap())
        .collect();
    assert!(types.contains(&"system"), "notifications: {types:?}");

    common::cleanup_community(&state.db, &community_id).await;
    common::cleanup_profile(&state.db, &admin_id).await;
    common::cleanup_profile(&state.db, &author_id).await;
}

#[tokio::test]
async fn rejected_post_earns_nothing_and_hides_from_others() {
    let Some((server, state)) = common::try_server().await else {
        return;
    };

    let author_id = prefixed_ulid("usr");
    let admin_id = prefixed_ulid("usr");
    let other_id = prefixed_ulid("usr");
    let author_token = common::login(&server, &author_id, "rejected-author").await;
    let admin_token = common::login(&server, &admin_id, "reject-admin").await;
    let other_token = common::login(&server, &other_id, "bystander").await;
    common::make_admin(&state.db, &admin_id).await;

    let (community_id, post_id) = pending_post(&server, &author_token).await;

    server
        .post(&format!("/api/v1/posts/{post_id}/reject"))
        .add_header(AUTHORIZATION, format!("Bearer {admin_token}"))
        .await
        .assert_status_ok();

    let me: serde_json::Value = server
        .get("/api/v1/users/@me")
        .add_header(AUTHORIZATION, format!("Bearer {author_token}"))
        .await
        .json();
    assert_eq!(me["xp"], 0);

    // The author can still see their own rejected post; others cannot.
    server
        .get(&format!("/api/v1/posts/{post_id}"))
        .add_header(AUTHORIZATION, format!("Bearer {author_token}"))
        .await
        .assert_status_ok();
    server
        .get(&format!("/api/v1/posts/{post_id}"))
        .add_header(AUTHORIZATION, format!("Bearer {other_token}"))
        .await
        .assert_status_not_found();

    common::cleanup_community(&state.db, &community_id).await;
    common::cleanup_profile(&state.db, &other_id).await;
    common::cleanup_profile(&state.db, &admin_id).await;
    common::cleanup_profile(&state.db, &author_id).await;
}
