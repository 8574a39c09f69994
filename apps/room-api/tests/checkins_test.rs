mod common;

use axum::http::header::AUTHORIZATION;
use room_common::id::prefixed_ulid;

// ---------------------------------------------------------------------------
// POST /api/v1/checkins
// ---------------------------------------------------------------------------

#[tokio::test]
async fn first_checkin_awards_xp_and_repeat_is_a_noop() {
    let Some((server, state)) = common::try_server().await else {
        return;
    };

    let user_id = prefixed_ulid("usr");
    let token = common::login(&server, &user_id, "daily").await;

    let first = server
        .post("/api/v1/checkins")
        .add_header(AUTHORIZATION, format!("Bearer {token}"))
        .await;
    first.assert_status_ok();
    let body: serde_json::Value = first.json();
    assert_eq!(body["checked_in"], true);
    assert_eq!(body["xp"], 3);
    assert_eq!(body["level"], 1);
    assert_eq!(body["leveled_up"], false);
    assert_eq!(body["message"], "Check-in successful! +3 XP");

    // Same day again: no extra XP.
    let second = server
        .post("/api/v1/checkins")
        .add_header(AUTHORIZATION, format!("Bearer {token}"))
        .await;
    second.assert_status_ok();
    let body: serde_json::Value = second.json();
    assert_eq!(body["checked_in"], false);
    assert_eq!(body["message"], "Already checked in today");

    // Profile reflects exactly one award.
    let me: serde_json::Value = server
        .get("/api/v1/users/@me")
        .add_header(AUTHORIZATION, format!("Bearer {token}"))
        .await
        .json();
    assert_eq!(me["xp"], 3);

    common::cleanup_profile(&state.db, &user_id).await;
}

#[tokio::test]
async fn checkin_message_follows_profile_language() {
    let Some((server, state)) = common::try_server().await else {
        return;
    };

    let user_id = prefixed_ulid("usr");
    let token = common::mint_identity_token(&user_id, "viet", Some("vi"));
    let login: serde_json::Value = server
        .post("/api/v1/auth/login")
        .json(&serde_json::json!({ "identity_token": token }))
        .await
        .json();
    let access = login["access_token"].as_str().unwrap();

    let resp = server
        .post("/api/v1/checkins")
        .add_header(AUTHORIZATION, format!("Bearer {access}"))
        .await;
    resp.assert_status_ok();
    assert_eq!(
        resp.json::<serde_json::Value>()["message"],
        "Điểm danh thành công! +3 XP"
    );

    common::cleanup_profile(&state.db, &user_id).await;
}

// ---------------------------------------------------------------------------
// GET /api/v1/checkins/today
// ---------------------------------------------------------------------------

#[tokio::test]
async fn checkin_status_flips_after_checking_in() {
    let Some((server, state)) = common::try_server().await else {
        return;
    };

    let user_id = prefixed_ulid("usr");
    let token = common::login(&server, &user_id, "status").await;

    let before: serde_json::Value = server
        .get("/api/v1/checkins/today")
        .add_header(AUTHORIZATION, format!("Bearer {token}"))
        .await
        .json();
    assert_eq!(before["checked_in_today"], false);

    server
        .post("/api/v1/checkins")
        .add_header(AUTHORIZATION, format!("Bearer {token}"))
        .await
        .assert_status_ok();

    let after: serde_json::Value = server
        .get("/api/v1/checkins/today")
        .add_header(AUTHORIZATION, format!("Bearer {token}"))
        .await
        .json();
    assert_eq!(after["checked_in_today"], true);

    common::cleanup_profile(&state.db, &user_id).await;
}
