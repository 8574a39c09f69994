//! Shared harness for integration tests.
//!
//! Tests run against a real PostgreSQL database named `<db>_test`. When
//! DATABASE_URL is not set (or the test database cannot be reached) each
//! test skips itself by returning early from `try_server`.

#![allow(dead_code)]

use std::sync::Arc;

use axum_test::TestServer;
use jsonwebtoken::{Algorithm, EncodingKey, Header};

use room_api::auth::identity::IdentityClaims;
use room_api::config::Config;
use room_api::db::kv::{KeyValueStore, MemoryStore};
use room_api::realtime::fanout::RealtimeBroadcast;
use room_api::AppState;

/// Issuer and secret the test identity tokens are minted with.
pub const TEST_ISSUER: &str = "https://id.test.local";
pub const TEST_SECRET: &str = "test-identity-secret";

/// Build a server and state against the `_test` database, or `None` when no
/// database is configured.
pub async fn try_server() -> Option<(TestServer, AppState)> {
    let env_path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    let _ = dotenvy::from_path(env_path);

    let database_url = with_test_db_suffix(&std::env::var("DATABASE_URL").ok()?);
    if !ensure_migrated(&database_url) {
        return None;
    }

    let config = Config {
        database_url: database_url.clone(),
        identity_issuer: TEST_ISSUER.to_string(),
        identity_secret: TEST_SECRET.to_string(),
        port: 0,
        default_language: "en".to_string(),
    };

    let db = room_api::db::pool::connect(&database_url).await;
    let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());

    let state = AppState {
        db,
        kv,
        config: Arc::new(config),
        broadcast: Arc::new(RealtimeBroadcast::new()),
    };

    let app = room_api::routes::router().with_state(state.clone());
    let server = TestServer::new(app).expect("test server");
    Some((server, state))
}

/// Run embedded migrations once per test binary. Returns false when the test
/// database is unreachable.
fn ensure_migrated(database_url: &str) -> bool {
    use std::sync::OnceLock;
    static MIGRATED: OnceLock<bool> = OnceLock::new();

    *MIGRATED.get_or_init(|| {
        use diesel::Connection;
        use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
        const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

        let mut conn = match diesel::pg::PgConnection::establish(database_url) {
            Ok(conn) => conn,
            Err(_) => return false,
        };
        conn.run_pending_migrations(MIGRATIONS).is_ok()
    })
}

fn with_test_db_suffix(database_url: &str) -> String {
    let mut parts = database_url.splitn(2, '?');
    let base = parts.next().unwrap_or(database_url);
    let query = parts.next();

    let (prefix, db_name) = match base.rsplit_once('/') {
        Some(split) => split,
        None => return database_url.to_string(),
    };
    if db_name.is_empty() || db_name.ends_with("_test") {
        return database_url.to_string();
    }

    let mut updated = format!("{prefix}/{db_name}_test");
    if let Some(query) = query {
        updated.push('?');
        updated.push_str(query);
    }
    updated
}

/// Mint a test identity JWT for the given user.
pub fn mint_identity_token(user_id: &str, name: &str, locale: Option<&str>) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = IdentityClaims {
        iss: TEST_ISSUER.to_string(),
        sub: user_id.to_string(),
        iat: now,
        exp: now + 300,
        email: format!("{name}@test.local"),
        name: name.to_string(),
        avatar_url: None,
        locale: locale.map(str::to_string),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .expect("mint identity token")
}

/// Login a fresh test user and return their access token.
pub async fn login(server: &TestServer, user_id: &str, name: &str) -> String {
    let token = mint_identity_token(user_id, name, None);
    let resp = server
        .post("/api/v1/auth/login")
        .json(&serde_json::json!({ "identity_token": token }))
        .await;
    resp.assert_status_ok();
    resp.json::<serde_json::Value>()["access_token"]
        .as_str()
        .unwrap()
        .to_string()
}

/// Promote a test user to admin.
pub async fn make_admin(db: &room_api::db::pool::DbPool, user_id: &str) {
    use diesel::prelude::*;
    use diesel_async::RunQueryDsl;
    use room_api::db::schema::profiles;

    let mut conn = db.get().await.expect("pool");
    diesel::update(profiles::table.find(user_id))
        .set(profiles::role.eq("admin"))
        .execute(&mut conn)
        .await
        .expect("promote admin");
}

/// Delete a test profile (CASCADE removes their posts, likes, check-ins...).
pub async fn cleanup_profile(db: &room_api::db::pool::DbPool, user_id: &str) {
    use diesel::prelude::*;
    use diesel_async::RunQueryDsl;
    use room_api::db::schema::profiles;

    let mut conn = db.get().await.expect("pool");
    diesel::delete(profiles::table.filter(profiles::id.eq(user_id)))
        .execute(&mut conn)
        .await
        .ok();
}

/// Delete a test community (CASCADE removes membership rows).
pub async fn cleanup_community(db: &room_api::db::pool::DbPool, community_id: &str) {
    use diesel::prelude::*;
    use diesel_async::RunQueryDsl;
    use room_api::db::schema::communities;

    let mut conn = db.get().await.expect("pool");
    diesel::delete(communities::table.filter(communities::id.eq(community_id)))
        .execute(&mut conn)
        .await
        .ok();
}
