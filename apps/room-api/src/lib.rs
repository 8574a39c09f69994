pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod i18n;
pub mod models;
pub mod moderation;
pub mod notify;
pub mod progression;
pub mod realtime;
pub mod routes;

use std::sync::Arc;

use config::Config;
use db::kv::KeyValueStore;
use db::pool::DbPool;
use realtime::fanout::RealtimeBroadcast;

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub kv: Arc<dyn KeyValueStore>,
    pub config: Arc<Config>,
    pub broadcast: Arc<RealtimeBroadcast>,
}
