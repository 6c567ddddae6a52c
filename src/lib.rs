pub mod app;
pub mod config;
pub mod domain;
pub mod http;
pub mod infra;

use crate::config::AppConfig;
use crate::infra::db::Db;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub session_key: [u8; 32],
    pub session_ttl_minutes: u64,
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(db: Db, config: &AppConfig) -> Self {
        Self {
            db,
            session_key: config.session_key,
            session_ttl_minutes: config.session_ttl_minutes,
            secure_cookies: config.secure_cookies,
        }
    }
}
