use anyhow::{anyhow, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::net::SocketAddr;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub http_addr: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_connect_timeout_seconds: u64,
    pub db_idle_timeout_seconds: u64,
    pub db_max_lifetime_seconds: u64,
    pub run_migrations: bool,
    pub session_key: [u8; 32],
    pub session_ttl_minutes: u64,
    pub secure_cookies: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let http_addr = env_or("HTTP_ADDR", "0.0.0.0:8080");
        let _parsed_http_addr = SocketAddr::from_str(&http_addr)
            .map_err(|err| anyhow!("invalid HTTP_ADDR: {}", err))?;

        Ok(Self {
            http_addr,
            database_url: env_or_err("DATABASE_URL")?,
            db_max_connections: env_or_parse("DB_MAX_CONNECTIONS", "25")?,
            db_connect_timeout_seconds: env_or_parse("DB_CONNECT_TIMEOUT_SECONDS", "5")?,
            db_idle_timeout_seconds: env_or_parse("DB_IDLE_TIMEOUT_SECONDS", "300")?,
            db_max_lifetime_seconds: env_or_parse("DB_MAX_LIFETIME_SECONDS", "1800")?,
            run_migrations: env_or_parse("RUN_MIGRATIONS", "true")?,
            session_key: env_key_32("SESSION_KEY")?,
            session_ttl_minutes: session_ttl(env_or_parse("SESSION_TTL_MINUTES", "20160")?)?,
            secure_cookies: env_or_parse("SECURE_COOKIES", "false")?,
        })
    }
}

/// One year.
const MAX_SESSION_TTL_MINUTES: u64 = 366 * 24 * 60;

fn session_ttl(minutes: u64) -> Result<u64> {
    if minutes == 0 || minutes > MAX_SESSION_TTL_MINUTES {
        return Err(anyhow!(
            "invalid SESSION_TTL_MINUTES: expected 1..={}",
            MAX_SESSION_TTL_MINUTES
        ));
    }
    Ok(minutes)
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_err(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| anyhow!("missing required env var: {}", key))
}

fn env_or_parse<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    let value = std::env::var(key).unwrap_or_else(|_| default.to_string());
    value
        .parse::<T>()
        .map_err(|err| anyhow!("invalid {}: {}", key, err))
}

fn env_key_32(key: &str) -> Result<[u8; 32]> {
    let value = env_or_err(key)?;
    decode_key_32(key, &value)
}

fn decode_key_32(key: &str, value: &str) -> Result<[u8; 32]> {
    let decoded = STANDARD
        .decode(value.trim().as_bytes())
        .map_err(|err| anyhow!("invalid {}: {}", key, err))?;
    if decoded.len() != 32 {
        return Err(anyhow!("invalid {}: expected 32 bytes", key));
    }
    let mut key_bytes = [0u8; 32];
    key_bytes.copy_from_slice(&decoded);
    Ok(key_bytes)
}
