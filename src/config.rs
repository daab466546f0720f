use std::{net::SocketAddr, str::FromStr};

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    /// Where unauthenticated visitors get sent. A `return_url` query is appended.
    pub sign_in_url: String,
    pub session_inactivity_minutes: i64,
    pub cookie_secure: bool,
    pub db_max_connections: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Config> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Config> {
        fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
        where
            T: FromStr,
            T::Err: std::error::Error + Send + Sync + 'static,
        {
            match lookup(key) {
                Some(raw) => raw.trim().parse().with_context(|| format!("{key}={raw:?} is malformed")),
                None => Ok(default),
            }
        }

        Ok(Config {
            database_url: lookup("DATABASE_URL").context("DATABASE_URL must be set")?,
            bind_addr: parse(&lookup, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 8080)))?,
            sign_in_url: lookup("SIGN_IN_URL").unwrap_or_else(|| "/login".to_owned()),
            session_inactivity_minutes: parse(&lookup, "SESSION_INACTIVITY_MINUTES", 30)?,
            cookie_secure: parse(&lookup, "COOKIE_SECURE", false)?,
            db_max_connections: parse(&lookup, "DB_MAX_CONNECTIONS", 16)?,
        })
    }

    pub fn sign_in_redirect(&self, return_url: &str) -> String {
        format!("{}?return_url={}", self.sign_in_url, urlencoding::encode(return_url))
    }
}
