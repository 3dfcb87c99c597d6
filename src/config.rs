use std::{net::SocketAddr, time::Duration};

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub tmdb_api_key: String,
    pub tmdb_base_url: String,
    pub poster_base_url: String,
    pub thumb_base_url: String,
    pub database_url: String,
    pub max_pages: u32,
    pub tmdb_rps: u32,
    pub http_timeout: Duration,
    pub sync_interval: Duration,
    pub sync_flex: Duration,
    pub sync_on_start: bool,
}

pub const DEFAULT_MAX_PAGES: u32 = 10;
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 60 * 60 * 24;

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().context("PORT")?;

        let tmdb_api_key = std::env::var("TMDB_API_KEY").unwrap_or_else(|_| "".to_string());
        let tmdb_base_url = std::env::var("TMDB_BASE_URL")
            .unwrap_or_else(|_| "https://api.themoviedb.org/3/movie".to_string());
        let poster_base_url = std::env::var("POSTER_BASE_URL")
            .unwrap_or_else(|_| "http://image.tmdb.org/t/p/w185".to_string());
        let thumb_base_url = std::env::var("THUMB_BASE_URL")
            .unwrap_or_else(|_| "http://image.tmdb.org/t/p/w342".to_string());

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://popmovies.db?mode=rwc".to_string());

        let max_pages: u32 = env_or("MAX_PAGES", DEFAULT_MAX_PAGES)?;
        let tmdb_rps: u32 = env_or("TMDB_RPS", 4)?;
        let http_timeout_secs: u64 = env_or("HTTP_TIMEOUT_SECS", 30)?;

        let sync_interval_secs: u64 = env_or("SYNC_INTERVAL_SECS", DEFAULT_SYNC_INTERVAL_SECS)?;
        let sync_flex_secs: u64 = env_or("SYNC_FLEX_SECS", sync_interval_secs / 3)?;
        let sync_on_start: bool = env_or("SYNC_ON_START", true)?;

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            tmdb_api_key,
            tmdb_base_url,
            poster_base_url,
            thumb_base_url,
            database_url,
            max_pages,
            tmdb_rps,
            http_timeout: Duration::from_secs(http_timeout_secs),
            sync_interval: Duration::from_secs(sync_interval_secs),
            sync_flex: Duration::from_secs(sync_flex_secs.min(sync_interval_secs)),
            sync_on_start,
        })
    }
}

fn env_or<T>(key: &'static str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().with_context(|| format!("{key}={raw}")),
        Err(_) => Ok(default),
    }
}
