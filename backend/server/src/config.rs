use std::{env, fmt::Display, fs::read_to_string, str::FromStr, time::Duration};

use anyhow::{Context, Result, anyhow};
use tracing::{info, warn};
use wiki::{
    RetryPolicy, article::DEFAULT_ARTICLE_BASE, models::DEFAULT_API_URL, walker::DEFAULT_STEPS,
};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
const DEFAULT_HTTP_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_DEADLINE_MS: u64 = 25_000;
const DEFAULT_MAX_ATTEMPTS: u32 = 25;
const DEFAULT_ACTIVE_TTL_SECS: u64 = 60 * 60;
const DEFAULT_PASSWORD_COST: u32 = 10;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub redis_url: String,
    pub wiki_api_url: String,
    pub wiki_article_base: String,
    pub wiki_http_timeout: Duration,
    pub request_deadline: Duration,
    pub walk_min_steps: u32,
    pub walk_max_steps: u32,
    /// `None` means dead ends are retried forever.
    pub walk_max_attempts: Option<u32>,
    pub active_game_ttl: Duration,
    pub password_cost: u32,
    pub jwt_secret: String,
    pub jwt_refresh_secret: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        let max_attempts: u32 = try_load("WALK_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?;

        Ok(Self {
            port: try_load("RUST_PORT", DEFAULT_PORT)?,
            redis_url: try_load("REDIS_URL", DEFAULT_REDIS_URL.to_string())?,
            wiki_api_url: try_load("WIKI_API_URL", DEFAULT_API_URL.to_string())?,
            wiki_article_base: try_load("WIKI_ARTICLE_BASE", DEFAULT_ARTICLE_BASE.to_string())?,
            wiki_http_timeout: Duration::from_millis(try_load(
                "WIKI_HTTP_TIMEOUT_MS",
                DEFAULT_HTTP_TIMEOUT_MS,
            )?),
            request_deadline: Duration::from_millis(try_load(
                "REQUEST_DEADLINE_MS",
                DEFAULT_DEADLINE_MS,
            )?),
            walk_min_steps: try_load("WALK_MIN_STEPS", *DEFAULT_STEPS.start())?,
            walk_max_steps: try_load("WALK_MAX_STEPS", *DEFAULT_STEPS.end())?,
            walk_max_attempts: (max_attempts > 0).then_some(max_attempts),
            active_game_ttl: Duration::from_secs(try_load(
                "ACTIVE_GAME_TTL_SECS",
                DEFAULT_ACTIVE_TTL_SECS,
            )?),
            password_cost: try_load("PASSWORD_COST", DEFAULT_PASSWORD_COST)?,
            jwt_secret: read_secret("JWT_SECRET")?,
            jwt_refresh_secret: read_secret("JWT_REFRESH_SECRET")?,
        })
    }

    /// Defaults everywhere, explicit secrets. Used by tests and local tooling.
    pub fn local(jwt_secret: &str, jwt_refresh_secret: &str) -> Self {
        Self {
            port: DEFAULT_PORT,
            redis_url: DEFAULT_REDIS_URL.to_string(),
            wiki_api_url: DEFAULT_API_URL.to_string(),
            wiki_article_base: DEFAULT_ARTICLE_BASE.to_string(),
            wiki_http_timeout: Duration::from_millis(DEFAULT_HTTP_TIMEOUT_MS),
            request_deadline: Duration::from_millis(DEFAULT_DEADLINE_MS),
            walk_min_steps: *DEFAULT_STEPS.start(),
            walk_max_steps: *DEFAULT_STEPS.end(),
            walk_max_attempts: Some(DEFAULT_MAX_ATTEMPTS),
            active_game_ttl: Duration::from_secs(DEFAULT_ACTIVE_TTL_SECS),
            password_cost: DEFAULT_PASSWORD_COST,
            jwt_secret: jwt_secret.to_string(),
            jwt_refresh_secret: jwt_refresh_secret.to_string(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.walk_max_attempts,
            ..RetryPolicy::default()
        }
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn try_load<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("Invalid {key} value {raw:?}: {e}")),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

fn read_secret(secret_name: &str) -> Result<String> {
    let path = format!("/run/secrets/{secret_name}");

    match read_to_string(&path) {
        Ok(secret) => Ok(secret.trim().to_string()),
        Err(e) => {
            warn!("Failed to read {secret_name} from file: {e}, trying environment");

            var(secret_name)
                .map(|secret| secret.trim().to_string())
                .filter(|secret| !secret.is_empty())
                .with_context(|| format!("Secret {secret_name} is not configured"))
        }
    }
}
