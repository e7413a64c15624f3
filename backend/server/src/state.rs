use std::{sync::Arc, time::Duration};

use anyhow::Result;
use tracing::info;
use wiki::{LinkSource, PathValidator, WikiClient, Walker};

use crate::{
    auth::TokenIssuer,
    config::Config,
    database::{Store, init_redis},
};

pub struct State {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub walker: Walker,
    pub validator: PathValidator,
    pub tokens: TokenIssuer,
}

impl State {
    pub async fn new(config: Config) -> Result<Arc<Self>> {
        let store = init_redis(&config.redis_url).await?;
        info!("Connected to Redis at {}", config.redis_url);

        let client = WikiClient::new(
            &config.wiki_api_url,
            &config.wiki_article_base,
            config.wiki_http_timeout,
        )?;

        Ok(Self::with_parts(config, Arc::new(store), Arc::new(client)))
    }

    /// Assembles state around an existing store and link source.
    pub fn with_parts(
        config: Config,
        store: Arc<dyn Store>,
        source: Arc<dyn LinkSource>,
    ) -> Arc<Self> {
        let walker = Walker::new(source.clone())
            .with_steps(config.walk_min_steps, config.walk_max_steps)
            .with_retry(config.retry_policy());
        let validator = PathValidator::new(source);
        let tokens = TokenIssuer::new(&config.jwt_secret, &config.jwt_refresh_secret);

        Arc::new(Self {
            config,
            store,
            walker,
            validator,
            tokens,
        })
    }

    pub fn deadline(&self) -> Option<Duration> {
        Some(self.config.request_deadline)
    }
}
