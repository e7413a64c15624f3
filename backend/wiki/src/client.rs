//! # MediaWiki Client
//!
//! [`LinkSource`] over the MediaWiki Action API.
//!
//! ## Links
//! - `prop=links&pllimit=max` returns at most 500 links per response
//! - Popular articles link to thousands of pages, so responses carry a `continue` object
//! - Every key of `continue` is sent back on the next request until it disappears
//! - Continuation tokens depend on the previous response, so pages are fetched one after another
//! - Stopping at the first page would bias walks toward articles with few visible links
//!
//! ## Random
//! - `list=random&rnnamespace=0` keeps starts inside the main article namespace
//!
//! ## Commands
//!
//! Inspect a page of links by hand.
//! ```sh
//! curl "https://en.wikipedia.org/w/api.php?action=query&format=json&formatversion=2&prop=links&pllimit=max&titles=Photon"
//! ```
use std::{collections::HashSet, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    article::{ArticleRef, DEFAULT_ARTICLE_BASE},
    error::{Result, WikiError},
    models::{
        DEFAULT_API_URL, LINKS_PARAMS, LinksQuery, RANDOM_PARAMS, RandomQuery, Response,
        continuation_params,
    },
    source::LinkSource,
};

pub const USER_AGENT: &str = concat!("wikirace/", env!("CARGO_PKG_VERSION"));

pub struct WikiClient {
    http: Client,
    api_url: String,
    article_base: String,
}

impl WikiClient {
    pub fn new(api_url: &str, article_base: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            api_url: api_url.to_string(),
            article_base: article_base.to_string(),
        })
    }

    pub fn wikipedia(timeout: Duration) -> Result<Self> {
        Self::new(DEFAULT_API_URL, DEFAULT_ARTICLE_BASE, timeout)
    }

    async fn query<Q: DeserializeOwned>(&self, params: &[(String, String)]) -> Result<Response<Q>> {
        let response = self
            .http
            .get(&self.api_url)
            .query(params)
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        let parsed: Response<Q> = serde_json::from_str(&body)?;

        if let Some(error) = &parsed.error {
            return Err(WikiError::UpstreamUnavailable(format!(
                "{}: {}",
                error.code, error.info
            )));
        }

        Ok(parsed)
    }
}

fn owned(params: &[(&str, &str)]) -> Vec<(String, String)> {
    params
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

#[async_trait]
impl LinkSource for WikiClient {
    async fn random_article(&self) -> Result<ArticleRef> {
        let response: Response<RandomQuery> = self.query(&owned(&RANDOM_PARAMS)).await?;

        let page = response
            .query
            .and_then(|query| query.random.into_iter().next())
            .ok_or_else(|| WikiError::UpstreamUnavailable("empty random article response".to_string()))?;

        Ok(ArticleRef::from_title(&self.article_base, &page.title))
    }

    async fn outgoing_links(&self, article: &ArticleRef) -> Result<Vec<ArticleRef>> {
        let title = article.title()?;

        let mut links = Vec::new();
        let mut continuation = Vec::new();
        let mut seen_continuations = HashSet::new();
        let mut pages = 0;

        loop {
            let mut params = owned(&LINKS_PARAMS);
            params.push(("titles".to_string(), title.clone()));
            params.extend(continuation.iter().cloned());

            let response: Response<LinksQuery> = self.query(&params).await?;
            pages += 1;

            for page in response.query.map(|query| query.pages).unwrap_or_default() {
                if page.invalid {
                    return Err(WikiError::MalformedReference(article.to_string()));
                }

                if page.missing {
                    debug!("{} does not exist upstream", page.title);
                }

                links.extend(
                    page.links
                        .iter()
                        .map(|link| ArticleRef::from_title(&self.article_base, &link.title)),
                );
            }

            let Some(next) = response.continuation else {
                break;
            };

            continuation = continuation_params(&next);
            if !seen_continuations.insert(continuation.clone()) {
                return Err(WikiError::UpstreamUnavailable(format!(
                    "continuation repeated while listing links of {title}"
                )));
            }
        }

        debug!("{} links across {} pages for {}", links.len(), pages, title);

        Ok(links)
    }
}
