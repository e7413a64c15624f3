//! In-memory [`LinkSource`] for tests and offline runs.
use std::{
    collections::{HashMap, HashSet},
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;

use crate::{
    article::ArticleRef,
    error::{Result, WikiError},
    source::LinkSource,
};

#[derive(Default)]
pub struct StaticGraph {
    links: HashMap<String, Vec<ArticleRef>>,
    starts: Vec<ArticleRef>,
    failing: HashSet<String>,
    next_start: AtomicUsize,
    fetches: AtomicUsize,
}

impl StaticGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn link<I, S>(mut self, from: &str, to: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let key = ArticleRef::wikipedia(from).normalized().unwrap_or_default();
        self.links
            .entry(key)
            .or_default()
            .extend(to.into_iter().map(|title| ArticleRef::wikipedia(title.as_ref())));
        self
    }

    /// Random starts are handed out round-robin.
    pub fn starts<I, S>(mut self, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.starts = titles
            .into_iter()
            .map(|title| ArticleRef::wikipedia(title.as_ref()))
            .collect();
        self
    }

    pub fn fail_on(mut self, title: &str) -> Self {
        self.failing
            .insert(ArticleRef::wikipedia(title).normalized().unwrap_or_default());
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn random_calls(&self) -> usize {
        self.next_start.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LinkSource for StaticGraph {
    async fn random_article(&self) -> Result<ArticleRef> {
        if self.starts.is_empty() {
            return Err(WikiError::UpstreamUnavailable("no start articles".to_string()));
        }

        let index = self.next_start.fetch_add(1, Ordering::SeqCst);
        Ok(self.starts[index % self.starts.len()].clone())
    }

    async fn outgoing_links(&self, article: &ArticleRef) -> Result<Vec<ArticleRef>> {
        let key = article.normalized()?;
        self.fetches.fetch_add(1, Ordering::SeqCst);

        if self.failing.contains(&key) {
            return Err(WikiError::UpstreamUnavailable(format!("{article} is failing")));
        }

        Ok(self.links.get(&key).cloned().unwrap_or_default())
    }
}
