//! # Random Walks
//!
//! Produces a start/end pair exactly `min_steps` hops apart.
//!
//! ## Algorithm
//! 1. Ask the source for a random start article
//! 2. Pick `min_steps` uniformly from the configured range (3 to 5 by default)
//! 3. For each hop, list every outgoing link of the current article, drop links the
//!    [`LinkFilter`] rejects and links to articles already visited in this walk
//! 4. No candidates left means a dead end: throw the attempt away and start over
//!    from a brand-new random article
//! 5. Otherwise pick one candidate uniformly and keep going
//!
//! ## Retries
//! Dead ends are about graph topology, not transport. They are retried according
//! to [`RetryPolicy`]; upstream failures and timeouts are never retried here.
use std::{collections::HashSet, ops::RangeInclusive, sync::Arc, time::Duration};

use rand::{Rng, SeedableRng, rngs::StdRng, seq::IndexedRandom};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{
    article::ArticleRef,
    error::{Result, WikiError},
    filter::LinkFilter,
    game::{GameSpec, PathClaim},
    source::LinkSource,
};

pub const DEFAULT_STEPS: RangeInclusive<u32> = 3..=5;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// `None` retries forever.
    pub max_attempts: Option<u32>,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn unbounded() -> Self {
        Self {
            max_attempts: None,
            ..Self::default()
        }
    }

    pub fn bounded(max_attempts: u32) -> Self {
        Self {
            max_attempts: Some(max_attempts),
            ..Self::default()
        }
    }

    pub fn immediate(mut self) -> Self {
        self.base_backoff = Duration::ZERO;
        self.max_backoff = Duration::ZERO;
        self
    }

    fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }

    fn backoff(&self, attempts: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempts.saturating_sub(1));
        self.base_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Some(25),
            base_backoff: Duration::from_millis(50),
            max_backoff: Duration::from_secs(2),
        }
    }
}

/// A generated game plus the path that proves it is winnable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Walk {
    pub spec: GameSpec,
    pub path: Vec<ArticleRef>,
}

impl Walk {
    pub fn claim(&self) -> PathClaim {
        PathClaim::new(self.path.clone())
    }
}

enum Attempt {
    Reached(Vec<ArticleRef>),
    DeadEnd { at: ArticleRef, hops: u32 },
}

struct WalkState {
    visited: HashSet<String>,
    path: Vec<ArticleRef>,
    remaining: u32,
}

impl WalkState {
    fn new(start: ArticleRef, hops: u32) -> Result<Self> {
        let visited = HashSet::from([start.normalized()?]);

        Ok(Self {
            visited,
            path: vec![start],
            remaining: hops,
        })
    }

    fn current(&self) -> &ArticleRef {
        &self.path[self.path.len() - 1]
    }

    fn hops(&self) -> u32 {
        (self.path.len() - 1) as u32
    }

    /// Distinct, allowed, unvisited links.
    fn candidates(&self, links: Vec<ArticleRef>, filter: &LinkFilter) -> Vec<(ArticleRef, String)> {
        let mut seen = HashSet::new();

        links
            .into_iter()
            .filter(|link| filter.allows(link))
            .filter_map(|link| link.normalized().ok().map(|key| (link, key)))
            .filter(|(_, key)| !self.visited.contains(key) && seen.insert(key.clone()))
            .collect()
    }

    fn advance(&mut self, (next, key): (ArticleRef, String)) {
        self.visited.insert(key);
        self.path.push(next);
        self.remaining -= 1;
    }
}

pub struct Walker {
    source: Arc<dyn LinkSource>,
    filter: LinkFilter,
    steps: RangeInclusive<u32>,
    retry: RetryPolicy,
    seed: Option<u64>,
}

impl Walker {
    pub fn new(source: Arc<dyn LinkSource>) -> Self {
        Self {
            source,
            filter: LinkFilter::default(),
            steps: DEFAULT_STEPS,
            retry: RetryPolicy::default(),
            seed: None,
        }
    }

    pub fn with_filter(mut self, filter: LinkFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Bounds are reordered if reversed and never drop below one hop.
    pub fn with_steps(mut self, min: u32, max: u32) -> Self {
        let (low, high) = (min.min(max).max(1), max.max(min).max(1));
        self.steps = low..=high;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn steps(&self) -> &RangeInclusive<u32> {
        &self.steps
    }

    pub async fn generate(&self) -> Result<GameSpec> {
        self.walk().await.map(|walk| walk.spec)
    }

    pub async fn walk(&self) -> Result<Walk> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        let mut attempts = 0;

        loop {
            attempts += 1;

            let start = self.source.random_article().await?;
            let min_steps = rng.random_range(self.steps.clone());

            match self.attempt(start, min_steps, &mut rng).await? {
                Attempt::Reached(path) => {
                    info!("Walk of {min_steps} hops found after {attempts} attempt(s)");

                    let spec = GameSpec {
                        start: path[0].clone(),
                        end: path[path.len() - 1].clone(),
                        min_steps,
                    };

                    return Ok(Walk { spec, path });
                }
                Attempt::DeadEnd { at, hops } => {
                    warn!("Dead end at {at} after {hops} hops, attempt {attempts}");

                    if self.retry.exhausted(attempts) {
                        return Err(WikiError::RetriesExhausted(attempts));
                    }

                    sleep(self.retry.backoff(attempts)).await;
                }
            }
        }
    }

    async fn attempt(&self, start: ArticleRef, min_steps: u32, rng: &mut StdRng) -> Result<Attempt> {
        let mut state = WalkState::new(start, min_steps)?;

        while state.remaining > 0 {
            let links = self.source.outgoing_links(state.current()).await?;
            let candidates = state.candidates(links, &self.filter);

            let Some(next) = candidates.choose(rng).cloned() else {
                return Ok(Attempt::DeadEnd {
                    at: state.current().clone(),
                    hops: state.hops(),
                });
            };

            debug!("Hop {} -> {}", state.hops() + 1, next.0);
            state.advance(next);
        }

        Ok(Attempt::Reached(state.path))
    }
}
