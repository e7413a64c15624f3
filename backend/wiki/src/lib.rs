//! # Wiki
//!
//! Everything the game needs to know about the article graph.
//!
//! - [`article`]: article references and title normalization
//! - [`client`]: MediaWiki API access with exhaustive link pagination
//! - [`filter`]: title predicates keeping list and namespaced pages out of games
//! - [`walker`]: random walks producing `{start, end, min_steps}` games
//! - [`validator`]: checks a claimed path against a game
//!
//! Both the walker and the validator only touch the network through [`LinkSource`],
//! so each walk or validation owns its own state and any number of them can run at
//! once without locking.
//!
//! ## Deadlines
//!
//! Callers serving a request wrap walks and validations in [`with_deadline`]. An
//! expired deadline abandons the in-flight fetch and surfaces
//! [`WikiError::Timeout`], distinct from [`WikiError::UpstreamUnavailable`].
use std::{future::Future, time::Duration};

use tokio::time::timeout;

pub mod article;
pub mod client;
pub mod error;
pub mod filter;
pub mod game;
#[cfg(any(test, feature = "testing"))]
pub mod graph;
pub mod models;
pub mod source;
pub mod validator;
pub mod walker;

pub use article::{ArticleRef, normalize};
pub use client::WikiClient;
pub use error::{Result, WikiError};
pub use filter::LinkFilter;
pub use game::{GameSpec, PathClaim};
pub use source::LinkSource;
pub use validator::{PathValidator, Rejection, Verdict};
pub use walker::{RetryPolicy, Walk, Walker};

pub async fn with_deadline<F, T>(deadline: Option<Duration>, operation: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match deadline {
        Some(limit) => timeout(limit, operation)
            .await
            .map_err(|_| WikiError::Timeout(format!("request deadline of {}ms", limit.as_millis())))?,
        None => operation.await,
    }
}
