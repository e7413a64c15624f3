//! Seeded games: curated start/end pairs any player can start from.
use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use wiki::{ArticleRef, GameSpec};

use crate::{
    database::{Store, StoreError, load, save},
    error::AppError,
    games::CompletedGame,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Random,
    Science,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Random => f.write_str("random"),
            Category::Science => f.write_str("science"),
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "random" => Ok(Category::Random),
            "science" => Ok(Category::Science),
            other => Err(format!("unknown category {other:?}")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeededGame {
    pub id: String,
    pub starting_article_url: ArticleRef,
    pub ending_article_url: ArticleRef,
    pub min_steps: u32,
    #[serde(default)]
    pub category: Category,
}

impl SeededGame {
    pub fn spec(&self) -> GameSpec {
        GameSpec {
            start: self.starting_article_url.clone(),
            end: self.ending_article_url.clone(),
            min_steps: self.min_steps,
        }
    }
}

fn seeded_key(id: &str) -> String {
    format!("seededGame:{id}")
}

pub async fn create_seeded_game(
    store: &dyn Store,
    spec: GameSpec,
    category: Category,
) -> Result<SeededGame, StoreError> {
    let seed = SeededGame {
        id: Uuid::new_v4().to_string(),
        starting_article_url: spec.start,
        ending_article_url: spec.end,
        min_steps: spec.min_steps,
        category,
    };

    save(store, &seeded_key(&seed.id), &seed, None).await?;
    info!("Seeded game saved: {} ({})", seed.id, seed.category);

    Ok(seed)
}

pub async fn create_seeded_game_from_completed(
    store: &dyn Store,
    game: &CompletedGame,
) -> Result<SeededGame, StoreError> {
    let spec = GameSpec {
        start: game.starting_article_url.clone(),
        end: game.ending_article_url.clone(),
        min_steps: game.min_steps,
    };

    create_seeded_game(store, spec, Category::Random).await
}

pub async fn get_seeded_game(store: &dyn Store, id: &str) -> Result<SeededGame, AppError> {
    load(store, &seeded_key(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Seeded game {id}")))
}
