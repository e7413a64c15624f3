//! Active and completed games.
//!
//! An active game lives for an hour; winning turns it into a completed game, which
//! is kept for good and can later be turned into a seed.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use wiki::{ArticleRef, GameSpec, PathClaim, with_deadline};

use crate::{
    database::{Store, StoreError, load, save},
    error::AppError,
    seeds::get_seeded_game,
    state::State,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveGame {
    pub id: String,
    pub starting_article_url: ArticleRef,
    pub ending_article_url: ArticleRef,
    pub min_steps: u32,
    pub user_id: String,
    /// Where the player stands. Records written before positions were tracked have none.
    #[serde(default)]
    pub current_article_url: Option<ArticleRef>,
    #[serde(default)]
    pub steps_taken: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_from_seed: Option<String>,
}

impl ActiveGame {
    pub fn new(user_id: &str, spec: GameSpec, created_from_seed: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            current_article_url: Some(spec.start.clone()),
            starting_article_url: spec.start,
            ending_article_url: spec.end,
            min_steps: spec.min_steps,
            user_id: user_id.to_string(),
            steps_taken: 0,
            created_from_seed,
        }
    }

    pub fn spec(&self) -> GameSpec {
        GameSpec {
            start: self.starting_article_url.clone(),
            end: self.ending_article_url.clone(),
            min_steps: self.min_steps,
        }
    }

    pub fn current_article(&self) -> &ArticleRef {
        self.current_article_url
            .as_ref()
            .unwrap_or(&self.starting_article_url)
    }

    pub fn advance(&mut self, to: ArticleRef) {
        self.current_article_url = Some(to);
        self.steps_taken += 1;
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedGame {
    pub id: String,
    pub starting_article_url: ArticleRef,
    pub ending_article_url: ArticleRef,
    pub min_steps: u32,
    pub steps: PathClaim,
    pub user_id: String,
    pub completed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_from_seed: Option<String>,
}

fn active_key(id: &str) -> String {
    format!("activeGame:{id}")
}

fn completed_key(id: &str) -> String {
    format!("completedGame:{id}")
}

pub async fn create_active_game(state: &State, user_id: &str) -> Result<ActiveGame, AppError> {
    let spec = with_deadline(state.deadline(), state.walker.generate()).await?;
    let game = ActiveGame::new(user_id, spec, None);

    save_active_game(state, &game).await?;

    Ok(game)
}

pub async fn create_active_game_from_seed(
    state: &State,
    user_id: &str,
    seed_id: &str,
) -> Result<ActiveGame, AppError> {
    let seed = get_seeded_game(state.store.as_ref(), seed_id).await?;
    let game = ActiveGame::new(user_id, seed.spec(), Some(seed.id));

    save_active_game(state, &game).await?;

    Ok(game)
}

pub async fn save_active_game(state: &State, game: &ActiveGame) -> Result<(), StoreError> {
    save(
        state.store.as_ref(),
        &active_key(&game.id),
        game,
        Some(state.config.active_game_ttl),
    )
    .await?;
    info!("Game saved: {}", game.id);

    Ok(())
}

pub async fn get_active_game(store: &dyn Store, id: &str) -> Result<ActiveGame, AppError> {
    load(store, &active_key(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Active game {id}")))
}

pub async fn delete_active_game(store: &dyn Store, id: &str) -> Result<(), StoreError> {
    store.delete(&active_key(id)).await?;
    info!("Game deleted: {id}");

    Ok(())
}

pub async fn create_completed_game(
    store: &dyn Store,
    game: &ActiveGame,
    steps: PathClaim,
) -> Result<CompletedGame, StoreError> {
    let completed = CompletedGame {
        id: game.id.clone(),
        starting_article_url: game.starting_article_url.clone(),
        ending_article_url: game.ending_article_url.clone(),
        min_steps: game.min_steps,
        steps,
        user_id: game.user_id.clone(),
        completed_at: Utc::now(),
        created_from_seed: game.created_from_seed.clone(),
    };

    save(store, &completed_key(&completed.id), &completed, None).await?;
    info!("Completed game saved: {}", completed.id);

    Ok(completed)
}

pub async fn get_completed_game(store: &dyn Store, id: &str) -> Result<CompletedGame, AppError> {
    load(store, &completed_key(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Completed game {id}")))
}
