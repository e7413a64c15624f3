use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State as AxumState},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use wiki::{ArticleRef, GameSpec, PathClaim, Rejection, Verdict, with_deadline};

use crate::{
    error::AppError,
    games::{
        create_active_game, create_active_game_from_seed, create_completed_game,
        delete_active_game, get_active_game, get_completed_game, save_active_game,
    },
    seeds::{
        Category, create_seeded_game, create_seeded_game_from_completed, get_seeded_game,
    },
    state::State,
    users::{create_user, find_user_by_email, is_password_valid},
    utils::{AuthUser, Payload, TokenHeaders, ensure_owner},
};

type AppState = AxumState<Arc<State>>;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    email: String,
    password: String,
    confirm_password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedIdRequest {
    seed_id: String,
}

#[derive(Deserialize)]
pub struct GameIdRequest {
    id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateRequest {
    id: String,
    from_url: ArticleRef,
    to_url: ArticleRef,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateWinRequest {
    id: String,
    visited_urls: PathClaim,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedGameRequest {
    game_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSeedRequest {
    starting_article_url: ArticleRef,
    ending_article_url: ArticleRef,
    min_steps: u32,
    #[serde(default)]
    category: Category,
}

pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn register_handler(
    AxumState(state): AppState,
    Payload(payload): Payload<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if [&payload.email, &payload.password, &payload.confirm_password]
        .iter()
        .any(|field| field.trim().is_empty())
    {
        return Err(AppError::MalformedPayload(
            "email and passwords are required".to_string(),
        ));
    }
    if payload.password != payload.confirm_password {
        return Err(AppError::MalformedPayload("passwords do not match".to_string()));
    }

    let store = state.store.as_ref();
    let user = create_user(
        store,
        &payload.email,
        &payload.password,
        state.config.password_cost,
    )
    .await?;
    let tokens = state.tokens.issue(store, &user.id).await?;

    Ok((TokenHeaders::from(tokens), Json(json!({ "userId": user.id }))))
}

pub async fn login_handler(
    AxumState(state): AppState,
    Payload(payload): Payload<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store.as_ref();
    let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

    let user = find_user_by_email(store, &payload.email)
        .await?
        .ok_or_else(invalid)?;
    if !is_password_valid(&user, &payload.password).await? {
        return Err(invalid());
    }

    let tokens = state.tokens.issue(store, &user.id).await?;
    info!("User logged in: {}", user.id);

    Ok((TokenHeaders::from(tokens), Json(json!({ "userId": user.id }))))
}

pub async fn start_handler(
    AxumState(state): AppState,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let game = create_active_game(&state, &user.user_id).await?;

    Ok((user.headers(), Json(game)))
}

pub async fn start_from_seed_handler(
    AxumState(state): AppState,
    user: AuthUser,
    Payload(payload): Payload<SeedIdRequest>,
) -> Result<impl IntoResponse, AppError> {
    let game = create_active_game_from_seed(&state, &user.user_id, &payload.seed_id).await?;

    Ok((user.headers(), Json(game)))
}

pub async fn navigate_handler(
    AxumState(state): AppState,
    user: AuthUser,
    Payload(payload): Payload<NavigateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut game = get_active_game(state.store.as_ref(), &payload.id).await?;
    ensure_owner(&game.user_id, &user)?;

    if !payload.from_url.same_article(game.current_article())? {
        return Err(AppError::NotAtArticle(payload.from_url));
    }

    let linked = with_deadline(
        state.deadline(),
        state.validator.check_hop(&payload.from_url, &payload.to_url),
    )
    .await?;
    if !linked {
        return Err(AppError::InvalidMove(Rejection::IllegalNavigation {
            from: payload.from_url,
            to: payload.to_url,
        }));
    }

    let reached_end = payload.to_url.same_article(&game.ending_article_url)?;
    game.advance(payload.to_url);
    save_active_game(&state, &game).await?;

    Ok((user.headers(), Json(json!({ "reachedEnd": reached_end }))))
}

pub async fn validate_win_handler(
    AxumState(state): AppState,
    user: AuthUser,
    Payload(payload): Payload<ValidateWinRequest>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store.as_ref();
    let game = get_active_game(store, &payload.id).await?;
    ensure_owner(&game.user_id, &user)?;

    let verdict = with_deadline(
        state.deadline(),
        state.validator.validate(&payload.visited_urls, &game.spec()),
    )
    .await?;

    match verdict {
        Verdict::Valid => {
            let completed = create_completed_game(store, &game, payload.visited_urls).await?;
            delete_active_game(store, &game.id).await?;

            Ok((user.headers(), Json(completed)))
        }
        Verdict::Rejected(rejection) => {
            info!("Rejected win for game {}: {rejection}", game.id);
            Err(rejection.into())
        }
    }
}

pub async fn delete_active_handler(
    AxumState(state): AppState,
    user: AuthUser,
    Payload(payload): Payload<GameIdRequest>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store.as_ref();
    let game = get_active_game(store, &payload.id).await?;
    ensure_owner(&game.user_id, &user)?;

    delete_active_game(store, &game.id).await?;

    Ok((user.headers(), Json(json!({}))))
}

pub async fn completed_handler(
    AxumState(state): AppState,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let game = get_completed_game(state.store.as_ref(), &id).await?;
    ensure_owner(&game.user_id, &user)?;

    Ok((user.headers(), Json(game)))
}

pub async fn seed_from_completed_handler(
    AxumState(state): AppState,
    user: AuthUser,
    Payload(payload): Payload<CompletedGameRequest>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store.as_ref();
    let game = get_completed_game(store, &payload.game_id).await?;
    ensure_owner(&game.user_id, &user)?;

    if let Some(seed_id) = &game.created_from_seed {
        let seed = get_seeded_game(store, seed_id).await?;

        return Ok((StatusCode::OK, user.headers(), Json(seed)));
    }

    let seed = create_seeded_game_from_completed(store, &game).await?;

    Ok((StatusCode::CREATED, user.headers(), Json(seed)))
}

pub async fn create_seed_handler(
    AxumState(state): AppState,
    user: AuthUser,
    Payload(payload): Payload<CreateSeedRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.min_steps < 1 {
        return Err(AppError::MalformedPayload(
            "minSteps must be at least 1".to_string(),
        ));
    }
    payload.starting_article_url.normalized()?;
    payload.ending_article_url.normalized()?;

    let spec = GameSpec {
        start: payload.starting_article_url,
        end: payload.ending_article_url,
        min_steps: payload.min_steps,
    };
    let seed = create_seeded_game(state.store.as_ref(), spec, payload.category).await?;

    Ok((StatusCode::CREATED, user.headers(), Json(seed)))
}
