//! # Wikirace Server
//!
//! HTTP API for a race across Wikipedia: a player gets a start and an end article
//! and must reach the end by following links only.
//!
//! - Games are generated by random walks over live article links, so every game is
//!   known to be winnable
//! - A claimed win is replayed hop by hop against the live link graph before it is
//!   recorded
//! - Completed games can be turned into seeds so other players can race the same pair
//!
//!
//!
//! # Routes
//!
//! | method | path | auth |
//! |---|---|---|
//! | GET | `/health` | no |
//! | POST | `/auth/register` | no |
//! | POST | `/auth/login` | no |
//! | POST | `/active/start` | yes |
//! | POST | `/active/startFromSeed` | yes |
//! | POST | `/active/navigate` | yes |
//! | POST | `/active/validateWin` | yes |
//! | DELETE | `/active` | yes |
//! | GET | `/completed/{id}` | yes |
//! | POST | `/seed/createFromCompletedGame` | yes |
//! | POST | `/admin/createSeed` | yes |
//!
//! Protected routes read `Authorization: Bearer <access>` and optionally
//! `X-Refresh-Token`. Rotated tokens come back in the same headers.
//!
//!
//!
//! # Infrastructure
//! - Redis holds every record, see [`database`]
//! - Wikipedia is reached through the MediaWiki API, never scraped
//! - Secrets are mounted under `/run/secrets`, see [`config`]
//!
//!
//!
//! # Setup
//!
//! View current docs.
//! ```sh
//! cargo doc --open
//! ```
//!
//! Run locally against a Redis on the default port.
//! ```sh
//! JWT_SECRET=dev JWT_REFRESH_SECRET=dev RUST_LOG=info cargo run -p wikirace
//! ```
use std::{sync::Arc, time::Duration};

use anyhow::Result;
use axum::{
    Router,
    http::{
        HeaderName, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{delete, get, post},
};
use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod games;
pub mod routes;
pub mod seeds;
pub mod state;
pub mod users;
pub mod utils;

use config::Config;
use routes::{
    completed_handler, create_seed_handler, delete_active_handler, health_handler,
    login_handler, navigate_handler, register_handler, seed_from_completed_handler,
    start_from_seed_handler, start_handler, validate_win_handler,
};
use state::State;
use utils::REFRESH_HEADER;

pub fn app(state: Arc<State>) -> Router {
    let token_headers: [HeaderName; 2] = [AUTHORIZATION, REFRESH_HEADER];

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION, REFRESH_HEADER])
        .expose_headers(token_headers)
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/health", get(health_handler))
        .route("/auth/register", post(register_handler))
        .route("/auth/login", post(login_handler))
        .route("/active/start", post(start_handler))
        .route("/active/startFromSeed", post(start_from_seed_handler))
        .route("/active/navigate", post(navigate_handler))
        .route("/active/validateWin", post(validate_win_handler))
        .route("/active", delete(delete_active_handler))
        .route("/completed/{id}", get(completed_handler))
        .route(
            "/seed/createFromCompletedGame",
            post(seed_from_completed_handler),
        )
        .route("/admin/createSeed", post(create_seed_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let config = Config::load()?;
    let state = State::new(config).await?;

    info!("Starting server...");
    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
