use crate::actions::{self, ActionRegistry, Tracker};
use crate::config::Settings;
use crate::tmdb::{TmdbApi, TmdbClient};
use anyhow::Result;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{info, warn};

const MAX_BODY_BYTES: usize = 1024 * 1024; // 1MB safety cap

#[derive(Clone)]
pub struct AppState {
    pub tmdb: Arc<dyn TmdbApi>,
    pub actions: Arc<ActionRegistry>,
}

impl AppState {
    pub fn new(tmdb: Arc<dyn TmdbApi>, settings: &Settings) -> Self {
        Self {
            tmdb,
            actions: Arc::new(ActionRegistry::standard(&settings.region())),
        }
    }
}

/// Body of an action call from the dialogue engine.
#[derive(Debug, Deserialize)]
pub struct ActionCall {
    pub next_action: String,
    #[serde(default)]
    pub sender_id: Option<String>,
    #[serde(default)]
    pub tracker: Tracker,
}

pub async fn run_server(settings: Settings) -> Result<()> {
    let tmdb: Arc<dyn TmdbApi> = Arc::new(TmdbClient::new(&settings)?);
    if !tmdb.has_credential() {
        warn!("TMDB_API_KEY is not set; every lookup will answer with the missing-key notice");
    }
    let state = AppState::new(tmdb, &settings);
    info!(
        "Serving {} actions (language {}, region {})",
        state.actions.names().count(),
        settings.language,
        settings.region()
    );

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(handle_webhook))
        .route("/actions", get(list_actions))
        .route("/health", get(health))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_actions(State(state): State<AppState>) -> Json<Value> {
    let names: Vec<Value> = state
        .actions
        .names()
        .map(|name| json!({ "name": name }))
        .collect();
    Json(Value::Array(names))
}

async fn handle_webhook(State(state): State<AppState>, body: Bytes) -> (StatusCode, Json<Value>) {
    let mut call: ActionCall = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            warn!("Rejecting request: invalid action call body: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": format!("Invalid action call: {e}") })),
            );
        }
    };
    if call.tracker.sender_id.is_none() {
        call.tracker.sender_id = call.sender_id.clone();
    }

    let Some(action) = state.actions.get(&call.next_action) else {
        warn!(action = %call.next_action, "No registered action with this name");
        return (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": format!("No registered action found for name '{}'.", call.next_action),
                "action_name": call.next_action,
            })),
        );
    };

    let (events, responses) =
        actions::run_action(action, state.tmdb.as_ref(), &call.tracker).await;
    (
        StatusCode::OK,
        Json(json!({ "events": events, "responses": responses })),
    )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
