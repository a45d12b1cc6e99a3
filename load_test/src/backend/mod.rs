//! Stub todo backend
//!
//! Serves the read side of the todo API from memory so the driver can be
//! pointed at something locally:
//!
//! - `GET /todo/{id}`: `200` with the todo, or `404 {"error":"todo not found"}`
//! - `GET /todos`: `200` with every todo, ordered by id

pub mod model;
pub mod store;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use self::model::ErrorBody;
use self::store::TodoStore;
use crate::error::LoadTestError;

#[derive(Debug, Clone)]
pub struct BackendState {
    store: Arc<TodoStore>,
    /// Added to every response
    latency: Option<Duration>,
}

impl BackendState {
    pub fn new(store: TodoStore, latency: Option<Duration>) -> Self {
        Self {
            store: Arc::new(store),
            latency,
        }
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

pub fn router(state: BackendState) -> Router {
    Router::new()
        .route("/todos", get(list_todos))
        .route("/todo/{id}", get(get_todo))
        .with_state(state)
}

async fn get_todo(State(state): State<BackendState>, Path(id): Path<String>) -> Response {
    state.delay().await;

    match state.store.get(&id) {
        Some(todo) => (StatusCode::OK, Json(todo.clone())).into_response(),
        None => {
            tracing::debug!(%id, "todo not found");
            (
                StatusCode::NOT_FOUND,
                Json(ErrorBody {
                    error: "todo not found".to_string(),
                }),
            )
                .into_response()
        }
    }
}

async fn list_todos(State(state): State<BackendState>) -> Response {
    state.delay().await;
    (StatusCode::OK, Json(state.store.list())).into_response()
}

pub async fn bind(addr: SocketAddr) -> Result<TcpListener, LoadTestError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| LoadTestError::Bind {
            addr: addr.to_string(),
            source,
        })
}

/// Serve until `shutdown` fires
pub async fn serve(
    listener: TcpListener,
    state: BackendState,
    shutdown: CancellationToken,
) -> Result<(), LoadTestError> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Todo backend listening on http://{}", addr);
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(LoadTestError::Serve)?;

    tracing::info!("Todo backend stopped");
    Ok(())
}
