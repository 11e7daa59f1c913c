//! HTTP trigger for the "Sync Files" button.
//!
//! `POST /api/sync-files-to-raspberry-pi` runs one deploy and answers with
//! a JSON message. Failures are not itemized; the log has the details.

use crate::config::DeployConfig;
use crate::engine::DeployEngine;
use crate::transport::Connector;
use crate::{DeployError, Result};
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

pub const SYNC_ROUTE: &str = "/api/sync-files-to-raspberry-pi";

#[derive(Clone)]
pub struct AppState {
    config: Arc<DeployConfig>,
    connector: Arc<dyn Connector>,
}

impl AppState {
    pub fn new(config: DeployConfig, connector: Arc<dyn Connector>) -> Self {
        Self { config: Arc::new(config), connector }
    }
}

#[derive(Debug, Serialize)]
struct SyncResponse {
    message: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(SYNC_ROUTE, post(sync_files))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server is running on {}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn sync_files(State(state): State<AppState>) -> impl IntoResponse {
    info!("Starting file sync process...");

    // The deploy blocks on SSH I/O for its whole duration.
    let joined = tokio::task::spawn_blocking(move || {
        DeployEngine::new(&state.config, state.connector.as_ref()).run()
    })
    .await;

    let message = match joined {
        Ok(Ok(())) => {
            return (
                StatusCode::OK,
                Json(SyncResponse { message: "Files synced successfully".into() }),
            )
                .into_response();
        }
        Ok(Err(e @ DeployError::MissingCredential)) => {
            error!("Sync rejected: {}", e);
            e.to_string()
        }
        Ok(Err(e)) => {
            error!("Error during file sync process: {}", e);
            "Failed to sync files".to_string()
        }
        Err(e) => {
            error!("Sync task failed: {}", e);
            "Failed to sync files".to_string()
        }
    };

    (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { error: message })).into_response()
}
