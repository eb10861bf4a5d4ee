//! REST API handlers

use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

/// Model catalog, initial selection and asset locations
pub async fn get_catalog(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.catalog.clone())
}

#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
    pub models: usize,
    pub uptime_secs: u64,
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        models: state.catalog.models.len(),
        uptime_secs: state.started.elapsed().as_secs(),
    })
}
