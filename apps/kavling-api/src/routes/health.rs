use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::error::{ok, Envelope};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct Health {
    pub storage_ready: bool,
    pub storage_dir: String,
    pub loaded_files: Vec<&'static str>,
}

/// Always answers 200, even when storage failed to load.
pub async fn health(State(state): State<AppState>) -> Json<Envelope<Health>> {
    let loaded_files = state
        .store
        .snapshot()
        .map(|s| s.loaded_files())
        .unwrap_or_default();
    ok(Health {
        storage_ready: state.store.storage_ready(),
        storage_dir: state.store.storage_dir().display().to_string(),
        loaded_files,
    })
}
