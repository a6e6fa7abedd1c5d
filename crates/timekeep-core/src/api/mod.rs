//! Mock HTTP API.
//!
//! Demonstration endpoints over an in-memory registry of timer states,
//! plus optional static file serving for the offline shell. Nothing here is
//! persisted; the key-value store remains the only source of truth.

pub mod handlers;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};

use axum::{routing::get, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::worker::cache::{AssetCache, DirFetch};
use handlers::*;

/// One stored timer state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerStateRecord {
    pub id: String,
    pub state: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// In-memory records keyed by generated id.
#[derive(Debug, Default)]
pub struct Registry {
    records: RwLock<HashMap<String, TimerStateRecord>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self) -> Vec<TimerStateRecord> {
        let Ok(records) = self.records.read() else {
            return Vec::new();
        };
        let mut list: Vec<_> = records.values().cloned().collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        list
    }

    pub fn get(&self, id: &str) -> Option<TimerStateRecord> {
        self.records.read().ok()?.get(id).cloned()
    }

    pub fn create(&self, state: serde_json::Value) -> Option<TimerStateRecord> {
        let now = Utc::now();
        let record = TimerStateRecord {
            id: Uuid::new_v4().to_string(),
            state,
            created_at: now,
            updated_at: now,
        };
        self.records
            .write()
            .ok()?
            .insert(record.id.clone(), record.clone());
        Some(record)
    }

    pub fn update(&self, id: &str, state: serde_json::Value) -> Option<TimerStateRecord> {
        let mut records = self.records.write().ok()?;
        let record = records.get_mut(id)?;
        record.state = state;
        record.updated_at = Utc::now();
        Some(record.clone())
    }

    pub fn remove(&self, id: &str) -> Option<TimerStateRecord> {
        self.records.write().ok()?.remove(id)
    }
}

/// Shared state behind every handler.
pub struct ApiState {
    pub registry: Registry,
    pub assets: Option<Mutex<(AssetCache, DirFetch)>>,
}

impl ApiState {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            assets: None,
        }
    }

    /// Serve files under `root` for non-API paths.
    pub fn with_assets(mut self, root: impl Into<PathBuf>) -> Self {
        self.assets = Some(Mutex::new((AssetCache::new(), DirFetch::new(root))));
        self
    }
}

impl Default for ApiState {
    fn default() -> Self {
        Self::new()
    }
}

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route(
            "/api/timer-states",
            get(list_states_handler).post(create_state_handler),
        )
        .route(
            "/api/timer-states/:id",
            get(get_state_handler)
                .put(update_state_handler)
                .delete(delete_state_handler),
        )
        .fallback(asset_handler)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn registry_crud() {
        let registry = Registry::new();
        let created = registry.create(json!({ "kind": "countdown" })).unwrap();
        assert_eq!(registry.list().len(), 1);
        assert_eq!(registry.get(&created.id), Some(created.clone()));

        let updated = registry.update(&created.id, json!({ "kind": "egg" })).unwrap();
        assert_eq!(updated.state, json!({ "kind": "egg" }));
        assert!(updated.updated_at >= created.updated_at);

        assert!(registry.update("missing", json!(null)).is_none());
        assert!(registry.remove(&created.id).is_some());
        assert!(registry.get(&created.id).is_none());
    }
}
