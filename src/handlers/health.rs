use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let db_ok = state
        .conn()
        .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
        .is_ok();
    Json(json!({ "status": "ok", "database": db_ok }))
}
