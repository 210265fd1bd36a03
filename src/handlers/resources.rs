use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use super::session::authenticate_write;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{NewResource, Resource, Role};
use crate::state::AppState;

pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Resource>>, AppError> {
    let db = state.conn();
    Ok(Json(queries::list_resources(&db)?))
}

pub async fn get_one(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Resource>, AppError> {
    let db = state.conn();
    queries::get_resource(&db, id)?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("resource not found".to_string()))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<NewResource>,
) -> Result<(StatusCode, Json<Resource>), AppError> {
    let caller = authenticate_write(&state, &headers)?;
    caller.require(&[Role::Provider])?;
    body.validate().map_err(AppError::BadRequest)?;

    let resource = {
        let db = state.conn();
        queries::create_resource(&db, caller.user_id, &body)?
    };
    tracing::info!(resource_id = resource.id, provider_id = caller.user_id, "resource created");
    Ok((StatusCode::CREATED, Json(resource)))
}

/// Loads a resource and checks that `provider_id` owns it. Admins pass.
pub(super) fn owned_resource(
    db: &rusqlite::Connection,
    resource_id: i64,
    provider_id: i64,
    is_admin: bool,
) -> Result<Resource, AppError> {
    let resource = queries::get_resource(db, resource_id)?
        .ok_or_else(|| AppError::NotFound("resource not found".to_string()))?;
    if !is_admin && resource.provider_id != provider_id {
        return Err(AppError::Forbidden(
            "resource belongs to another provider".to_string(),
        ));
    }
    Ok(resource)
}
