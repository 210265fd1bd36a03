use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use super::resources::owned_resource;
use super::session::authenticate_write;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{AvailabilitySlot, NewSlot, Role, SlotStatusUpdate};
use crate::services::scheduling;
use crate::state::AppState;

pub async fn list(
    State(state): State<Arc<AppState>>,
    Path(resource_id): Path<i64>,
) -> Result<Json<Vec<AvailabilitySlot>>, AppError> {
    let db = state.conn();
    if queries::get_resource(&db, resource_id)?.is_none() {
        return Err(AppError::NotFound("resource not found".to_string()));
    }
    Ok(Json(queries::list_slots(&db, resource_id)?))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(resource_id): Path<i64>,
    Json(body): Json<NewSlot>,
) -> Result<(StatusCode, Json<AvailabilitySlot>), AppError> {
    let caller = authenticate_write(&state, &headers)?;
    caller.require(&[Role::Provider, Role::Admin])?;
    body.validate().map_err(AppError::BadRequest)?;

    let db = state.conn();
    owned_resource(&db, resource_id, caller.user_id, caller.is_admin())?;

    let clashes = queries::overlapping_slots(
        &db,
        resource_id,
        &body.date,
        &body.start_time,
        &body.end_time,
    )?;
    if !clashes.is_empty() {
        return Err(AppError::BadRequest(
            "slot overlaps an existing slot for this resource".to_string(),
        ));
    }

    let slot = queries::create_slot(&db, resource_id, &body)?;
    tracing::info!(slot_id = slot.id, resource_id, "slot created");
    Ok((StatusCode::CREATED, Json(slot)))
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(slot_id): Path<i64>,
    Json(body): Json<SlotStatusUpdate>,
) -> Result<Json<AvailabilitySlot>, AppError> {
    let caller = authenticate_write(&state, &headers)?;
    caller.require(&[Role::Provider, Role::Admin])?;

    let db = state.conn();
    let slot = queries::get_slot(&db, slot_id)?
        .ok_or_else(|| AppError::NotFound("slot not found".to_string()))?;
    owned_resource(&db, slot.resource_id, caller.user_id, caller.is_admin())?;

    let slot = scheduling::set_slot_status(&db, &slot, body.status, body.reason.as_deref())?;
    tracing::info!(slot_id, status = %slot.status, "slot status changed");
    Ok(Json(slot))
}
