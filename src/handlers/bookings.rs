use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use super::session::{authenticate, authenticate_write};
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, BookingRequest, EarningsSummary, Role};
use crate::services::scheduling;
use crate::state::AppState;

pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<BookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let caller = authenticate_write(&state, &headers)?;
    caller.require(&[Role::Customer])?;

    if body.customer_name.trim().is_empty() || body.customer_email.trim().is_empty() {
        return Err(AppError::BadRequest(
            "customer name and email are required".to_string(),
        ));
    }

    let booking = {
        let mut db = state.conn();
        scheduling::book_slot(&mut db, &body, caller.user_id).map_err(|e| {
            tracing::info!(slot_id = body.slot_id, error = %e, "booking rejected");
            e
        })?
    };
    Ok((StatusCode::CREATED, Json(booking)))
}

pub async fn cancel(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, AppError> {
    let caller = authenticate_write(&state, &headers)?;
    let mut db = state.conn();
    let booking = scheduling::cancel_booking(&mut db, id, caller.user_id, caller.role)?;
    Ok(Json(booking))
}

pub async fn for_customer(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(customer_id): Path<i64>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let caller = authenticate(&state, &headers)?;
    if !caller.is_admin() && caller.user_id != customer_id {
        return Err(AppError::Forbidden(
            "cannot view another customer's bookings".to_string(),
        ));
    }
    let db = state.conn();
    Ok(Json(queries::bookings_for_customer(&db, customer_id)?))
}

pub async fn for_provider(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Booking>>, AppError> {
    let caller = authenticate(&state, &headers)?;
    caller.require(&[Role::Provider])?;
    let db = state.conn();
    Ok(Json(queries::bookings_for_provider(&db, caller.user_id)?))
}

pub async fn provider_earnings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<EarningsSummary>, AppError> {
    let caller = authenticate(&state, &headers)?;
    caller.require(&[Role::Provider])?;
    let db = state.conn();
    Ok(Json(queries::earnings_for_provider(&db, caller.user_id)?))
}

/// Every booking, cancelled ones included. Admins only.
pub async fn all(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Booking>>, AppError> {
    let caller = authenticate(&state, &headers)?;
    caller.require(&[Role::Admin])?;
    let db = state.conn();
    Ok(Json(queries::all_bookings(&db)?))
}
