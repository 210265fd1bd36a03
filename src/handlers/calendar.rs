use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};

use super::session::authenticate;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::Role;
use crate::services::calendar::generate_ics;
use crate::state::AppState;

pub async fn download_ics(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(booking_id): Path<i64>,
) -> Result<Response, AppError> {
    let caller = authenticate(&state, &headers)?;

    let booking = {
        let db = state.conn();
        let booking = queries::get_booking(&db, booking_id)?
            .ok_or_else(|| AppError::NotFound("booking not found".to_string()))?;

        let allowed = match caller.role {
            Role::Admin => true,
            Role::Customer => booking.customer_id == Some(caller.user_id),
            Role::Provider => queries::get_resource(&db, booking.resource_id)?
                .is_some_and(|r| r.provider_id == caller.user_id),
        };
        if !allowed {
            return Err(AppError::Forbidden("not your booking".to_string()));
        }
        booking
    };

    let ics = generate_ics(&booking);
    let filename = format!("booking-{booking_id}.ics");

    Ok((
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        ics,
    )
        .into_response())
}
