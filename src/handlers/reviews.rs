use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use super::session::{authenticate_write, Caller};
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{NewReview, Review, Role};
use crate::state::AppState;

/// Admins, the author, or the provider owning the reviewed resource.
fn can_modify(db: &rusqlite::Connection, caller: &Caller, review: &Review) -> Result<bool, AppError> {
    Ok(match caller.role {
        Role::Admin => true,
        Role::Customer => review.customer_id == caller.user_id,
        Role::Provider => queries::get_resource(db, review.resource_id)?
            .is_some_and(|r| r.provider_id == caller.user_id),
    })
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Path(resource_id): Path<i64>,
) -> Result<Json<Vec<Review>>, AppError> {
    let db = state.conn();
    Ok(Json(queries::list_reviews(&db, resource_id)?))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(resource_id): Path<i64>,
    Json(body): Json<NewReview>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    let caller = authenticate_write(&state, &headers)?;
    caller.require(&[Role::Customer])?;
    body.validate().map_err(AppError::BadRequest)?;

    let db = state.conn();
    if queries::get_resource(&db, resource_id)?.is_none() {
        return Err(AppError::NotFound("resource not found".to_string()));
    }
    let customer = queries::get_user(&db, caller.user_id)?
        .ok_or_else(|| AppError::Unauthorized("account no longer exists".to_string()))?;

    let review = queries::create_review(&db, resource_id, &customer, &body)?;
    tracing::info!(review_id = review.id, resource_id, rating = review.rating, "review posted");
    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(review_id): Path<i64>,
    Json(body): Json<NewReview>,
) -> Result<Json<Review>, AppError> {
    let caller = authenticate_write(&state, &headers)?;
    body.validate().map_err(AppError::BadRequest)?;

    let db = state.conn();
    let review = queries::get_review(&db, review_id)?
        .ok_or_else(|| AppError::NotFound("review not found".to_string()))?;
    if !can_modify(&db, &caller, &review)? {
        return Err(AppError::Forbidden("cannot edit this review".to_string()));
    }

    let review = queries::update_review(&db, review_id, &body)?
        .ok_or_else(|| AppError::NotFound("review not found".to_string()))?;
    tracing::info!(review_id, rating = review.rating, "review updated");
    Ok(Json(review))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(review_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let caller = authenticate_write(&state, &headers)?;

    let db = state.conn();
    let review = queries::get_review(&db, review_id)?
        .ok_or_else(|| AppError::NotFound("review not found".to_string()))?;

    if !can_modify(&db, &caller, &review)? {
        return Err(AppError::Forbidden("cannot delete this review".to_string()));
    }

    queries::delete_review(&db, review_id)?;
    tracing::info!(review_id, "review deleted");
    Ok(StatusCode::NO_CONTENT)
}
