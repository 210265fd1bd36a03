use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{AppendHeaders, IntoResponse};
use axum::Json;
use chrono::Utc;

use super::session::authenticate;
use crate::client::{SESSION_COOKIE, XSRF_COOKIE};
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{LoginRequest, RegisterRequest, Role, User};
use crate::services::auth::{
    hash_password, issue_token, new_csrf_token, verify_password, SESSION_TTL_HOURS,
};
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 6;

fn session_cookie(name: &str, value: &str, max_age: i64, http_only: bool, secure: bool) -> String {
    let mut cookie = format!("{name}={value}; Path=/; SameSite=Lax; Max-Age={max_age}");
    if http_only {
        cookie.push_str("; HttpOnly");
    }
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let name = body.name.trim();
    let email = body.email.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".to_string()));
    }
    if !email.contains('@') {
        return Err(AppError::BadRequest("a valid email is required".to_string()));
    }
    if body.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    let role = body.role.unwrap_or(Role::Customer);
    if role == Role::Admin {
        return Err(AppError::BadRequest(
            "admin accounts cannot be self-registered".to_string(),
        ));
    }

    let password_hash = hash_password(&body.password);
    let phone = body.phone.as_deref().map(str::trim).filter(|p| !p.is_empty());

    let user = {
        let db = state.conn();
        if queries::email_exists(&db, email)? {
            return Err(AppError::BadRequest("email is already registered".to_string()));
        }
        queries::create_user(&db, name, email, phone, role, &password_hash)?
    };

    tracing::info!(user_id = user.id, role = role.as_str(), "user registered");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let credentials = {
        let db = state.conn();
        queries::get_credentials(&db, body.email.trim())?
    };

    let user = match credentials {
        Some((user, hash)) if verify_password(&body.password, &hash) => user,
        _ => {
            tracing::info!(email = %body.email, "failed login");
            return Err(AppError::Unauthorized("invalid email or password".to_string()));
        }
    };

    let token = issue_token(&state.config.session_secret, user.id, user.role, Utc::now())
        .map_err(|e| AppError::Internal(e.into()))?;
    let max_age = SESSION_TTL_HOURS * 3600;
    let secure = state.config.secure_cookies;

    tracing::info!(user_id = user.id, "user logged in");
    Ok((
        AppendHeaders([
            (
                header::SET_COOKIE,
                session_cookie(SESSION_COOKIE, &token, max_age, true, secure),
            ),
            (
                header::SET_COOKIE,
                session_cookie(XSRF_COOKIE, &new_csrf_token(), max_age, false, secure),
            ),
        ]),
        Json(user),
    ))
}

pub async fn logout(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let secure = state.config.secure_cookies;
    (
        AppendHeaders([
            (
                header::SET_COOKIE,
                session_cookie(SESSION_COOKIE, "", 0, true, secure),
            ),
            (
                header::SET_COOKIE,
                session_cookie(XSRF_COOKIE, "", 0, false, secure),
            ),
        ]),
        Json(serde_json::json!({ "ok": true })),
    )
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<User>, AppError> {
    let caller = authenticate(&state, &headers)?;
    let db = state.conn();
    let user = queries::get_user(&db, caller.user_id)?
        .ok_or_else(|| AppError::Unauthorized("account no longer exists".to_string()))?;
    Ok(Json(user))
}
