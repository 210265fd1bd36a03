use axum::http::{header, HeaderMap};
use chrono::Utc;
use subtle::ConstantTimeEq;

use crate::client::{SESSION_COOKIE, XSRF_COOKIE, XSRF_HEADER};
use crate::errors::AppError;
use crate::models::Role;
use crate::services::auth::verify_token;
use crate::state::AppState;

/// Who is making the request, from a verified session token.
#[derive(Debug, Clone, Copy)]
pub struct Caller {
    pub user_id: i64,
    pub role: Role,
    via_cookie: bool,
}

impl Caller {
    pub fn require(&self, roles: &[Role]) -> Result<(), AppError> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "{} accounts cannot do this",
                self.role.as_str().to_lowercase()
            )))
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

pub fn cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Resolves the caller from the `jwt` cookie, falling back to a bearer token.
pub fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Caller, AppError> {
    let (token, via_cookie) = match cookie(headers, SESSION_COOKIE).filter(|t| !t.is_empty()) {
        Some(token) => (token, true),
        None => match bearer(headers) {
            Some(token) => (token, false),
            None => return Err(AppError::Unauthorized("authentication required".to_string())),
        },
    };

    let claims = verify_token(&state.config.session_secret, token, Utc::now()).map_err(|e| {
        tracing::debug!(error = %e, "rejected session token");
        AppError::Unauthorized(e.to_string())
    })?;

    Ok(Caller {
        user_id: claims.user_id,
        role: claims.role,
        via_cookie,
    })
}

/// [`authenticate`] plus the double-submit CSRF check for cookie sessions.
pub fn authenticate_write(state: &AppState, headers: &HeaderMap) -> Result<Caller, AppError> {
    let caller = authenticate(state, headers)?;
    if caller.via_cookie {
        check_csrf(headers)?;
    }
    Ok(caller)
}

fn check_csrf(headers: &HeaderMap) -> Result<(), AppError> {
    let sent = headers.get(XSRF_HEADER).and_then(|v| v.to_str().ok());
    match (cookie(headers, XSRF_COOKIE), sent) {
        (Some(expected), Some(sent))
            if !expected.is_empty()
                && expected.as_bytes().ct_eq(sent.as_bytes()).unwrap_u8() == 1 =>
        {
            Ok(())
        }
        _ => {
            tracing::warn!("CSRF token missing or mismatched");
            Err(AppError::Forbidden("invalid CSRF token".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_cookie_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("a=1; jwt=x.y.z; XSRF-TOKEN=abc"),
        );
        assert_eq!(cookie(&headers, "jwt"), Some("x.y.z"));
        assert_eq!(cookie(&headers, "XSRF-TOKEN"), Some("abc"));
        assert_eq!(cookie(&headers, "missing"), None);
    }

    #[test]
    fn test_csrf_check() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("XSRF-TOKEN=abc"));
        assert!(check_csrf(&headers).is_err());

        headers.insert(XSRF_HEADER, HeaderValue::from_static("nope"));
        assert!(check_csrf(&headers).is_err());

        headers.insert(XSRF_HEADER, HeaderValue::from_static("abcd"));
        assert!(check_csrf(&headers).is_err());

        headers.insert(XSRF_HEADER, HeaderValue::from_static("abc"));
        assert!(check_csrf(&headers).is_ok());

        // An empty cookie never matches, not even an empty header
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("XSRF-TOKEN="));
        headers.insert(XSRF_HEADER, HeaderValue::from_static(""));
        assert!(check_csrf(&headers).is_err());
    }
}
