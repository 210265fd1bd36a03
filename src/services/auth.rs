//! Session tokens and password hashing for the reference API.
//!
//! Token layout: `<user_id>.<ROLE>.<expires_unix>.<signature>` where the
//! signature is HMAC-SHA1 over everything before the last dot, base64url
//! without padding.

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2_hmac;
use sha1::Sha1;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::models::Role;

pub const SESSION_TTL_HOURS: i64 = 24;
const PBKDF2_ROUNDS: u32 = 20_000;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionClaims {
    pub user_id: i64,
    pub role: Role,
    pub expires_at: i64,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TokenError {
    #[error("malformed session token")]
    Malformed,
    #[error("invalid token signature")]
    BadSignature,
    #[error("session expired")]
    Expired,
    #[error("invalid signing key")]
    InvalidKey,
}

fn mac(secret: &str) -> Result<Hmac<Sha1>, TokenError> {
    Hmac::<Sha1>::new_from_slice(secret.as_bytes()).map_err(|_| TokenError::InvalidKey)
}

pub fn issue_token(
    secret: &str,
    user_id: i64,
    role: Role,
    now: DateTime<Utc>,
) -> Result<String, TokenError> {
    let expires_at = (now + Duration::hours(SESSION_TTL_HOURS)).timestamp();
    let payload = format!("{user_id}.{}.{expires_at}", role.as_str());

    let mut m = mac(secret)?;
    m.update(payload.as_bytes());
    let sig = URL_SAFE_NO_PAD.encode(m.finalize().into_bytes());

    Ok(format!("{payload}.{sig}"))
}

pub fn verify_token(
    secret: &str,
    token: &str,
    now: DateTime<Utc>,
) -> Result<SessionClaims, TokenError> {
    let (payload, sig) = token.rsplit_once('.').ok_or(TokenError::Malformed)?;
    let sig = URL_SAFE_NO_PAD
        .decode(sig)
        .map_err(|_| TokenError::Malformed)?;

    let mut m = mac(secret)?;
    m.update(payload.as_bytes());
    m.verify_slice(&sig).map_err(|_| TokenError::BadSignature)?;

    let mut parts = payload.split('.');
    let (Some(id), Some(role), Some(exp), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TokenError::Malformed);
    };

    let claims = SessionClaims {
        user_id: id.parse().map_err(|_| TokenError::Malformed)?,
        role: Role::parse(role).ok_or(TokenError::Malformed)?,
        expires_at: exp.parse().map_err(|_| TokenError::Malformed)?,
    };

    if claims.expires_at <= now.timestamp() {
        return Err(TokenError::Expired);
    }
    Ok(claims)
}

/// Random token for the double-submit CSRF cookie.
pub fn new_csrf_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// `pbkdf2-sha256$<rounds>$<salt>$<hash>`
pub fn hash_password(password: &str) -> String {
    let salt = uuid::Uuid::new_v4().simple().to_string();
    let hash = derive(password, &salt, PBKDF2_ROUNDS);
    format!("pbkdf2-sha256${PBKDF2_ROUNDS}${salt}${}", STANDARD_NO_PAD.encode(hash))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let parts: Vec<&str> = stored.split('$').collect();
    let [scheme, rounds, salt, expected] = parts.as_slice() else {
        return false;
    };
    if *scheme != "pbkdf2-sha256" {
        return false;
    }
    let Ok(rounds) = rounds.parse::<u32>() else {
        return false;
    };
    let Ok(expected) = STANDARD_NO_PAD.decode(expected) else {
        return false;
    };

    let actual = derive(password, salt, rounds);
    actual.len() == expected.len() && actual.ct_eq(expected.as_slice()).unwrap_u8() == 1
}

fn derive(password: &str, salt: &str, rounds: u32) -> [u8; 32] {
    let mut out = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), rounds, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-06-16T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_token_roundtrip() {
        let token = issue_token("secret", 42, Role::Provider, now()).unwrap();
        let claims = verify_token("secret", &token, now()).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.role, Role::Provider);
    }

    #[test]
    fn test_token_wrong_secret() {
        let token = issue_token("secret", 42, Role::Customer, now()).unwrap();
        assert_eq!(
            verify_token("other", &token, now()),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_token_tampered_role() {
        let token = issue_token("secret", 42, Role::Customer, now()).unwrap();
        let forged = token.replacen("CUSTOMER", "ADMIN", 1);
        assert_eq!(
            verify_token("secret", &forged, now()),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_token_expiry() {
        let token = issue_token("secret", 1, Role::Admin, now()).unwrap();
        let later = now() + Duration::hours(SESSION_TTL_HOURS);
        assert_eq!(verify_token("secret", &token, later), Err(TokenError::Expired));
    }

    #[test]
    fn test_token_garbage() {
        assert_eq!(verify_token("s", "nodots", now()), Err(TokenError::Malformed));
        assert_eq!(verify_token("s", "a.b.c.!!", now()), Err(TokenError::Malformed));
    }

    #[test]
    fn test_password_hashing() {
        let stored = hash_password("hunter22");
        assert!(stored.starts_with("pbkdf2-sha256$"));
        assert!(verify_password("hunter22", &stored));
        assert!(!verify_password("hunter23", &stored));
        assert!(!verify_password("hunter22", "plaintext"));
        // Truncated hash never matches
        let truncated = &stored[..stored.len() - 4];
        assert!(!verify_password("hunter22", truncated));
        // Salted: same password hashes differently
        assert_ne!(stored, hash_password("hunter22"));
    }

    #[test]
    fn test_csrf_tokens_are_unique() {
        assert_ne!(new_csrf_token(), new_csrf_token());
        assert_eq!(new_csrf_token().len(), 32);
    }
}
