use serde::Deserialize;

use crate::selection::SelectionError;

/// Coarse failure category shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    DoubleBooking,
    Auth,
    Unknown,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::DoubleBooking => "DOUBLE_BOOKING",
            ErrorKind::Auth => "AUTH_ERROR",
            ErrorKind::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("{0}")]
    Validation(#[from] SelectionError),

    #[error("{message}")]
    Api {
        status: u16,
        kind: ErrorKind,
        message: String,
    },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid response: {0}")]
    Decode(String),

    #[error("invalid client configuration: {0}")]
    Config(String),
}

/// `{ error?: string, message?: string }`
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Validation(_) => ErrorKind::Validation,
            ClientError::Api { kind, .. } => *kind,
            ClientError::Transport(_) | ClientError::Decode(_) | ClientError::Config(_) => {
                ErrorKind::Unknown
            }
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Builds an API error from a non-2xx response, keeping the backend
    /// message verbatim when the body carries one.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
        let message = parsed
            .message
            .or(parsed.error)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() || trimmed.starts_with('{') {
                    format!("request failed with status {status}")
                } else {
                    trimmed.to_string()
                }
            });

        ClientError::Api {
            status,
            kind: classify(status, &message),
            message,
        }
    }
}

pub fn classify(status: u16, message: &str) -> ErrorKind {
    if status == 409 || message.to_lowercase().contains("double booking") {
        return ErrorKind::DoubleBooking;
    }
    match status {
        401 | 403 => ErrorKind::Auth,
        400 | 422 => ErrorKind::Validation,
        _ => ErrorKind::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_status_is_double_booking() {
        let err = ClientError::from_response(409, r#"{"error":"slot taken"}"#);
        assert_eq!(err.kind(), ErrorKind::DoubleBooking);
        assert_eq!(err.to_string(), "slot taken");
    }

    #[test]
    fn test_double_booking_message_wins_over_status() {
        let body = r#"{"error":"Double booking detected: overlapping appointment exists."}"#;
        let err = ClientError::from_response(500, body);
        assert_eq!(err.kind(), ErrorKind::DoubleBooking);
        assert_eq!(
            err.to_string(),
            "Double booking detected: overlapping appointment exists."
        );
    }

    #[test]
    fn test_auth_statuses() {
        assert_eq!(classify(401, "unauthorized"), ErrorKind::Auth);
        assert_eq!(classify(403, "forbidden"), ErrorKind::Auth);
    }

    #[test]
    fn test_validation_and_unknown() {
        assert_eq!(classify(400, "missing slotId"), ErrorKind::Validation);
        assert_eq!(classify(500, "boom"), ErrorKind::Unknown);
        assert_eq!(classify(404, "not found"), ErrorKind::Unknown);
    }

    #[test]
    fn test_message_preferred_over_error_field() {
        let err = ClientError::from_response(400, r#"{"error":"Bad Request","message":"email is required"}"#);
        assert_eq!(err.to_string(), "email is required");
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_plain_text_and_empty_bodies() {
        assert_eq!(ClientError::from_response(502, "upstream down").to_string(), "upstream down");
        assert_eq!(
            ClientError::from_response(500, "").to_string(),
            "request failed with status 500"
        );
        assert_eq!(
            ClientError::from_response(500, "{}").to_string(),
            "request failed with status 500"
        );
    }

    #[test]
    fn test_selection_errors_are_validation() {
        let err = ClientError::from(SelectionError::EmptySelection);
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.kind().code(), "VALIDATION_ERROR");
    }
}
