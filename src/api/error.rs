use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// No response received at all
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx response, carrying the server's message and status code
    #[error("{message} (status {status})")]
    Request { message: String, status: u16 },
}

/// Shape of the API's JSON error bodies
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Maximum length for a message lifted from an error body
const MAX_ERROR_MESSAGE_LENGTH: usize = 200;

impl ApiError {
    /// Build a `Request` error from a non-2xx status and its body.
    /// Prefers the JSON `message` field; falls back to a generic message
    /// when the body is not parseable.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) if !parsed.message.is_empty() => {
                let mut msg = parsed.message;
                if msg.len() > MAX_ERROR_MESSAGE_LENGTH {
                    msg.truncate(MAX_ERROR_MESSAGE_LENGTH);
                    msg.push_str("...");
                }
                msg
            }
            _ => format!("Request failed with status {}", status.as_u16()),
        };
        ApiError::Request {
            message,
            status: status.as_u16(),
        }
    }

    /// True for 401 responses, which force the session to be cleared
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Request { status: 401, .. })
    }

    /// The user-facing message, without the status suffix
    pub fn message(&self) -> String {
        match self {
            ApiError::Network(e) => format!("Network error: {}", e),
            ApiError::Request { message, .. } => message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_message_field_extracted() {
        let err = ApiError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"message": "Child name is required"}"#,
        );
        match err {
            ApiError::Request { message, status } => {
                assert_eq!(message, "Child name is required");
                assert_eq!(status, 400);
            }
            _ => panic!("expected Request error"),
        }
    }

    #[test]
    fn test_unparseable_body_falls_back() {
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>");
        assert_eq!(err.message(), "Request failed with status 500");
    }

    #[test]
    fn test_empty_message_falls_back() {
        let err = ApiError::from_status(StatusCode::NOT_FOUND, r#"{"message": ""}"#);
        assert_eq!(err.message(), "Request failed with status 404");
    }

    #[test]
    fn test_unauthorized_detection() {
        let err = ApiError::from_status(StatusCode::UNAUTHORIZED, "{}");
        assert!(err.is_unauthorized());
        let err = ApiError::from_status(StatusCode::FORBIDDEN, "{}");
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn test_long_message_truncated() {
        let long = format!(r#"{{"message": "{}"}}"#, "x".repeat(500));
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, &long);
        assert!(err.message().len() < 250);
        assert!(err.message().ends_with("..."));
    }
}
