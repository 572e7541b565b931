// Error taxonomy shared by both transports: server rejections, connection
// failures, timeouts and malformed replies.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("login failed with status: {status}{}", detail(.body))]
    Authentication { status: String, body: String },

    #[error("failed to send message: {status}{}", detail(.body))]
    Rejected { status: String, body: String },

    #[error("could not reach {addr}: {reason}")]
    Connect { addr: String, reason: String },

    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for server bodies carried in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

fn detail(body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!(" - {}", body)
    }
}

impl ApiError {
    /// Truncate a response body to avoid printing excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        let body = body.trim();
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    /// True when the server refused the request, as opposed to the request
    /// never completing.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            ApiError::Authentication { .. } | ApiError::Rejected { .. }
        )
    }
}
