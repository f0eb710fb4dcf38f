use thiserror::Error;

use crate::auth::token::TokenError;

/// Every failure a controller can surface, grouped by how the UI reacts to it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    /// Caught before any request was sent.
    #[error("{0}")]
    Validation(String),

    /// Credentials, OTP or token refused by a login endpoint.
    #[error("{0}")]
    Auth(String),

    /// Business-rule rejection (already voted, election closed, ineligible number...).
    #[error("Request rejected ({status}): {}", .message.as_deref().unwrap_or("no details"))]
    Rejected { status: u16, message: Option<String> },

    /// The service no longer accepts the session token.
    #[error("Session expired, please log in again")]
    Unauthorized,

    #[error("Service unavailable: {0}")]
    Transient(String),

    #[error("Invalid session token: {0}")]
    InvalidToken(#[from] TokenError),
}

impl ClientError {
    /// Text to show the user: the service's own words for domain rejections, `fallback`
    /// for anything else except validation messages, which are already user-facing.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Rejected { message: Some(message), .. } if !message.trim().is_empty() => {
                message.clone()
            }
            _ => fallback.to_string(),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transient(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_message_is_passed_through_verbatim() {
        let err = ClientError::Rejected {
            status: 409,
            message: Some("Already voted in this election".to_string()),
        };
        assert_eq!(err.user_message("Failed to vote"), "Already voted in this election");
    }

    #[test]
    fn everything_else_falls_back() {
        let blank = ClientError::Rejected { status: 400, message: Some("  ".to_string()) };
        assert_eq!(blank.user_message("Failed to vote"), "Failed to vote");
        assert_eq!(
            ClientError::Transient("connection refused".into()).user_message("Failed to vote"),
            "Failed to vote"
        );
        assert_eq!(
            ClientError::Auth("bad password".into()).user_message("Invalid Credentials"),
            "Invalid Credentials"
        );
    }
}
