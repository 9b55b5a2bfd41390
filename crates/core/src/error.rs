//! Error taxonomy for starting and stopping a conversation.
//!
//! The `Display` output of the recoverable variants is the bare message
//! reported by the backend or the SDK, because it is shown verbatim to the
//! user in the error banner.

use thiserror::Error;

/// Message used when the token backend fails without an explanatory body.
pub const TOKEN_FETCH_FALLBACK: &str = "Failed to fetch conversation token";

/// Failures of the Token Client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// The backend answered, but not with a usable token.
    #[error("{0}")]
    Fetch(String),
    /// The request could not be completed (DNS, refused connection, timeout).
    #[error("{0}")]
    Network(String),
}

/// Failures reported by the conversational SDK.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The SDK rejected the token or could not negotiate a transport.
    #[error("{0}")]
    Start(String),
    /// Graceful termination failed. Never surfaced as a blocking error.
    #[error("{0}")]
    Close(String),
}

/// Any failure that can end a start or stop request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_shown_verbatim() {
        let err: CallError = TokenError::Fetch("server overloaded".into()).into();
        assert_eq!(err.to_string(), "server overloaded");

        let err: CallError = SessionError::Start("invalid token".into()).into();
        assert_eq!(err.to_string(), "invalid token");
    }

    #[test]
    fn test_from_conversions_keep_the_variant() {
        let err: CallError = TokenError::Network("connection refused".into()).into();
        assert!(matches!(err, CallError::Token(TokenError::Network(_))));

        let err: CallError = SessionError::Close("already gone".into()).into();
        assert!(matches!(err, CallError::Session(SessionError::Close(_))));
    }
}
