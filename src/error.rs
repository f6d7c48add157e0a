use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Returned by [`Signer::unsign`](crate::Signer::unsign). The session
    /// interface recovers from it with a fresh session.
    #[error("Session cookie signature is invalid")]
    BadSignature,
    #[error("Session serialization error: {0}")]
    Serialization(String),
    #[error("Session store error: {0}")]
    Store(String),
    #[error("Session configuration error: {0}")]
    Configuration(String),
    #[error("Session is unavailable because no secret key is configured")]
    Unavailable,
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::Serialization(err.to_string())
    }
}

#[cfg(feature = "redis_store")]
impl From<redis::RedisError> for SessionError {
    fn from(err: redis::RedisError) -> Self {
        SessionError::Store(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            SessionError::Store("connection refused".to_owned()).to_string(),
            "Session store error: connection refused"
        );
        assert_eq!(
            SessionError::BadSignature.to_string(),
            "Session cookie signature is invalid"
        );
    }

    #[test]
    fn test_from_serde_json_error() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let converted = SessionError::from(err);
        assert!(matches!(converted, SessionError::Serialization(_)));
    }
}
