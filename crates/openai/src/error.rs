use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("request to remote service failed: {0}")]
    Transport(String),
    #[error("remote service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not decode remote response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Transport-level failures are worth retrying; contract-level ones are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_)) || matches!(self, Self::Status { status, .. } if *status >= 500)
    }
}

#[cfg(test)]
mod tests {
    use super::ApiError;

    #[test]
    fn server_errors_and_transport_failures_are_retryable() {
        assert!(ApiError::Transport("connection reset".to_string()).is_retryable());
        assert!(ApiError::Status { status: 503, body: String::new() }.is_retryable());
        assert!(!ApiError::Status { status: 404, body: String::new() }.is_retryable());
        assert!(!ApiError::Decode("truncated".to_string()).is_retryable());
    }
}
