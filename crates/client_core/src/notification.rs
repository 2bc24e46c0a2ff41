//! User-facing notices raised when a submission fails.

use shared::error::{FailureKind, PredictionError, TransportCause, INVALID_RESPONSE_MESSAGE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    kind: FailureKind,
    message: String,
    detail: String,
}

impl Notification {
    pub fn from_error(err: &PredictionError) -> Self {
        let message = match err {
            PredictionError::EmptyLyrics => "Enter some lyrics before predicting.".to_string(),
            PredictionError::InvalidResponse(_) => INVALID_RESPONSE_MESSAGE.to_string(),
            PredictionError::Transport {
                cause: TransportCause::Connect,
                ..
            } => "Prediction service unreachable; check the server URL and retry.".to_string(),
            PredictionError::Transport {
                cause: TransportCause::Timeout,
                ..
            } => "Prediction service timed out; retry in a moment.".to_string(),
            PredictionError::Transport { message, .. } => {
                format!("Prediction request failed: {message}")
            }
            PredictionError::Status { status, .. } => {
                format!("Prediction service error (HTTP {status}); retry later.")
            }
            PredictionError::Malformed { .. } => {
                "Prediction service sent an unreadable response.".to_string()
            }
        };

        Self {
            kind: err.kind(),
            message,
            detail: err.to_string(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Full error text, for logs or an expandable detail view.
    pub fn detail(&self) -> &str {
        &self.detail
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ProtocolViolation;

    #[test]
    fn connect_failures_suggest_checking_url() {
        let notice = Notification::from_error(&PredictionError::transport(
            TransportCause::Connect,
            "tcp connect error: Connection refused",
        ));
        assert_eq!(notice.kind(), FailureKind::Transport);
        assert!(notice.message().contains("unreachable"));
        assert!(notice.detail().contains("Connection refused"));
    }

    #[test]
    fn shape_failures_use_invalid_response_text() {
        let notice = Notification::from_error(&PredictionError::InvalidResponse(
            ProtocolViolation::MissingProbabilities,
        ));
        assert_eq!(notice.kind(), FailureKind::ResponseShape);
        assert_eq!(notice.message(), INVALID_RESPONSE_MESSAGE);
    }

    #[test]
    fn status_failures_name_the_code() {
        let notice = Notification::from_error(&PredictionError::Status {
            status: 503,
            detail: "Service Unavailable".to_string(),
        });
        assert!(notice.message().contains("HTTP 503"));
    }
}
