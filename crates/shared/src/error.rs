use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message shown whenever a successful response does not carry a usable
/// probability distribution.
pub const INVALID_RESPONSE_MESSAGE: &str = "Invalid response from the server";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Validation,
    ResponseShape,
    Transport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportCause {
    Connect,
    Timeout,
    Other,
}

/// Ways a prediction payload can break the response contract.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProtocolViolation {
    #[error("response body is not a JSON object")]
    NotAnObject,
    #[error("response is missing the probabilities field")]
    MissingProbabilities,
    #[error("probabilities field is not a list")]
    ProbabilitiesNotAList,
    #[error("response is missing the predicted genre")]
    MissingGenre,
    #[error("probability entry {index} is malformed: {reason}")]
    MalformedEntry { index: usize, reason: String },
    #[error("probability entry {index} has an empty genre")]
    EmptyGenreLabel { index: usize },
    #[error("genre '{genre}' appears more than once")]
    DuplicateGenre { genre: String },
    #[error("probability for '{genre}' is outside [0, 1]: {value}")]
    ValueOutOfRange { genre: String, value: f64 },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    #[error("lyrics must not be empty")]
    EmptyLyrics,
    #[error("Invalid response from the server")]
    InvalidResponse(#[source] ProtocolViolation),
    #[error("failed to reach prediction service: {message}")]
    Transport {
        cause: TransportCause,
        message: String,
    },
    #[error("prediction service returned HTTP {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("malformed response from prediction service: {message}")]
    Malformed { message: String },
}

impl PredictionError {
    pub fn transport(cause: TransportCause, message: impl Into<String>) -> Self {
        Self::Transport {
            cause,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::EmptyLyrics => FailureKind::Validation,
            Self::InvalidResponse(_) => FailureKind::ResponseShape,
            Self::Transport { .. } | Self::Status { .. } | Self::Malformed { .. } => {
                FailureKind::Transport
            }
        }
    }
}

impl From<ProtocolViolation> for PredictionError {
    fn from(value: ProtocolViolation) -> Self {
        Self::InvalidResponse(value)
    }
}
