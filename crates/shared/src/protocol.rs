use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{domain::LyricsInput, error::ProtocolViolation};

/// Path of the prediction endpoint, relative to the service base URL.
pub const PREDICT_PATH: &str = "lyrics/predict";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub lyrics: String,
}

impl PredictionRequest {
    pub fn new(lyrics: &LyricsInput) -> Self {
        Self {
            lyrics: lyrics.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreProbability {
    pub genre: String,
    pub value: f64,
}

impl GenreProbability {
    pub fn new(genre: impl Into<String>, value: f64) -> Self {
        Self {
            genre: genre.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub genre: String,
    pub probabilities: Vec<GenreProbability>,
}

impl PredictionResponse {
    /// Builds a response from an already-parsed JSON body, checking the
    /// probability list before anything else.
    pub fn from_value(value: Value) -> Result<Self, ProtocolViolation> {
        let Value::Object(mut fields) = value else {
            return Err(ProtocolViolation::NotAnObject);
        };

        let entries = match fields.remove("probabilities") {
            Some(Value::Array(entries)) => entries,
            Some(_) => return Err(ProtocolViolation::ProbabilitiesNotAList),
            None => return Err(ProtocolViolation::MissingProbabilities),
        };

        let genre = match fields.remove("genre") {
            Some(Value::String(genre)) => genre,
            _ => return Err(ProtocolViolation::MissingGenre),
        };

        let probabilities = entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                serde_json::from_value::<GenreProbability>(entry).map_err(|err| {
                    ProtocolViolation::MalformedEntry {
                        index,
                        reason: err.to_string(),
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let response = Self {
            genre,
            probabilities,
        };
        response.validate()?;
        Ok(response)
    }

    /// Genres must be non-empty and unique; values must lie in [0, 1].
    /// The values are not required to sum to one.
    pub fn validate(&self) -> Result<(), ProtocolViolation> {
        let mut seen = HashSet::with_capacity(self.probabilities.len());
        for (index, entry) in self.probabilities.iter().enumerate() {
            if entry.genre.is_empty() {
                return Err(ProtocolViolation::EmptyGenreLabel { index });
            }
            if !seen.insert(entry.genre.as_str()) {
                return Err(ProtocolViolation::DuplicateGenre {
                    genre: entry.genre.clone(),
                });
            }
            if !entry.value.is_finite() || !(0.0..=1.0).contains(&entry.value) {
                return Err(ProtocolViolation::ValueOutOfRange {
                    genre: entry.genre.clone(),
                    value: entry.value,
                });
            }
        }
        Ok(())
    }
}

/// Error body a failing prediction service may attach to a non-success
/// status. Both fields are optional; anything else is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ServiceErrorBody {
    pub fn summary(&self) -> Option<&str> {
        self.message
            .as_deref()
            .filter(|message| !message.trim().is_empty())
            .or_else(|| {
                self.error
                    .as_deref()
                    .filter(|error| !error.trim().is_empty())
            })
    }
}
