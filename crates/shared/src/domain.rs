use serde::{Deserialize, Serialize};

use crate::error::PredictionError;

/// Lyrics accepted for submission: the trimmed text is non-empty.
///
/// The stored text is kept exactly as entered; trimming only decides
/// whether the input is acceptable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LyricsInput(String);

impl LyricsInput {
    pub fn parse(raw: impl Into<String>) -> Result<Self, PredictionError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(PredictionError::EmptyLyrics);
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<String> for LyricsInput {
    type Error = PredictionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<LyricsInput> for String {
    fn from(value: LyricsInput) -> Self {
        value.0
    }
}

/// Monotonic token identifying one submission within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RequestGeneration(pub u64);

impl RequestGeneration {
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}
