//! Session state machine. Every transition consumes the current [`Session`]
//! and returns the next one, so the controller only performs side effects.

use serde::Serialize;
use shared::{
    domain::{LyricsInput, RequestGeneration},
    error::PredictionError,
    protocol::{PredictionRequest, PredictionResponse},
};

use crate::chart::{to_segments, ChartSegment};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Idle,
    Submitting,
    Succeeded {
        genre: String,
        segments: Vec<ChartSegment>,
    },
    Failed {
        message: String,
    },
}

impl SessionState {
    pub fn is_submitting(&self) -> bool {
        matches!(self, Self::Submitting)
    }
}

/// Why a submission or response left the session untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ignored {
    BlankLyrics,
    AlreadySubmitting,
}

/// A request the controller must send on behalf of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPrediction {
    pub generation: RequestGeneration,
    pub request: PredictionRequest,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    Succeeded,
    Failed(PredictionError),
    /// The response belongs to a submission that was reset or superseded.
    Stale {
        generation: RequestGeneration,
        current: RequestGeneration,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    lyrics: String,
    state: SessionState,
    generation: RequestGeneration,
}

impl Session {
    pub fn lyrics(&self) -> &str {
        &self.lyrics
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn generation(&self) -> RequestGeneration {
        self.generation
    }

    pub fn edit_lyrics(self, text: impl Into<String>) -> Self {
        Self {
            lyrics: text.into(),
            ..self
        }
    }

    /// Starts a submission. Blank lyrics and submissions made while a request
    /// is outstanding leave the session unchanged.
    pub fn submit(self, lyrics: impl Into<String>) -> (Self, Result<PendingPrediction, Ignored>) {
        if self.state.is_submitting() {
            return (self, Err(Ignored::AlreadySubmitting));
        }
        let lyrics = match LyricsInput::parse(lyrics) {
            Ok(lyrics) => lyrics,
            Err(_) => return (self, Err(Ignored::BlankLyrics)),
        };

        let generation = self.generation.next();
        let pending = PendingPrediction {
            generation,
            request: PredictionRequest::new(&lyrics),
        };
        let next = Self {
            lyrics: lyrics.into_inner(),
            state: SessionState::Submitting,
            generation,
        };
        (next, Ok(pending))
    }

    /// Applies the outcome of the request tagged `generation`. Outcomes for
    /// any other generation, or arriving when nothing is outstanding, are
    /// dropped.
    pub fn settle(
        self,
        generation: RequestGeneration,
        outcome: Result<PredictionResponse, PredictionError>,
    ) -> (Self, Settlement) {
        if generation != self.generation || !self.state.is_submitting() {
            let current = self.generation;
            return (
                self,
                Settlement::Stale {
                    generation,
                    current,
                },
            );
        }

        let outcome = outcome.and_then(|response| {
            response
                .validate()
                .map(|()| response)
                .map_err(PredictionError::from)
        });

        match outcome {
            Ok(response) => {
                let segments = to_segments(&response.probabilities);
                let next = Self {
                    state: SessionState::Succeeded {
                        genre: response.genre,
                        segments,
                    },
                    ..self
                };
                (next, Settlement::Succeeded)
            }
            Err(err) => {
                let next = Self {
                    state: SessionState::Failed {
                        message: err.to_string(),
                    },
                    ..self
                };
                (next, Settlement::Failed(err))
            }
        }
    }

    /// Clears lyrics and any outcome. The generation advances so a request
    /// still on the wire can no longer settle this session.
    pub fn reset(self) -> Self {
        Self {
            lyrics: String::new(),
            state: SessionState::Idle,
            generation: self.generation.next(),
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
