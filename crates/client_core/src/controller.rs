//! Prediction session controller: owns the session and performs the single
//! network call each submission needs.

use std::sync::Arc;

use shared::{
    domain::RequestGeneration,
    error::{PredictionError, TransportCause},
    protocol::PredictionResponse,
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};

use crate::{
    notification::Notification,
    session::{Ignored, PendingPrediction, Session, SessionState, Settlement},
    ClientEvent, PredictionService,
};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Nothing was sent.
    Ignored(Ignored),
    /// The request settled and the session now holds its outcome.
    Settled(SessionState),
    /// The request settled after a reset; its outcome was dropped.
    Discarded,
}

pub struct PredictionController {
    service: Arc<dyn PredictionService>,
    session: Mutex<Session>,
    events: broadcast::Sender<ClientEvent>,
}

impl PredictionController {
    pub fn new(service: Arc<dyn PredictionService>) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Arc::new(Self {
            service,
            session: Mutex::new(Session::default()),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub async fn state(&self) -> SessionState {
        self.session.lock().await.state().clone()
    }

    pub async fn lyrics(&self) -> String {
        self.session.lock().await.lyrics().to_string()
    }

    pub async fn set_lyrics(&self, text: impl Into<String>) {
        let text = text.into();
        self.transition(|session| (session.edit_lyrics(text), ())).await;
    }

    pub async fn reset(&self) {
        self.transition(|session| (session.reset(), ())).await;
        info!("prediction session reset");
    }

    /// Submits whatever lyrics are currently stored.
    pub async fn submit_current(self: &Arc<Self>) -> SubmitOutcome {
        let lyrics = self.lyrics().await;
        self.submit(lyrics).await
    }

    /// Runs one submission to completion. The request runs on its own task,
    /// so the session still settles if the caller stops polling.
    pub async fn submit(self: &Arc<Self>, lyrics: impl Into<String>) -> SubmitOutcome {
        let lyrics = lyrics.into();
        let (_, started) = self.transition(|session| session.submit(lyrics)).await;

        let pending = match started {
            Ok(pending) => pending,
            Err(reason) => {
                debug!(?reason, "submission ignored");
                return SubmitOutcome::Ignored(reason);
            }
        };

        info!(
            generation = pending.generation.0,
            lyrics_len = pending.request.lyrics.len(),
            "submitting lyrics for genre prediction"
        );

        let generation = pending.generation;
        let controller = Arc::clone(self);
        let task = tokio::spawn(async move { controller.run_prediction(pending).await });

        match task.await {
            Ok(outcome) => outcome,
            Err(join_err) => {
                error!(error = %join_err, "prediction task ended without settling");
                let err = PredictionError::transport(
                    TransportCause::Other,
                    format!("prediction task failed: {join_err}"),
                );
                self.settle(generation, Err(err)).await
            }
        }
    }

    async fn run_prediction(&self, pending: PendingPrediction) -> SubmitOutcome {
        let outcome = self.service.predict(&pending.request).await;
        self.settle(pending.generation, outcome).await
    }

    async fn settle(
        &self,
        generation: RequestGeneration,
        outcome: Result<PredictionResponse, PredictionError>,
    ) -> SubmitOutcome {
        let (state, settlement) = self
            .transition(|session| session.settle(generation, outcome))
            .await;

        match settlement {
            Settlement::Succeeded => {
                if let SessionState::Succeeded { genre, segments } = &state {
                    info!(
                        generation = generation.0,
                        genre = %genre,
                        categories = segments.len(),
                        "prediction succeeded"
                    );
                }
                SubmitOutcome::Settled(state)
            }
            Settlement::Failed(err) => {
                warn!(
                    generation = generation.0,
                    error = %err,
                    kind = ?err.kind(),
                    "prediction failed"
                );
                let _ = self
                    .events
                    .send(ClientEvent::Notification(Notification::from_error(&err)));
                SubmitOutcome::Settled(state)
            }
            Settlement::Stale {
                generation,
                current,
            } => {
                debug!(
                    generation = generation.0,
                    current = current.0,
                    "discarding response for stale submission"
                );
                SubmitOutcome::Discarded
            }
        }
    }

    /// Replaces the session with the one `step` returns and publishes the
    /// new state when it differs from the old one. Publishing happens under
    /// the lock so subscribers see states in the order they were applied.
    async fn transition<T>(
        &self,
        step: impl FnOnce(Session) -> (Session, T),
    ) -> (SessionState, T) {
        let mut guard = self.session.lock().await;
        let previous = guard.state().clone();
        let (next, output) = step(std::mem::take(&mut *guard));
        *guard = next;
        let state = guard.state().clone();

        if state != previous {
            let _ = self.events.send(ClientEvent::StateChanged(state.clone()));
        }
        drop(guard);
        (state, output)
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
