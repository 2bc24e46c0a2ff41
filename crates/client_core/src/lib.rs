use async_trait::async_trait;
use shared::{
    error::PredictionError,
    protocol::{PredictionRequest, PredictionResponse},
};

pub mod chart;
pub mod controller;
pub mod notification;
pub mod session;
pub mod transport;

pub use chart::{to_segments, ChartSegment, PALETTE};
pub use controller::{PredictionController, SubmitOutcome};
pub use notification::Notification;
pub use session::{Ignored, SessionState};
pub use transport::HttpPredictionService;

/// Source of genre predictions. The HTTP client is the production
/// implementation; tests substitute scripted services.
#[async_trait]
pub trait PredictionService: Send + Sync {
    async fn predict(
        &self,
        request: &PredictionRequest,
    ) -> Result<PredictionResponse, PredictionError>;
}

#[derive(Debug, Clone)]
pub enum ClientEvent {
    StateChanged(SessionState),
    Notification(Notification),
}
