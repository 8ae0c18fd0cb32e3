//! Lenient extraction of frame action payloads.
//!
//! Frame routes always answer with a frame, so a missing or malformed body
//! is surfaced as `None` rather than as a rejection.

use std::convert::Infallible;

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use tracing::{info, warn};

use crate::application::verification::MessageGate;
use crate::domain::frame_action::FrameActionBody;

const SOURCE: &str = "framecard::http::frame";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameAction(pub Option<FrameActionBody>);

impl<S> FromRequest<S> for FrameAction
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let path = request.uri().path().to_string();

        let bytes = match Bytes::from_request(request, state).await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(target = SOURCE, path, error = %err, "frame action body unreadable");
                return Ok(Self(None));
            }
        };

        match serde_json::from_slice::<FrameActionBody>(&bytes) {
            Ok(body) => {
                info!(
                    target = SOURCE,
                    path,
                    fid = body.fid(),
                    button_index = ?body.untrusted_data.button_index,
                    input_text = ?body.input_text(),
                    "frame action"
                );
                Ok(Self(Some(body)))
            }
            Err(err) => {
                warn!(target = SOURCE, path, error = %err, "frame action body malformed");
                Ok(Self(None))
            }
        }
    }
}

impl FrameAction {
    /// The payload once it has passed the message gate.
    pub async fn verified(self, gate: &MessageGate) -> Option<FrameActionBody> {
        let body = self.0?;
        match gate.check(&body).await {
            Ok(()) => Some(body),
            Err(err) => {
                warn!(target = SOURCE, fid = body.fid(), error = %err, "frame action rejected");
                None
            }
        }
    }
}
