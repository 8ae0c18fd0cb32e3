use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use super::upstream::{MessageVerifier, UpstreamError};
use crate::domain::frame_action::FrameActionBody;

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("frame action carries no signed message")]
    Unsigned,
    #[error("signed message was rejected")]
    Rejected,
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// Runs the signature check on every frame action.
///
/// When `enforce` is off a failed check is only logged and the request
/// proceeds with the client-reported data.
#[derive(Clone)]
pub struct MessageGate {
    verifier: Arc<dyn MessageVerifier>,
    enforce: bool,
}

impl MessageGate {
    pub fn new(verifier: Arc<dyn MessageVerifier>, enforce: bool) -> Self {
        Self { verifier, enforce }
    }

    pub async fn check(&self, body: &FrameActionBody) -> Result<(), VerificationError> {
        match self.verify(body).await {
            Ok(()) => Ok(()),
            Err(err) if !self.enforce => {
                warn!(
                    target = "framecard::verification",
                    fid = body.fid(),
                    error = %err,
                    "frame message failed verification; continuing"
                );
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    async fn verify(&self, body: &FrameActionBody) -> Result<(), VerificationError> {
        let bytes = body.message_bytes().ok_or(VerificationError::Unsigned)?;
        if self.verifier.verify(bytes).await? {
            Ok(())
        } else {
            Err(VerificationError::Rejected)
        }
    }
}
