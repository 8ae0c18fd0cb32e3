use std::error::Error as StdError;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    application::{stale_cache::CacheError, verification::VerificationError},
    domain::tx::TxError,
    infra::error::InfraError,
};

#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyFormat {
    Text,
    Json,
}

#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    public_message: &'static str,
    report: ErrorReport,
    format: BodyFormat,
}

impl HttpError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        let report = ErrorReport::from_message(source, status, detail);
        Self {
            status,
            public_message,
            report,
            format: BodyFormat::Text,
        }
    }

    pub fn from_error(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        error: &dyn StdError,
    ) -> Self {
        let report = ErrorReport::from_error(source, status, error);
        Self {
            status,
            public_message,
            report,
            format: BodyFormat::Text,
        }
    }

    /// Render the public message as `{"error": ...}` instead of plain text.
    pub fn json(mut self) -> Self {
        self.format = BodyFormat::Json;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let mut response = match self.format {
            BodyFormat::Text => (self.status, self.public_message).into_response(),
            BodyFormat::Json => (
                self.status,
                Json(serde_json::json!({ "error": self.public_message })),
            )
                .into_response(),
        };
        self.report.attach(&mut response);
        response
    }
}

impl From<TxError> for HttpError {
    fn from(error: TxError) -> Self {
        let message = match error {
            TxError::InvalidAmount(_) => "Invalid amount",
            TxError::InvalidChain(_) => "Invalid chain id",
            TxError::InvalidAddress(_) => "Invalid address",
        };
        HttpError::from_error(
            "infra::http::tx_error_to_http_error",
            StatusCode::BAD_REQUEST,
            message,
            &error,
        )
        .json()
    }
}

impl From<CacheError> for HttpError {
    fn from(error: CacheError) -> Self {
        HttpError::from_error(
            "infra::http::cache_error_to_http_error",
            StatusCode::SERVICE_UNAVAILABLE,
            "Statistics temporarily unavailable",
            &error,
        )
        .json()
    }
}

impl From<VerificationError> for HttpError {
    fn from(error: VerificationError) -> Self {
        let status = match error {
            VerificationError::Upstream(_) => StatusCode::BAD_GATEWAY,
            VerificationError::Unsigned | VerificationError::Rejected => StatusCode::UNAUTHORIZED,
        };
        HttpError::from_error(
            "infra::http::verification_error_to_http_error",
            status,
            "Message verification failed",
            &error,
        )
        .json()
    }
}

/// Process-level failure reported by `main`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}
