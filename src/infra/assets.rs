//! Frame images served from the public asset directory.

use std::path::PathBuf;

use axum::{
    body::Body,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use mime_guess::Mime;
use tracing::warn;

use crate::application::error::ErrorReport;

/// Images addressed as `/images/static/{id}`.
const FRAME_IMAGES: &[(&str, &str)] = &[
    ("score-base", "yup-score-base.png"),
    ("score-error", "yup-score-error.png"),
    ("eligible-initial", "signup/yup-signup-check.png"),
    ("eligible-yes", "signup/yup-signup-yes.png"),
    ("eligible-no", "signup/yup-signup-no.png"),
    ("eligible-error-account", "signup/yup-signup-error-account.png"),
    ("eligible-error-no-fid", "signup/yup-signup-no-fid.png"),
    ("donate-initial", "donate/donate-initial.png"),
    ("donate-success", "donate/donate-success.png"),
    ("donate-error", "donate/donate-error.png"),
];

/// Images addressed as `/images/static/gh-frame/{id}`.
const ROAST_IMAGES: &[(&str, &str)] = &[
    ("base_init", "github/base_init.webp"),
    ("error_roast_not_found", "github/error_roast_not_found.webp"),
    ("error_invalid_gh_profile", "github/error_invalid_gh_profile.webp"),
    ("error_author", "github/error_author.webp"),
    ("error_loading", "github/error_loading.webp"),
    ("error_to_many_roasts_fid", "github/error_to_many_roasts_fid.webp"),
    ("error_to_many_roasts", "github/error_to_many_roasts.webp"),
];

const ROAST_BASE: &str = "github/base.png";
const SCORE_BASE: &str = "yup-score-result.png";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSet {
    Frames,
    Roast,
}

impl ImageSet {
    fn entries(self) -> &'static [(&'static str, &'static str)] {
        match self {
            ImageSet::Frames => FRAME_IMAGES,
            ImageSet::Roast => ROAST_IMAGES,
        }
    }

    /// Relative path for a public image id; unknown ids have none.
    pub fn resolve(self, id: &str) -> Option<&'static str> {
        self.entries()
            .iter()
            .find(|(name, _)| *name == id)
            .map(|(_, path)| *path)
    }
}

#[derive(Debug, Clone)]
pub struct Asset {
    pub bytes: Bytes,
    pub mime: Mime,
}

#[derive(Debug, Clone)]
pub struct ImageLibrary {
    root: PathBuf,
}

impl ImageLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn load(&self, relative: &str) -> std::io::Result<Asset> {
        let bytes = tokio::fs::read(self.root.join(relative)).await?;
        Ok(Asset {
            bytes: Bytes::from(bytes),
            mime: mime_guess::from_path(relative).first_or_octet_stream(),
        })
    }

    pub async fn roast_base(&self) -> std::io::Result<Asset> {
        self.load(ROAST_BASE).await
    }

    pub async fn score_base(&self) -> std::io::Result<Asset> {
        self.load(SCORE_BASE).await
    }

    pub async fn serve(&self, set: ImageSet, id: &str) -> Response {
        let Some(relative) = set.resolve(id) else {
            return not_found_response("infra::assets::serve");
        };

        match self.load(relative).await {
            Ok(asset) => asset.into_response(),
            Err(err) => {
                warn!(target = "framecard::assets", id, path = relative, error = %err, "image unreadable");
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                let mut response = (status, "Image unavailable").into_response();
                ErrorReport::from_error("infra::assets::serve", status, &err).attach(&mut response);
                response
            }
        }
    }
}

fn not_found_response(source: &'static str) -> Response {
    let mut response = (StatusCode::NOT_FOUND, "Not found").into_response();
    ErrorReport::from_message(source, StatusCode::NOT_FOUND, "Static image not found")
        .attach(&mut response);
    response
}

impl IntoResponse for Asset {
    fn into_response(self) -> Response {
        build_response(self.bytes, &self.mime)
    }
}

/// Uncached response for generated images.
pub fn generated_response(bytes: Bytes, mime: &str) -> Response {
    let mut response = Response::new(Body::from(bytes));
    if let Ok(value) = HeaderValue::from_str(mime) {
        response.headers_mut().insert(header::CONTENT_TYPE, value);
    }
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn build_response(bytes: Bytes, mime: &Mime) -> Response {
    let len = bytes.len();
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&len.to_string()) {
        headers.insert(header::CONTENT_LENGTH, value);
    }
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=3600"),
    );

    response
}
