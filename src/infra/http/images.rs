use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bytes::Bytes;

use crate::{
    application::error::HttpError,
    infra::assets::{ImageSet, generated_response},
    presentation::images::{BaseImage, SVG_MIME, score_overlay},
};

use super::HttpState;

const SOURCE: &str = "infra::http::images::score_image";

pub(super) async fn static_image(State(state): State<HttpState>, Path(id): Path<String>) -> Response {
    state.images.serve(ImageSet::Frames, &id).await
}

pub(super) async fn roast_image(State(state): State<HttpState>, Path(id): Path<String>) -> Response {
    state.images.serve(ImageSet::Roast, &id).await
}

pub(super) async fn score_image(
    State(state): State<HttpState>,
    Path(address): Path<String>,
) -> Response {
    let score = state.signup.formatted_score(&address).await;

    let base = match state.images.score_base().await {
        Ok(base) => base,
        Err(err) => {
            return HttpError::from_error(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Image unavailable",
                &err,
            )
            .into_response();
        }
    };

    let image = BaseImage {
        bytes: &base.bytes,
        content_type: base.mime.as_ref(),
    };
    match score_overlay(&image, &score) {
        Ok(svg) => generated_response(Bytes::from(svg), SVG_MIME),
        Err(err) => HttpError::from_error(
            SOURCE,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Image unavailable",
            &err,
        )
        .into_response(),
    }
}
