use axum::{
    extract::{Path, State},
    response::Response,
};
use tracing::error;

use crate::{
    application::roast::{RoastOutcome, RoastRequest, Submission},
    domain::frame_action::FrameActionBody,
    infra::assets::Asset,
    presentation::{
        frame::frame_response,
        images::{BaseImage, roast_overlay, svg_data_uri},
    },
};

use super::{HttpState, action::FrameAction};

const SOURCE: &str = "framecard::http::roast";

pub(super) async fn initial(State(state): State<HttpState>) -> Response {
    frame_response(&state.frames.roast_initial())
}

pub(super) async fn generate(State(state): State<HttpState>, action: FrameAction) -> Response {
    let input = action
        .0
        .as_ref()
        .and_then(|body| body.input_text())
        .unwrap_or_default()
        .to_string();
    let request = match action.verified(&state.gate).await {
        Some(body) => submission(input, &body),
        None => RoastRequest::view(input),
    };
    respond(&state, request).await
}

pub(super) async fn profile_view(
    State(state): State<HttpState>,
    Path(profile): Path<String>,
) -> Response {
    respond(&state, RoastRequest::view(profile)).await
}

pub(super) async fn profile_submit(
    State(state): State<HttpState>,
    Path(profile): Path<String>,
    action: FrameAction,
) -> Response {
    let request = match action.verified(&state.gate).await {
        Some(body) => submission(profile, &body),
        None => RoastRequest::view(profile),
    };
    respond(&state, request).await
}

fn submission(subject: String, body: &FrameActionBody) -> RoastRequest {
    RoastRequest::submit(
        subject,
        Submission {
            fid: body.fid(),
            cast_hash: body.cast_hash().map(str::to_string),
        },
    )
}

async fn respond(state: &HttpState, request: RoastRequest) -> Response {
    let outcome = state.roast.handle(request).await;

    let base = match &outcome {
        RoastOutcome::Ready { .. } => match state.images.roast_base().await {
            Ok(asset) => Some(asset),
            Err(err) => {
                error!(target = SOURCE, error = %err, "roast base image unreadable");
                None
            }
        },
        _ => None,
    };

    let frame = state
        .frames
        .roast_result(&outcome, |roast| render(base.as_ref()?, roast, state.wrap_width));
    frame_response(&frame)
}

fn render(base: &Asset, roast: &str, width: usize) -> Option<String> {
    let image = BaseImage {
        bytes: &base.bytes,
        content_type: base.mime.as_ref(),
    };
    match roast_overlay(&image, roast, width) {
        Ok(svg) => Some(svg_data_uri(&svg)),
        Err(err) => {
            error!(target = SOURCE, error = %err, "roast overlay failed");
            None
        }
    }
}
