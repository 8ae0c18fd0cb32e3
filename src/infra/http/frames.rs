use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::{
    application::signup::Eligibility,
    presentation::{
        frame::frame_response,
        views::{FrameLinkView, IndexTemplate, render_template_response},
    },
};

use super::{HttpState, action::FrameAction};

pub(super) async fn index(State(state): State<HttpState>) -> Response {
    let frames = [
        ("Yup Score", "/frame/score"),
        ("Yup Signup Eligibility", "/frame/eligible"),
        ("Donate", "/frame/donate"),
        ("GitHub Roast", "/frame/github-roast"),
    ]
    .into_iter()
    .map(|(label, path)| FrameLinkView {
        label,
        href: state.frames.url(path),
    })
    .collect();

    render_template_response(IndexTemplate { frames }, StatusCode::OK)
}

pub(super) async fn score_initial(State(state): State<HttpState>) -> Response {
    frame_response(&state.frames.score_initial())
}

pub(super) async fn score_result(State(state): State<HttpState>, action: FrameAction) -> Response {
    let address = match action.verified(&state.gate).await {
        Some(body) => state.signup.address_for(body.fid()).await,
        None => None,
    };
    frame_response(&state.frames.score_result(address.as_deref()))
}

pub(super) async fn eligibility_initial(State(state): State<HttpState>) -> Response {
    frame_response(&state.frames.eligibility_initial())
}

pub(super) async fn eligibility_result(
    State(state): State<HttpState>,
    action: FrameAction,
) -> Response {
    let eligibility = match action.verified(&state.gate).await {
        Some(body) => state.signup.eligibility(body.fid()).await,
        None => Eligibility::NoAddress,
    };
    frame_response(&state.frames.eligibility_result(eligibility))
}

pub(super) async fn redirect_yup(State(state): State<HttpState>) -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, state.redirect_target.clone())],
    )
        .into_response()
}

pub(super) async fn donate_initial(State(state): State<HttpState>) -> Response {
    frame_response(&state.frames.donate_initial())
}

pub(super) async fn donate_result(State(state): State<HttpState>, action: FrameAction) -> Response {
    let sent = action
        .verified(&state.gate)
        .await
        .is_some_and(|body| body.transaction_id().is_some());
    frame_response(&state.frames.donate_result(sent))
}
