use std::collections::BTreeMap;

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use crate::{
    application::error::HttpError,
    domain::tx::TransactionPayload,
};

use super::{HttpState, action::FrameAction, db_health_response};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct DonateTxQuery {
    address: String,
    amount: String,
    #[serde(rename = "chainId")]
    chain_id: String,
}

pub(super) async fn channel_stats(State(state): State<HttpState>) -> Response {
    match state.channel_stats.stats().await {
        Ok(stats) => Json(stats).into_response(),
        Err(err) => HttpError::from(err).into_response(),
    }
}

pub(super) async fn donate_tx(
    State(state): State<HttpState>,
    Query(query): Query<DonateTxQuery>,
    action: FrameAction,
) -> Response {
    if let Some(body) = &action.0
        && let Err(err) = state.gate.check(body).await
    {
        return HttpError::from(err).into_response();
    }

    match TransactionPayload::native_transfer(&query.address, &query.amount, &query.chain_id) {
        Ok(payload) => {
            info!(
                target = "framecard::http::donate",
                to = %payload.params.to,
                chain_id = %payload.chain_id,
                value = %payload.params.value,
                "built donation transaction"
            );
            Json(payload).into_response()
        }
        Err(err) => HttpError::from(err).into_response(),
    }
}

pub(super) async fn verify_message(State(state): State<HttpState>, action: FrameAction) -> Response {
    let Some(body) = action.0 else {
        return HttpError::new(
            "infra::http::verify_message",
            StatusCode::BAD_REQUEST,
            "Invalid frame action",
            "request body is not a frame action",
        )
        .json()
        .into_response();
    };

    match state.gate.check(&body).await {
        Ok(()) => Json(json!({ "status": "ok" })).into_response(),
        Err(err) => HttpError::from(err).into_response(),
    }
}

pub(super) async fn log_descriptor() -> Json<Value> {
    Json(json!({
        "type": "composer",
        "name": "MiniApp",
        "icon": "book",
        "description": "MiniApp Link",
        "imageUrl": "https://paragraph.xyz/branding/logo_no_text.png",
        "aboutUrl": "https://yup.live/changelog",
        "action": { "type": "post" }
    }))
}

pub(super) async fn log_submission(
    Query(query): Query<BTreeMap<String, String>>,
    body: Bytes,
) -> Json<Value> {
    let body = serde_json::from_slice::<Value>(&body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()));
    info!(target = "framecard::http::log", query = ?query, body = %body, "composer action logged");
    Json(json!({ "status": "ok" }))
}

pub(super) async fn db_health(State(state): State<HttpState>) -> Response {
    db_health_response(state.db.health_check().await)
}
