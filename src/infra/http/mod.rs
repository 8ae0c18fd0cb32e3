mod action;
mod api;
mod frames;
mod images;
mod middleware;
mod roast;

pub use action::FrameAction;

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{Method, StatusCode, header},
    middleware::from_fn,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use sqlx::Error as SqlxError;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    application::{
        channel_stats::ChannelStatsService, error::ErrorReport, roast::RoastService,
        signup::SignupService, verification::MessageGate,
    },
    infra::{assets::ImageLibrary, db::PostgresRepositories},
    presentation::frames::FrameCatalog,
};

use middleware::{log_responses, set_request_context};

#[derive(Clone)]
pub struct HttpState {
    pub frames: Arc<FrameCatalog>,
    pub signup: SignupService,
    pub roast: RoastService,
    pub channel_stats: ChannelStatsService,
    pub gate: MessageGate,
    pub images: ImageLibrary,
    /// Characters per line when drawing roast text.
    pub wrap_width: usize,
    pub redirect_target: String,
    pub db: Arc<PostgresRepositories>,
}

pub fn build_router(state: HttpState) -> Router {
    let frame_routes = Router::new()
        .route("/", get(frames::index))
        .route(
            "/frame/score",
            get(frames::score_initial).post(frames::score_result),
        )
        .route(
            "/frame/eligible",
            get(frames::eligibility_initial).post(frames::eligibility_result),
        )
        .route("/frame/redirect/yup", get(frames::redirect_yup))
        .route(
            "/frame/donate",
            get(frames::donate_initial).post(frames::donate_result),
        )
        .route(
            "/frame/github-roast",
            get(roast::initial).post(roast::initial),
        )
        .route(
            "/frame/github-roast-generate",
            post(roast::generate),
        )
        .route(
            "/frame/github-roast/{profile}",
            get(roast::profile_view).post(roast::profile_submit),
        );

    let asset_routes = Router::new()
        .route("/images/static/{id}", get(images::static_image))
        .route("/images/static/gh-frame/{id}", get(images::roast_image))
        .route("/images/score/address/{address}", get(images::score_image));

    let api_routes = Router::new()
        .route("/api/channels-stats", get(api::channel_stats))
        .route("/frame/donate-tx", post(api::donate_tx))
        .route("/verify-message", post(api::verify_message))
        .route("/log", get(api::log_descriptor).post(api::log_submission))
        .route("/_health/db", get(api::db_health));

    frame_routes
        .merge(asset_routes)
        .merge(api_routes)
        .with_state(state)
        .layer(cors_layer())
        .layer(from_fn(log_responses))
        .layer(from_fn(set_request_context))
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(3600))
}

fn db_health_response(result: Result<(), SqlxError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
