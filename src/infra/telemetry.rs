use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "framecard_cache_hit_total",
            Unit::Count,
            "Aggregate reads served from a fresh cached row."
        );
        describe_counter!(
            "framecard_cache_miss_total",
            Unit::Count,
            "Aggregate reads that computed inline because no usable row existed."
        );
        describe_counter!(
            "framecard_cache_stale_total",
            Unit::Count,
            "Aggregate reads served stale while a background refresh was scheduled."
        );
        describe_counter!(
            "framecard_background_failures_total",
            Unit::Count,
            "Background tasks that finished with an error, by task."
        );
        describe_counter!(
            "framecard_roast_requests_total",
            Unit::Count,
            "Roast frame requests, by outcome."
        );
        describe_counter!(
            "framecard_quota_rejections_total",
            Unit::Count,
            "Roast submissions rejected by the quota tracker, by scope."
        );
        describe_counter!(
            "framecard_upstream_failures_total",
            Unit::Count,
            "Upstream calls that failed and fell back to a default, by service."
        );
        describe_histogram!(
            "framecard_roast_generation_seconds",
            Unit::Seconds,
            "Time taken by the roast generator for successful generations."
        );
    });
}
