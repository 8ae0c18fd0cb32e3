use std::{process, sync::Arc};

use framecard::{
    application::{
        background::BackgroundTasks,
        channel_stats::ChannelStatsService,
        clock::{Clock, SystemClock},
        error::AppError,
        quota::{QuotaPolicy, QuotaTracker},
        roast::{RoastPolicy, RoastService},
        signup::SignupService,
        stale_cache::StaleCache,
        verification::MessageGate,
    },
    config,
    infra::{
        assets::ImageLibrary,
        db::PostgresRepositories,
        error::InfraError,
        http::{self, HttpState},
        telemetry,
        upstream::{
            ChannelDirectoryClient, GithubProfiles, HubClient, ReputationApi, RoastApi,
            build_client,
        },
    },
    presentation::frames::{DonationTarget, FrameCatalog},
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let tasks = BackgroundTasks::new();
    let state = build_http_state(repositories, tasks.clone(), &settings)?;

    let router = http::build_router(state);
    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "framecard::serve",
        addr = %settings.server.addr,
        public_host = %settings.frames.public_host,
        "frame server listening"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    let pending = tasks.in_flight();
    if pending > 0 {
        info!(target = "framecard::serve", pending, "waiting for background tasks");
    }
    if tokio::time::timeout(settings.server.graceful_shutdown, tasks.drain())
        .await
        .is_err()
    {
        warn!(
            target = "framecard::serve",
            pending = tasks.in_flight(),
            "background tasks still running at shutdown"
        );
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(target = "framecard::serve", error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!(target = "framecard::serve", "shutdown requested");
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_http_state(
    repositories: Arc<PostgresRepositories>,
    tasks: BackgroundTasks,
    settings: &config::Settings,
) -> Result<HttpState, AppError> {
    let upstream = &settings.upstream;
    let client = build_client(upstream.request_timeout).map_err(AppError::from)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let reputation = Arc::new(ReputationApi::new(
        client.clone(),
        upstream.reputation_base.clone(),
    ));
    let hub = Arc::new(HubClient::new(client.clone(), upstream.hub_base.clone()));

    let signup = SignupService::new(hub.clone(), reputation.clone(), reputation);
    let gate = MessageGate::new(hub, settings.verification.enforce);

    let quota = QuotaTracker::new(
        repositories.clone(),
        clock.clone(),
        QuotaPolicy {
            global_limit: settings.quota.global_limit,
            identity_limit: settings.quota.identity_limit,
            window: settings.quota.window,
        },
    );
    let roast = RoastService::new(
        repositories.clone(),
        quota,
        Arc::new(GithubProfiles::new(
            client.clone(),
            upstream.profile_proxy_url.clone(),
        )),
        Arc::new(RoastApi::new(
            client.clone(),
            upstream.roast_generator_url.clone(),
        )),
        tasks.clone(),
        RoastPolicy {
            reserved_profile: settings.frames.author_profile.clone(),
            generation_timeout: settings.roast.generation_timeout,
        },
    );

    let channel_stats = ChannelStatsService::new(
        StaleCache::new(repositories.clone(), clock.clone(), tasks),
        Arc::new(ChannelDirectoryClient::new(
            client,
            upstream.channel_directory_url.clone(),
        )),
        clock,
        settings.stats.stale_after,
    );

    let frames = FrameCatalog::new(
        settings.frames.public_host.clone(),
        settings.frames.author_link.clone(),
        DonationTarget {
            address: settings.frames.donation_address.clone(),
            amount: settings.frames.donation_amount.clone(),
            chain_id: settings.frames.donation_chain_id.clone(),
        },
    );

    Ok(HttpState {
        frames: Arc::new(frames),
        signup,
        roast,
        channel_stats,
        gate,
        images: ImageLibrary::new(settings.assets.directory.clone()),
        wrap_width: settings.roast.wrap_width,
        redirect_target: settings.frames.redirect_target.clone(),
        db: repositories,
    })
}
