use std::{process, sync::Arc};

use canastra::{
    application::{
        error::AppError,
        ingest::IngestService,
        repos::{ImageStorage, PostsRepo, PostsWriteRepo, ScheduleRepo},
        schedule::ScheduleService,
    },
    config,
    domain::schedule::SystemClock,
    infra::{
        error::InfraError,
        generators::HttpGenerators,
        http::{self, AppState},
        store::RestStore,
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info};
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

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match cli_args.command {
        Some(config::Command::Serve(_)) | None => run_serve(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let store = Arc::new(RestStore::from_settings(&settings.store)?);
    if !store.is_configured() {
        info!(
            target = "canastra::boot",
            "serving without a configured store; all collections read as empty"
        );
    }

    let schedule_repo: Arc<dyn ScheduleRepo> = store.clone();
    let schedule = Arc::new(ScheduleService::new(schedule_repo, Arc::new(SystemClock)));

    let generators = Arc::new(HttpGenerators::from_settings(&settings.generators)?);
    let posts_write: Arc<dyn PostsWriteRepo> = store.clone();
    let ingest = Arc::new(IngestService::new(
        posts_write.clone(),
        generators,
        schedule.clone(),
        settings.site.base_url.clone(),
    ));

    let posts: Arc<dyn PostsRepo> = store.clone();
    let images: Arc<dyn ImageStorage> = store.clone();
    let state = AppState {
        posts,
        posts_write,
        images,
        ingest,
        schedule: schedule.clone(),
        admin_token: settings.admin.token.clone().map(Arc::from),
    };

    // Keep the local schedule-config cache reconciled against the durable
    // store on a fixed cadence.
    let reconcile_handle = {
        let schedule = schedule.clone();
        let cadence = settings.schedule.reconcile_cadence;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(cadence);
            interval.tick().await; // Skip the first immediate tick
            loop {
                interval.tick().await;
                schedule.reconcile().await;
            }
        })
    };

    let router = http::build_router(state);
    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "canastra::boot",
        addr = %settings.server.addr,
        "listening"
    );

    let result = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")));

    reconcile_handle.abort();
    let _ = reconcile_handle.await;

    result
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to install shutdown signal handler");
    }
}
