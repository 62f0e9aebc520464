use crate::cli::ServeArgs;
use crate::infra::{build_service, load_repository, AppState};
use crate::routes::with_attainment_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use obe_attainment::config::AppConfig;
use obe_attainment::error::AppError;
use obe_attainment::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(snapshot) = args.snapshot.take() {
        config.engine.snapshot_path = Some(snapshot);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = load_repository(config.engine.snapshot_path.as_deref())?;
    let attainment_service = Arc::new(build_service(repository, config.engine.report_cache));

    let app = with_attainment_routes(attainment_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        report_cache = config.engine.report_cache,
        "outcome attainment service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
