use metrics_exporter_prometheus::PrometheusHandle;
use obe_attainment::attainment::{AttainmentService, Snapshot, SnapshotRepository};
use obe_attainment::error::AppError;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Loads the snapshot when one is configured; otherwise the service starts with no courses.
pub(crate) fn load_repository(path: Option<&Path>) -> Result<SnapshotRepository, AppError> {
    let Some(path) = path else {
        warn!("no snapshot configured; serving an empty course catalogue");
        return Ok(SnapshotRepository::default());
    };

    let snapshot = Snapshot::load(path)?;
    info!(
        path = %path.display(),
        courses = snapshot.courses.len(),
        marks = snapshot.marks.len(),
        "snapshot loaded"
    );
    Ok(SnapshotRepository::new(snapshot))
}

pub(crate) fn build_service(
    repository: SnapshotRepository,
    report_cache: bool,
) -> AttainmentService<SnapshotRepository> {
    let repository = Arc::new(repository);
    if report_cache {
        AttainmentService::with_cache(repository)
    } else {
        AttainmentService::new(repository)
    }
}
