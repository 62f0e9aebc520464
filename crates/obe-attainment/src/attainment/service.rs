use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use super::cache::{snapshot_fingerprint, ReportCache};
use super::domain::{Course, CourseId};
use super::engine::AttainmentEngine;
use super::program::{rollup, ProgramAttainment, ProgramSurveys};
use super::report::AttainmentReport;
use super::repository::{AttainmentRepository, RepositoryError};
use super::scheme::{
    course_scheme_applies, resolve_scheme, ResolvedScheme, Weightage,
    WeightageSettings,
};

/// Service composing the repository, scheme resolution and the attainment engine.
pub struct AttainmentService<R> {
    repository: Arc<R>,
    cache: Option<ReportCache>,
}

impl<R> AttainmentService<R>
where
    R: AttainmentRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            cache: None,
        }
    }

    /// Same service, memoizing reports per course while inputs are unchanged.
    pub fn with_cache(repository: Arc<R>) -> Self {
        Self {
            repository,
            cache: Some(ReportCache::default()),
        }
    }

    /// Number of memoized course reports; always zero without a cache.
    pub fn cached_reports(&self) -> usize {
        self.cache.as_ref().map_or(0, ReportCache::len)
    }

    /// Compute the CO and PO attainment report for a course.
    pub fn compute_course_attainment(
        &self,
        course_id: &CourseId,
    ) -> Result<AttainmentReport, AttainmentServiceError> {
        let course = self
            .repository
            .course(course_id)?
            .ok_or_else(|| AttainmentServiceError::CourseNotFound(course_id.clone()))?;

        let scheme = self.resolve_scheme(&course);
        let marks = self.repository.marks(course_id)?;
        let matrix = self.repository.articulation_matrix(course_id)?;
        if matrix.is_none() {
            warn!(%course_id, "no articulation matrix; po attainment left empty");
        }

        let fingerprint = match &self.cache {
            Some(cache) => match snapshot_fingerprint(&course, &marks, matrix.as_ref(), &scheme) {
                Ok(fingerprint) => {
                    if let Some(report) = cache.get(course_id, &fingerprint) {
                        debug!(%course_id, "serving cached attainment report");
                        return Ok(report);
                    }
                    Some(fingerprint)
                }
                Err(error) => {
                    warn!(%course_id, %error, "unable to fingerprint inputs; skipping cache");
                    None
                }
            },
            None => None,
        };

        let engine = AttainmentEngine::new(scheme);
        let report = engine.evaluate(&course, &marks, matrix.as_ref());
        debug!(
            %course_id,
            scheme = %report.scheme_used,
            outcomes = report.co_attainment.len(),
            "course attainment computed"
        );

        if let (Some(cache), Some(fingerprint)) = (&self.cache, fingerprint) {
            cache.insert(fingerprint, report.clone());
        }

        Ok(report)
    }

    /// Roll several course reports up to program level.
    pub fn compute_program_attainment(
        &self,
        request: &ProgramAttainmentRequest,
    ) -> Result<ProgramAttainment, AttainmentServiceError> {
        let reports = request
            .course_ids
            .iter()
            .map(|course_id| self.compute_course_attainment(course_id))
            .collect::<Result<Vec<_>, _>>()?;

        let surveys = match &request.surveys {
            Some(surveys) => surveys.clone(),
            None => self.repository.program_surveys()?,
        };
        let weightage = request
            .weightage
            .as_ref()
            .map(Weightage::from)
            .unwrap_or_default();

        Ok(rollup(&reports, &surveys, weightage))
    }

    /// A failing global lookup degrades to the failsafe defaults instead of failing the call.
    fn resolve_scheme(&self, course: &Course) -> ResolvedScheme {
        if course_scheme_applies(course) {
            return resolve_scheme(course, None);
        }
        match self.repository.global_scheme_settings() {
            Ok(global) => resolve_scheme(course, global.as_ref()),
            Err(error) => {
                warn!(course_id = %course.id, %error, "global scheme lookup failed; using failsafe defaults");
                ResolvedScheme::failsafe()
            }
        }
    }
}

/// Program rollup request: which courses, optional survey override, optional weightage.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProgramAttainmentRequest {
    pub course_ids: Vec<CourseId>,
    #[serde(default)]
    pub surveys: Option<ProgramSurveys>,
    #[serde(default)]
    pub weightage: Option<WeightageSettings>,
}

/// Error raised by the attainment service.
#[derive(Debug, thiserror::Error)]
pub enum AttainmentServiceError {
    #[error("Course not found: {0}")]
    CourseNotFound(CourseId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
