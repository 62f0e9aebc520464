use super::domain::{ArticulationMatrix, Course, CourseId, MarkRecord};
use super::program::ProgramSurveys;
use super::scheme::SchemeSettings;

/// Read-only access to the records the engine consumes. Storage lives elsewhere.
pub trait AttainmentRepository: Send + Sync {
    fn course(&self, id: &CourseId) -> Result<Option<Course>, RepositoryError>;
    fn marks(&self, id: &CourseId) -> Result<Vec<MarkRecord>, RepositoryError>;
    fn articulation_matrix(
        &self,
        id: &CourseId,
    ) -> Result<Option<ArticulationMatrix>, RepositoryError>;
    fn global_scheme_settings(&self) -> Result<Option<SchemeSettings>, RepositoryError>;

    /// Program-level survey results; stores without survey data report none.
    fn program_surveys(&self) -> Result<ProgramSurveys, RepositoryError> {
        Ok(ProgramSurveys::default())
    }
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
