use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard};

use serde::{Deserialize, Serialize};

use super::domain::{ArticulationMatrix, Course, CourseId, MarkRecord};
use super::program::ProgramSurveys;
use super::repository::{AttainmentRepository, RepositoryError};
use super::scheme::SchemeSettings;

/// Everything one attainment run reads, as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub marks: Vec<MarkRecord>,
    #[serde(default)]
    pub matrices: BTreeMap<CourseId, ArticulationMatrix>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_scheme_settings: Option<SchemeSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_surveys: Option<ProgramSurveys>,
}

impl Snapshot {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let raw = fs::read(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&raw).map_err(|source| SnapshotError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        let mut encoded = serde_json::to_vec_pretty(self).map_err(SnapshotError::Encode)?;
        encoded.push(b'\n');
        fs::write(path, encoded).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn course(&self, id: &CourseId) -> Option<&Course> {
        self.courses.iter().find(|course| &course.id == id)
    }

    pub fn append_marks(&mut self, records: impl IntoIterator<Item = MarkRecord>) -> usize {
        let before = self.marks.len();
        self.marks.extend(records);
        self.marks.len() - before
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to access snapshot {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid snapshot {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Repository over an in-memory snapshot that can be swapped atomically.
#[derive(Debug, Clone, Default)]
pub struct SnapshotRepository {
    snapshot: Arc<RwLock<Snapshot>>,
}

impl SnapshotRepository {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(snapshot)),
        }
    }

    pub fn replace(&self, snapshot: Snapshot) {
        let mut guard = self
            .snapshot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = snapshot;
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Snapshot>, RepositoryError> {
        self.snapshot
            .read()
            .map_err(|_| RepositoryError::Unavailable("snapshot lock poisoned".to_string()))
    }
}

impl AttainmentRepository for SnapshotRepository {
    fn course(&self, id: &CourseId) -> Result<Option<Course>, RepositoryError> {
        Ok(self.read()?.course(id).cloned())
    }

    fn marks(&self, id: &CourseId) -> Result<Vec<MarkRecord>, RepositoryError> {
        Ok(self
            .read()?
            .marks
            .iter()
            .filter(|record| &record.course_id == id)
            .cloned()
            .collect())
    }

    fn articulation_matrix(
        &self,
        id: &CourseId,
    ) -> Result<Option<ArticulationMatrix>, RepositoryError> {
        Ok(self.read()?.matrices.get(id).cloned())
    }

    fn global_scheme_settings(&self) -> Result<Option<SchemeSettings>, RepositoryError> {
        Ok(self.read()?.global_scheme_settings.clone())
    }

    fn program_surveys(&self) -> Result<ProgramSurveys, RepositoryError> {
        Ok(self.read()?.program_surveys.clone().unwrap_or_default())
    }
}
