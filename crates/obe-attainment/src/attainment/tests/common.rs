use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::{json, Value};

use crate::attainment::domain::{ArticulationMatrix, Course, CourseId, MarkRecord};
use crate::attainment::program::ProgramSurveys;
use crate::attainment::repository::{AttainmentRepository, RepositoryError};
use crate::attainment::scheme::SchemeSettings;
use crate::attainment::{attainment_router, AttainmentService};

pub(super) const COURSE: &str = "C101";

/// Theory course with one internal test and the end-of-term exam, both mapped to CO1 and CO2.
pub(super) fn course() -> Course {
    serde_json::from_value(json!({
        "id": COURSE,
        "code": "18CS51",
        "name": "Operating Systems",
        "cos": [{"id": "CO1"}, {"id": "CO2"}],
        "assessmentTools": [
            {
                "type": "Internal Assessment",
                "name": "Internal Assessment 1",
                "maxMarks": 30,
                "coDistribution": {"CO1": 15, "CO2": 15}
            },
            {
                "type": "Semester End Exam",
                "name": "Semester End Exam",
                "maxMarks": 100,
                "coDistribution": {"CO1": 50, "CO2": 50}
            }
        ],
        "settings": {
            "courseType": "Theory",
            "indirect_attainment": {"CO1": 3, "CO2": "2"}
        }
    }))
    .expect("course fixture parses")
}

/// Eight students. CO1 internal: 6 of 8 pass. CO2 internal: 4 of 8 pass. Exam: 5 of 8 pass.
pub(super) fn marks() -> Vec<MarkRecord> {
    let mut records = Vec::new();
    for student in 1..=8 {
        let co1 = if student <= 6 { 10 } else { 5 };
        let co2 = if student <= 4 { 10 } else { 3 };
        let exam = if student <= 5 { 60 } else { 30 };
        records.push(mark(
            student,
            "Internal Assessment 1",
            json!({"CO1": co1, "CO2": co2}),
        ));
        records.push(mark(student, "Semester End Exam", json!({"total": exam})));
    }
    records
}

pub(super) fn mark(student: u32, assessment: &str, scores: Value) -> MarkRecord {
    serde_json::from_value(json!({
        "studentId": format!("1RV21CS{student:03}"),
        "courseId": COURSE,
        "assessmentName": assessment,
        "scores": scores,
    }))
    .expect("mark fixture parses")
}

pub(super) fn matrix() -> ArticulationMatrix {
    serde_json::from_value(json!({
        "CO1": {"PO1": 3, "PO2": 2},
        "CO2": {"PO1": 1, "PO2": "-"}
    }))
    .expect("matrix fixture parses")
}

pub(super) fn surveys() -> ProgramSurveys {
    serde_json::from_value(json!({
        "exit_survey": {"PO1": 3},
        "employer_survey": {"PO1": 2, "PO3": 2.5},
        "alumni_survey": {}
    }))
    .expect("survey fixture parses")
}

pub(super) fn seeded_repository() -> MemoryRepository {
    let repository = MemoryRepository::default();
    repository.put_course(course());
    repository.put_marks(marks());
    repository.put_matrix(COURSE, matrix());
    repository
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    courses: Arc<Mutex<HashMap<CourseId, Course>>>,
    marks: Arc<Mutex<Vec<MarkRecord>>>,
    matrices: Arc<Mutex<HashMap<CourseId, ArticulationMatrix>>>,
    global: Arc<Mutex<Option<SchemeSettings>>>,
    surveys: Arc<Mutex<ProgramSurveys>>,
}

impl MemoryRepository {
    pub(super) fn put_course(&self, course: Course) {
        self.courses
            .lock()
            .expect("courses mutex poisoned")
            .insert(course.id.clone(), course);
    }

    pub(super) fn put_marks(&self, records: Vec<MarkRecord>) {
        self.marks
            .lock()
            .expect("marks mutex poisoned")
            .extend(records);
    }

    pub(super) fn put_matrix(&self, course_id: &str, matrix: ArticulationMatrix) {
        self.matrices
            .lock()
            .expect("matrix mutex poisoned")
            .insert(CourseId::from(course_id), matrix);
    }

    pub(super) fn put_global(&self, settings: SchemeSettings) {
        *self.global.lock().expect("global mutex poisoned") = Some(settings);
    }

    pub(super) fn put_surveys(&self, surveys: ProgramSurveys) {
        *self.surveys.lock().expect("survey mutex poisoned") = surveys;
    }
}

impl AttainmentRepository for MemoryRepository {
    fn course(&self, id: &CourseId) -> Result<Option<Course>, RepositoryError> {
        Ok(self
            .courses
            .lock()
            .expect("courses mutex poisoned")
            .get(id)
            .cloned())
    }

    fn marks(&self, id: &CourseId) -> Result<Vec<MarkRecord>, RepositoryError> {
        Ok(self
            .marks
            .lock()
            .expect("marks mutex poisoned")
            .iter()
            .filter(|record| &record.course_id == id)
            .cloned()
            .collect())
    }

    fn articulation_matrix(
        &self,
        id: &CourseId,
    ) -> Result<Option<ArticulationMatrix>, RepositoryError> {
        Ok(self
            .matrices
            .lock()
            .expect("matrix mutex poisoned")
            .get(id)
            .cloned())
    }

    fn global_scheme_settings(&self) -> Result<Option<SchemeSettings>, RepositoryError> {
        Ok(self.global.lock().expect("global mutex poisoned").clone())
    }

    fn program_surveys(&self) -> Result<ProgramSurveys, RepositoryError> {
        Ok(self.surveys.lock().expect("survey mutex poisoned").clone())
    }
}

/// Course data is served, but the global scheme store is down.
pub(super) struct GlobalOutageRepository(pub(super) MemoryRepository);

impl AttainmentRepository for GlobalOutageRepository {
    fn course(&self, id: &CourseId) -> Result<Option<Course>, RepositoryError> {
        self.0.course(id)
    }

    fn marks(&self, id: &CourseId) -> Result<Vec<MarkRecord>, RepositoryError> {
        self.0.marks(id)
    }

    fn articulation_matrix(
        &self,
        id: &CourseId,
    ) -> Result<Option<ArticulationMatrix>, RepositoryError> {
        self.0.articulation_matrix(id)
    }

    fn global_scheme_settings(&self) -> Result<Option<SchemeSettings>, RepositoryError> {
        Err(RepositoryError::Unavailable("settings store offline".to_string()))
    }
}

pub(super) struct UnavailableRepository;

impl AttainmentRepository for UnavailableRepository {
    fn course(&self, _id: &CourseId) -> Result<Option<Course>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn marks(&self, _id: &CourseId) -> Result<Vec<MarkRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn articulation_matrix(
        &self,
        _id: &CourseId,
    ) -> Result<Option<ArticulationMatrix>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn global_scheme_settings(&self) -> Result<Option<SchemeSettings>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn global_settings(value: Value) -> SchemeSettings {
    serde_json::from_value(value).expect("scheme settings parse")
}

pub(super) fn build_service() -> (AttainmentService<MemoryRepository>, MemoryRepository) {
    let repository = seeded_repository();
    let service = AttainmentService::new(Arc::new(repository.clone()));
    (service, repository)
}

pub(super) fn attainment_router_with_service(
    service: AttainmentService<MemoryRepository>,
) -> axum::Router {
    attainment_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
