use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use tracing::warn;

use super::domain::CourseId;
use super::repository::AttainmentRepository;
use super::service::{AttainmentService, AttainmentServiceError, ProgramAttainmentRequest};

/// Router builder exposing course and program attainment endpoints.
pub fn attainment_router<R>(service: Arc<AttainmentService<R>>) -> Router
where
    R: AttainmentRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/courses/:course_id/attainment",
            get(course_attainment_handler::<R>),
        )
        .route(
            "/api/v1/programs/attainment",
            post(program_attainment_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn course_attainment_handler<R>(
    State(service): State<Arc<AttainmentService<R>>>,
    Path(course_id): Path<String>,
) -> Response
where
    R: AttainmentRepository + 'static,
{
    let course_id = CourseId(course_id);
    match service.compute_course_attainment(&course_id) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn program_attainment_handler<R>(
    State(service): State<Arc<AttainmentService<R>>>,
    axum::Json(request): axum::Json<ProgramAttainmentRequest>,
) -> Response
where
    R: AttainmentRepository + 'static,
{
    match service.compute_program_attainment(&request) {
        Ok(program) => (StatusCode::OK, axum::Json(program)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: AttainmentServiceError) -> Response {
    match error {
        AttainmentServiceError::CourseNotFound(_) => {
            let payload = json!({
                "error": "Course not found",
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        AttainmentServiceError::Repository(error) => {
            warn!(%error, "attainment request failed");
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
