use super::common::*;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

use crate::attainment::router::course_attainment_handler;
use crate::attainment::{attainment_router, AttainmentService};

#[tokio::test]
async fn course_route_returns_report_json() {
    let (service, _) = build_service();
    let router = attainment_router_with_service(service);

    let response = router
        .oneshot(
            Request::get("/api/v1/courses/C101/attainment")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["course_id"], json!("C101"));
    assert_eq!(payload["scheme_used"], json!("Failsafe Default"));
    assert_eq!(payload["co_attainment"][0]["co"], json!("CO1"));
    assert_eq!(payload["co_attainment"][0]["score_index"], json!(2.6));
    assert_eq!(payload["po_attainment"][0]["percentage"], json!(52.22));
}

#[tokio::test]
async fn course_route_returns_not_found_for_unknown_course() {
    let (service, _) = build_service();
    let router = attainment_router_with_service(service);

    let response = router
        .oneshot(
            Request::get("/api/v1/courses/C404/attainment")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        read_json_body(response).await,
        json!({"error": "Course not found"})
    );
}

#[tokio::test]
async fn course_handler_returns_internal_error_on_repository_failure() {
    let service = Arc::new(AttainmentService::new(Arc::new(UnavailableRepository)));

    let response = course_attainment_handler::<UnavailableRepository>(
        State(service),
        Path(COURSE.to_string()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .unwrap_or_default()
        .contains("database offline"));
}

#[tokio::test]
async fn program_route_rolls_up_requested_courses() {
    let (service, repository) = build_service();
    repository.put_surveys(surveys());
    let router = attainment_router(Arc::new(service));

    let response = router
        .oneshot(
            Request::post("/api/v1/programs/attainment")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::to_vec(&json!({"course_ids": [COURSE]})).expect("encode"),
                ))
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["weightage"], json!({"direct": 80.0, "indirect": 20.0}));
    assert_eq!(payload["outcomes"][0]["po"], json!("PO1"));
    assert_eq!(payload["outcomes"][0]["total"], json!(1.76));
    assert_eq!(payload["courses"][0]["course_id"], json!(COURSE));
}

#[tokio::test]
async fn program_route_rejects_unknown_courses() {
    let (service, _) = build_service();
    let router = attainment_router_with_service(service);

    let response = router
        .oneshot(
            Request::post("/api/v1/programs/attainment")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"course_ids": ["C404"]}"#))
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
