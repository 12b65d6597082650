// src/handlers/report.rs

use std::sync::Arc;

use axum::{
    Form, Json,
    extract::State,
    http::header,
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    error::AppError,
    models::exam::ExamForm,
    omr::OmrEngine,
    report,
    store::ExamStore,
    utils::sanitize::validate_component,
};

/// Grades every uploaded sheet against the stored solution and persists the
/// JSON and CSV report artifacts.
///
/// 404 when the exam itself is missing; every other precondition failure
/// (missing subdirectory, empty listing, unreadable key, empty batch)
/// surfaces as a 500 carrying the generator's message.
pub async fn generate_report(
    State(store): State<ExamStore>,
    State(omr): State<Arc<dyn OmrEngine>>,
    Form(form): Form<ExamForm>,
) -> Result<impl IntoResponse, AppError> {
    let exam_name = validate_component(&form.exam_name)?;

    let report = report::generate(&store, omr.as_ref(), exam_name)
        .await
        .map_err(|err| {
            tracing::error!("report generation for '{}' failed: {}", exam_name, err);
            err
        })?;

    tracing::info!(
        "graded {} answer sheet(s) for exam '{}'",
        report.len(),
        exam_name
    );
    Ok(Json(json!({"success": "Report generated"})))
}

/// Returns the parsed `report.json` of an exam.
pub async fn get_report(
    State(store): State<ExamStore>,
    Form(form): Form<ExamForm>,
) -> Result<impl IntoResponse, AppError> {
    let exam_name = validate_component(&form.exam_name)?;
    if !store.exam_exists(exam_name).await {
        return Err(AppError::NotFound(format!(
            "Exam '{}' does not exist",
            exam_name
        )));
    }

    let report = store.read_report(exam_name).await?;
    Ok(Json(json!({ "report": report })))
}

/// Returns `report.csv` as a file download.
pub async fn download_report(
    State(store): State<ExamStore>,
    Form(form): Form<ExamForm>,
) -> Result<impl IntoResponse, AppError> {
    let exam_name = validate_component(&form.exam_name)?;
    if !store.exam_exists(exam_name).await {
        return Err(AppError::NotFound(format!(
            "Exam '{}' does not exist",
            exam_name
        )));
    }

    let csv = store.read_report_csv(exam_name).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"report.csv\"",
            ),
        ],
        csv,
    ))
}
