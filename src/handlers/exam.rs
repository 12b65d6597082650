// src/handlers/exam.rs

use std::sync::Arc;

use axum::{
    Form, Json,
    body::Bytes,
    extract::{Multipart, Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    models::exam::{CreateExamRequest, ExamForm, ExamSummary},
    omr::OmrEngine,
    store::ExamStore,
    utils::sanitize::validate_component,
};

/// Creates a new exam folder with empty `images/` and `solution/`
/// subdirectories. 409 if the exam already exists.
pub async fn create_exam(
    State(store): State<ExamStore>,
    Json(payload): Json<CreateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    let exam_name = validate_component(&payload.exam_name)?;

    store.create_exam(exam_name).await?;
    tracing::info!("created exam '{}'", exam_name);

    Ok((StatusCode::CREATED, Json(json!({"success": "Exam created"}))))
}

/// Lists all exam names.
pub async fn get_exams(State(store): State<ExamStore>) -> Result<impl IntoResponse, AppError> {
    let exams = store.list_exams().await?;
    Ok(Json(json!({ "exams": exams })))
}

/// Returns the filenames stored for one exam: answer sheets and solution.
pub async fn get_exam(
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

    let summary = ExamSummary {
        images: store.list_images(exam_name).await?,
        solution: store.list_solution(exam_name).await?,
    };
    Ok(Json(summary))
}

/// Stores a batch of answer-sheet images under the exam's `images/` folder.
///
/// Multipart fields: `exam_name` (text) plus one `files` part per image.
/// Filenames come from the client and are validated before use; a re-upload
/// under an existing name overwrites it.
pub async fn upload_images(
    State(store): State<ExamStore>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut exam_name: Option<String> = None;
    let mut staged: Vec<(String, Bytes)> = Vec::new();

    // Field order in the body is client-controlled, so stage everything
    // before touching the store.
    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("exam_name") => exam_name = Some(field.text().await?),
            Some("files") => {
                let file_name = field.file_name().map(|s| s.to_string()).ok_or_else(|| {
                    AppError::BadRequest("Uploaded file is missing a filename".to_string())
                })?;
                staged.push((file_name, field.bytes().await?));
            }
            _ => {}
        }
    }

    let exam_name =
        exam_name.ok_or_else(|| AppError::BadRequest("Missing 'exam_name' field".to_string()))?;
    let exam_name = validate_component(&exam_name)?;
    if staged.is_empty() {
        return Err(AppError::BadRequest("No files provided".to_string()));
    }
    if !store.exam_exists(exam_name).await {
        return Err(AppError::NotFound(format!(
            "Exam '{}' does not exist",
            exam_name
        )));
    }

    for (file_name, bytes) in &staged {
        validate_component(file_name)?;
        store.save_image(exam_name, file_name, bytes).await?;
    }
    tracing::info!(
        "stored {} answer sheet(s) for exam '{}'",
        staged.len(),
        exam_name
    );

    Ok(Json(json!({"success": "Images uploaded"})))
}

/// Stores the solution image, replacing any previous one, then immediately
/// decodes it and returns the answer key so the client can confirm it.
pub async fn upload_solution(
    State(store): State<ExamStore>,
    State(omr): State<Arc<dyn OmrEngine>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut exam_name: Option<String> = None;
    let mut file: Option<(String, Bytes)> = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("exam_name") => exam_name = Some(field.text().await?),
            Some("file") => {
                let file_name = field.file_name().map(|s| s.to_string()).ok_or_else(|| {
                    AppError::BadRequest("Uploaded file is missing a filename".to_string())
                })?;
                file = Some((file_name, field.bytes().await?));
            }
            _ => {}
        }
    }

    let exam_name =
        exam_name.ok_or_else(|| AppError::BadRequest("Missing 'exam_name' field".to_string()))?;
    let exam_name = validate_component(&exam_name)?;
    let (file_name, bytes) =
        file.ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;
    validate_component(&file_name)?;
    if !store.exam_exists(exam_name).await {
        return Err(AppError::NotFound(format!(
            "Exam '{}' does not exist",
            exam_name
        )));
    }

    let stored = store.replace_solution(exam_name, &file_name, &bytes).await?;
    tracing::info!("stored solution '{}' for exam '{}'", file_name, exam_name);

    let answer_key = omr.extract_choices(&stored).await?;

    Ok(Json(json!({
        "success": "Solution uploaded",
        "answer_key": answer_key,
    })))
}

/// Serves one stored answer-sheet image.
pub async fn get_exam_image(
    State(store): State<ExamStore>,
    Path((exam_name, image_name)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let exam_name = validate_component(&exam_name)?;
    let image_name = validate_component(&image_name)?;
    if !store.exam_exists(exam_name).await {
        return Err(AppError::NotFound(format!(
            "Exam '{}' does not exist",
            exam_name
        )));
    }

    let bytes = store.read_image(exam_name, image_name).await?;
    Ok((
        [(header::CONTENT_TYPE, image_content_type(image_name))],
        bytes,
    ))
}

fn image_content_type(name: &str) -> &'static str {
    let ext = std::path::Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}
