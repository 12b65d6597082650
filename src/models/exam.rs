// src/models/exam.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// DTO for creating a new exam folder.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateExamRequest {
    #[validate(length(
        min = 1,
        max = 64,
        message = "Exam name length must be between 1 and 64 characters."
    ))]
    pub exam_name: String,
}

/// Form body shared by the exam-scoped POST endpoints.
#[derive(Debug, Deserialize)]
pub struct ExamForm {
    pub exam_name: String,
}

/// Contents of one exam folder: uploaded answer sheets and the stored
/// solution image (at most one file).
#[derive(Debug, Serialize)]
pub struct ExamSummary {
    pub images: Vec<String>,
    pub solution: Vec<String>,
}
