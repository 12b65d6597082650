// src/report.rs

use tokio::fs;

use crate::{
    error::AppError,
    models::report::{Report, ReportEntry},
    omr::{ChoiceSequence, OmrEngine},
    store::ExamStore,
};

const CSV_HEADER: &str = "Name,Score,Choices";

/// Grades every answer sheet of an exam against its solution image and
/// persists `report.json` and `report.csv`.
///
/// Preconditions (each with its own message): the exam directory, its
/// `images/` and `solution/` subdirectories exist, both listings are
/// non-empty, and the answer key decodes to a non-empty sequence. A sheet
/// that fails to decode is logged and skipped; the run only fails when no
/// sheet at all could be graded. Nothing is written unless at least one
/// sheet was graded.
pub async fn generate(
    store: &ExamStore,
    omr: &dyn OmrEngine,
    exam_name: &str,
) -> Result<Report, AppError> {
    if !store.exam_exists(exam_name).await {
        return Err(AppError::NotFound(format!(
            "Exam '{}' not found",
            exam_name
        )));
    }

    if !fs::try_exists(store.images_dir(exam_name)).await? {
        return Err(AppError::InternalServerError(format!(
            "Images directory is missing for exam '{}'",
            exam_name
        )));
    }
    if !fs::try_exists(store.solution_dir(exam_name)).await? {
        return Err(AppError::InternalServerError(format!(
            "Solution directory is missing for exam '{}'",
            exam_name
        )));
    }

    let images = store.list_images(exam_name).await?;
    if images.is_empty() {
        return Err(AppError::InternalServerError(format!(
            "No answer-sheet images have been uploaded to exam '{}'",
            exam_name
        )));
    }

    let solution_files = store.list_solution(exam_name).await?;
    let key_file = solution_files.first().ok_or_else(|| {
        AppError::InternalServerError(format!(
            "No solution image has been uploaded to exam '{}'",
            exam_name
        ))
    })?;

    let key = omr
        .extract_choices(&store.solution_path(exam_name, key_file))
        .await
        .map_err(|err| {
            AppError::InternalServerError(format!(
                "Could not read the answer key from '{}': {}",
                key_file, err
            ))
        })?;
    if key.is_empty() {
        return Err(AppError::InternalServerError(format!(
            "Answer key decoded from '{}' is empty",
            key_file
        )));
    }

    let mut report = Report::new();
    for image in &images {
        let choices = match omr
            .extract_choices(&store.image_path(exam_name, image))
            .await
        {
            Ok(choices) if !choices.is_empty() => choices,
            Ok(_) => {
                tracing::warn!("no marks detected on '{}', skipping", image);
                continue;
            }
            Err(err) => {
                tracing::warn!("failed to read answer sheet '{}': {}", image, err);
                continue;
            }
        };

        let score = omr.score(&key, &choices);
        report.insert(
            image.clone(),
            ReportEntry {
                score,
                choices,
                correct_answers: key.clone(),
            },
        );
    }

    if report.is_empty() {
        return Err(AppError::InternalServerError(format!(
            "None of the answer sheets in exam '{}' could be processed",
            exam_name
        )));
    }

    let json = serde_json::to_string_pretty(&report)?;
    let csv = render_csv(&key, &report);
    store.write_report(exam_name, &json, &csv).await?;

    Ok(report)
}

/// Flat CSV mirror of the report: header, a `Solution` row carrying the raw
/// key, then one row per graded sheet. Choice sequences join with `|` so the
/// cell stays unambiguous inside a comma-delimited line.
fn render_csv(key: &ChoiceSequence, report: &Report) -> String {
    let mut csv = String::from(CSV_HEADER);
    csv.push_str(&format!("\nSolution,,{}", key.join("|")));
    for (name, entry) in report {
        csv.push_str(&format!(
            "\n{},{},{}",
            name,
            entry.score,
            entry.choices.join("|")
        ));
    }
    csv
}
