// src/store.rs

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::AppError;

const IMAGES_DIR: &str = "images";
const SOLUTION_DIR: &str = "solution";
const REPORT_JSON: &str = "report.json";
const REPORT_CSV: &str = "report.csv";

/// Filesystem-backed exam store.
///
/// Owns the on-disk layout `<root>/<exam>/{images,solution,report.json,report.csv}`
/// and is the only module that touches it. Cloned into each handler via
/// `AppState`, so tests can point it at a temp directory.
#[derive(Clone)]
pub struct ExamStore {
    root: PathBuf,
}

impl ExamStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn exam_dir(&self, exam_name: &str) -> PathBuf {
        self.root.join(exam_name)
    }

    pub fn images_dir(&self, exam_name: &str) -> PathBuf {
        self.exam_dir(exam_name).join(IMAGES_DIR)
    }

    pub fn solution_dir(&self, exam_name: &str) -> PathBuf {
        self.exam_dir(exam_name).join(SOLUTION_DIR)
    }

    pub fn image_path(&self, exam_name: &str, image_name: &str) -> PathBuf {
        self.images_dir(exam_name).join(image_name)
    }

    pub fn solution_path(&self, exam_name: &str, file_name: &str) -> PathBuf {
        self.solution_dir(exam_name).join(file_name)
    }

    pub fn report_json_path(&self, exam_name: &str) -> PathBuf {
        self.exam_dir(exam_name).join(REPORT_JSON)
    }

    pub fn report_csv_path(&self, exam_name: &str) -> PathBuf {
        self.exam_dir(exam_name).join(REPORT_CSV)
    }

    /// Creates the exams root if it does not exist yet. Called once at startup.
    pub async fn ensure_root(&self) -> Result<(), AppError> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    pub async fn exam_exists(&self, exam_name: &str) -> bool {
        fs::try_exists(self.exam_dir(exam_name))
            .await
            .unwrap_or(false)
    }

    /// Creates `<root>/<name>/{images,solution}`; `Conflict` if the exam
    /// directory is already present.
    pub async fn create_exam(&self, exam_name: &str) -> Result<(), AppError> {
        let dir = self.exam_dir(exam_name);
        if fs::try_exists(&dir).await? {
            return Err(AppError::Conflict(format!(
                "Exam '{}' already exists",
                exam_name
            )));
        }

        fs::create_dir_all(dir.join(IMAGES_DIR)).await?;
        fs::create_dir_all(dir.join(SOLUTION_DIR)).await?;
        Ok(())
    }

    /// Sorted list of exam names. Creates the root lazily so a fresh
    /// deployment answers with an empty list instead of an error.
    pub async fn list_exams(&self) -> Result<Vec<String>, AppError> {
        if !fs::try_exists(&self.root).await? {
            fs::create_dir_all(&self.root).await?;
            return Ok(Vec::new());
        }

        let mut exams = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                exams.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        exams.sort();
        Ok(exams)
    }

    pub async fn list_images(&self, exam_name: &str) -> Result<Vec<String>, AppError> {
        list_files(&self.images_dir(exam_name)).await
    }

    pub async fn list_solution(&self, exam_name: &str) -> Result<Vec<String>, AppError> {
        list_files(&self.solution_dir(exam_name)).await
    }

    pub async fn save_image(
        &self,
        exam_name: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, AppError> {
        let dir = self.images_dir(exam_name);
        if !fs::try_exists(&dir).await? {
            return Err(AppError::NotFound(format!(
                "Exam '{}' does not exist",
                exam_name
            )));
        }

        let path = dir.join(file_name);
        fs::write(&path, bytes).await?;
        Ok(path)
    }

    /// Replaces the solution image, clearing the whole directory first so
    /// exactly one file remains regardless of previous state.
    pub async fn replace_solution(
        &self,
        exam_name: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, AppError> {
        let dir = self.solution_dir(exam_name);
        if !fs::try_exists(&dir).await? {
            return Err(AppError::NotFound(format!(
                "Exam '{}' does not exist",
                exam_name
            )));
        }

        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                fs::remove_file(entry.path()).await?;
            }
        }

        let path = dir.join(file_name);
        fs::write(&path, bytes).await?;
        Ok(path)
    }

    pub async fn write_report(
        &self,
        exam_name: &str,
        json: &str,
        csv: &str,
    ) -> Result<(), AppError> {
        fs::write(self.report_json_path(exam_name), json).await?;
        fs::write(self.report_csv_path(exam_name), csv).await?;
        Ok(())
    }

    /// Parsed `report.json` for an exam. A report that was never generated is
    /// a domain not-found, not a bare I/O failure.
    pub async fn read_report(&self, exam_name: &str) -> Result<serde_json::Value, AppError> {
        let raw = self
            .read_artifact(exam_name, self.report_json_path(exam_name))
            .await?;
        let report = serde_json::from_str(&raw)?;
        Ok(report)
    }

    pub async fn read_report_csv(&self, exam_name: &str) -> Result<String, AppError> {
        self.read_artifact(exam_name, self.report_csv_path(exam_name))
            .await
    }

    async fn read_artifact(&self, exam_name: &str, path: PathBuf) -> Result<String, AppError> {
        match fs::read_to_string(&path).await {
            Ok(contents) => Ok(contents),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(AppError::NotFound(
                format!("No report has been generated for exam '{}'", exam_name),
            )),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn read_image(&self, exam_name: &str, image_name: &str) -> Result<Vec<u8>, AppError> {
        match fs::read(self.image_path(exam_name, image_name)).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(AppError::NotFound(
                format!("Image '{}' not found in exam '{}'", image_name, exam_name),
            )),
            Err(err) => Err(err.into()),
        }
    }
}

/// Sorted regular-file names of a directory.
async fn list_files(dir: &Path) -> Result<Vec<String>, AppError> {
    let mut names = Vec::new();
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}
