// tests/report_tests.rs

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use omr_backend::{
    config::Config,
    omr::{ChoiceSequence, OmrEngine, OmrError},
    routes,
    state::AppState,
    store::ExamStore,
};
use tempfile::TempDir;

struct ScriptedOmr {
    decoded: HashMap<String, ChoiceSequence>,
}

impl ScriptedOmr {
    fn new(entries: &[(&str, &[&str])]) -> Arc<Self> {
        let decoded = entries
            .iter()
            .map(|(name, choices)| {
                (
                    name.to_string(),
                    choices.iter().map(|c| c.to_string()).collect(),
                )
            })
            .collect();
        Arc::new(Self { decoded })
    }
}

#[async_trait]
impl OmrEngine for ScriptedOmr {
    async fn extract_choices(&self, image_path: &Path) -> Result<ChoiceSequence, OmrError> {
        let name = image_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        self.decoded
            .get(name)
            .cloned()
            .ok_or_else(|| OmrError::UnreadableSheet(format!("no marks detected in '{}'", name)))
    }
}

struct TestApp {
    address: String,
    _exams_root: TempDir,
}

async fn spawn_app(omr: Arc<dyn OmrEngine>) -> TestApp {
    let exams_root = tempfile::tempdir().expect("failed to create temp exams root");

    let config = Config {
        exams_root: exams_root.path().to_path_buf(),
        omr_command: "omr".to_string(),
        allowed_origin: "http://localhost:3000".to_string(),
        rust_log: "error".to_string(),
    };

    let store = ExamStore::new(&config.exams_root);
    store
        .ensure_root()
        .await
        .expect("failed to init exams root");

    let state = AppState { store, omr, config };
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        _exams_root: exams_root,
    }
}

fn unique_exam_name() -> String {
    format!("exam_{}", &uuid::Uuid::new_v4().to_string()[..8])
}

async fn create_exam(client: &reqwest::Client, address: &str, exam: &str) {
    let response = client
        .post(format!("{}/create_exam", address))
        .json(&serde_json::json!({ "exam_name": exam }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);
}

async fn upload_images(client: &reqwest::Client, address: &str, exam: &str, names: &[&str]) {
    let mut form = reqwest::multipart::Form::new().text("exam_name", exam.to_string());
    for name in names {
        form = form.part(
            "files",
            reqwest::multipart::Part::bytes(b"scan".to_vec()).file_name(name.to_string()),
        );
    }
    let response = client
        .post(format!("{}/upload_multiple_images", address))
        .multipart(form)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);
}

async fn upload_solution(client: &reqwest::Client, address: &str, exam: &str, name: &str) {
    let form = reqwest::multipart::Form::new()
        .text("exam_name", exam.to_string())
        .part(
            "file",
            reqwest::multipart::Part::bytes(b"key-scan".to_vec()).file_name(name.to_string()),
        );
    let response = client
        .post(format!("{}/upload_solution", address))
        .multipart(form)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);
}

async fn generate_report(client: &reqwest::Client, address: &str, exam: &str) -> reqwest::Response {
    client
        .post(format!("{}/generate_report", address))
        .form(&[("exam_name", exam)])
        .send()
        .await
        .expect("Failed to execute request")
}

/// The reference flow: two sheets, one of them unreadable.
///
/// Key decodes to A,B,C; s1 decodes to A,B,D (2 correct); s2 fails. The
/// report must contain exactly s1, and the CSV a header, the Solution row
/// and the s1 row.
#[tokio::test]
async fn report_skips_unreadable_sheets() {
    let app = spawn_app(ScriptedOmr::new(&[
        ("key.jpg", &["A", "B", "C"]),
        ("s1.jpg", &["A", "B", "D"]),
    ]))
    .await;
    let client = reqwest::Client::new();
    let exam = "mathA";

    // 1. Set up the exam
    create_exam(&client, &app.address, exam).await;
    upload_images(&client, &app.address, exam, &["s1.jpg", "s2.jpg"]).await;
    upload_solution(&client, &app.address, exam, "key.jpg").await;

    // 2. Generate
    let response = generate_report(&client, &app.address, exam).await;
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], "Report generated");

    // 3. Read the report back
    let body: serde_json::Value = client
        .post(format!("{}/get_report", app.address))
        .form(&[("exam_name", exam)])
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();

    assert_eq!(
        body["report"],
        serde_json::json!({
            "s1.jpg": {
                "score": 2,
                "choices": ["A", "B", "D"],
                "correct_answers": ["A", "B", "C"],
            }
        })
    );

    // 4. Download the CSV mirror
    let response = client
        .post(format!("{}/download_report", app.address))
        .form(&[("exam_name", exam)])
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);
    assert!(
        response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/csv")
    );

    let csv = response.text().await.unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines,
        vec!["Name,Score,Choices", "Solution,,A|B|C", "s1.jpg,2,A|B|D"]
    );
}

#[tokio::test]
async fn report_fails_when_every_sheet_is_unreadable() {
    let app = spawn_app(ScriptedOmr::new(&[("key.jpg", &["A", "B", "C"])])).await;
    let client = reqwest::Client::new();
    let exam = unique_exam_name();

    create_exam(&client, &app.address, &exam).await;
    upload_images(&client, &app.address, &exam, &["s1.jpg", "s2.jpg"]).await;
    upload_solution(&client, &app.address, &exam, "key.jpg").await;

    let response = generate_report(&client, &app.address, &exam).await;
    assert_eq!(response.status().as_u16(), 500);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .contains("could be processed")
    );

    // No artifacts were written: the report is still missing.
    let response = client
        .post(format!("{}/get_report", app.address))
        .form(&[("exam_name", exam.as_str())])
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn get_report_before_generation_is_404() {
    let app = spawn_app(ScriptedOmr::new(&[])).await;
    let client = reqwest::Client::new();
    let exam = unique_exam_name();
    create_exam(&client, &app.address, &exam).await;

    let response = client
        .post(format!("{}/get_report", app.address))
        .form(&[("exam_name", exam.as_str())])
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .contains("No report has been generated")
    );
}

#[tokio::test]
async fn generate_report_for_unknown_exam_is_404() {
    let app = spawn_app(ScriptedOmr::new(&[])).await;
    let client = reqwest::Client::new();

    let response = generate_report(&client, &app.address, "ghost").await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn generate_report_without_images_fails() {
    let app = spawn_app(ScriptedOmr::new(&[("key.jpg", &["A", "B"])])).await;
    let client = reqwest::Client::new();
    let exam = unique_exam_name();

    create_exam(&client, &app.address, &exam).await;
    upload_solution(&client, &app.address, &exam, "key.jpg").await;

    let response = generate_report(&client, &app.address, &exam).await;
    assert_eq!(response.status().as_u16(), 500);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .contains("No answer-sheet images")
    );
}

#[tokio::test]
async fn generate_report_without_solution_fails() {
    let app = spawn_app(ScriptedOmr::new(&[("s1.jpg", &["A", "B"])])).await;
    let client = reqwest::Client::new();
    let exam = unique_exam_name();

    create_exam(&client, &app.address, &exam).await;
    upload_images(&client, &app.address, &exam, &["s1.jpg"]).await;

    let response = generate_report(&client, &app.address, &exam).await;
    assert_eq!(response.status().as_u16(), 500);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("No solution image"));
}

/// Regenerating and re-reading yields the exact same mapping: the artifacts
/// round-trip through JSON without drift.
#[tokio::test]
async fn report_round_trips_exactly() {
    let app = spawn_app(ScriptedOmr::new(&[
        ("key.jpg", &["A", "B", "C", "D"]),
        ("s1.jpg", &["A", "B", "C", "D"]),
        ("s2.jpg", &["A", "A", "A", "D"]),
    ]))
    .await;
    let client = reqwest::Client::new();
    let exam = unique_exam_name();

    create_exam(&client, &app.address, &exam).await;
    upload_images(&client, &app.address, &exam, &["s1.jpg", "s2.jpg"]).await;
    upload_solution(&client, &app.address, &exam, "key.jpg").await;

    let response = generate_report(&client, &app.address, &exam).await;
    assert_eq!(response.status().as_u16(), 200);

    let read_report = || async {
        client
            .post(format!("{}/get_report", app.address))
            .form(&[("exam_name", exam.as_str())])
            .send()
            .await
            .expect("Failed to execute request")
            .json::<serde_json::Value>()
            .await
            .unwrap()
    };

    let first = read_report().await;
    let second = read_report().await;
    assert_eq!(first, second);

    assert_eq!(first["report"]["s1.jpg"]["score"], 4);
    assert_eq!(first["report"]["s2.jpg"]["score"], 2);
    assert_eq!(
        first["report"]["s2.jpg"]["correct_answers"],
        serde_json::json!(["A", "B", "C", "D"])
    );
}
