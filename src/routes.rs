// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
};
use tower_http::{
    cors::{AllowHeaders, AllowMethods, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{exam, report},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Registers the exam management and report endpoints.
/// * Applies global middleware (Trace, CORS, upload body limit).
/// * Injects global state (store, OMR engine, config).
pub fn create_router(state: AppState) -> Router {
    let origin: HeaderValue = state
        .config
        .allowed_origin
        .parse()
        .expect("ALLOWED_ORIGIN must be a valid origin");

    // Credentials are allowed, so "any method/header" is expressed by
    // mirroring the preflight request rather than a literal wildcard.
    let cors = CorsLayer::new()
        .allow_origin([origin])
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    Router::new()
        .route("/create_exam", post(exam::create_exam))
        .route("/get_exams", get(exam::get_exams))
        .route("/get_exam", post(exam::get_exam))
        .route("/upload_multiple_images", post(exam::upload_images))
        .route("/upload_solution", post(exam::upload_solution))
        .route("/exam/{exam_name}/{image_name}", get(exam::get_exam_image))
        .route("/generate_report", post(report::generate_report))
        .route("/get_report", post(report::get_report))
        .route("/download_report", post(report::download_report))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Scanned answer sheets exceed axum's 2 MiB default body cap.
        .layer(DefaultBodyLimit::max(32 * 1024 * 1024))
        .with_state(state)
}
