// src/config.rs

use std::env;
use std::path::PathBuf;
use dotenvy::dotenv;

#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory holding one subdirectory per exam.
    pub exams_root: PathBuf,

    /// External recognizer executable invoked per image.
    pub omr_command: String,

    /// Single origin allowed by the CORS layer (the frontend URL).
    pub allowed_origin: String,

    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let exams_root = env::var("EXAMS_ROOT")
            .unwrap_or_else(|_| "exams".to_string())
            .into();

        let omr_command = env::var("OMR_COMMAND")
            .unwrap_or_else(|_| "omr".to_string());

        let allowed_origin = env::var("ALLOWED_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        Self {
            exams_root,
            omr_command,
            allowed_origin,
            rust_log,
        }
    }
}
