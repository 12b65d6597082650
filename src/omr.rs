// src/omr.rs

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;

/// Ordered list of detected selections, one entry per question.
pub type ChoiceSequence = Vec<String>;

/// Failure surface of the external mark recognizer.
#[derive(Debug)]
pub enum OmrError {
    /// The recognizer process could not be spawned or awaited.
    Io(std::io::Error),

    /// The recognizer ran but reported a failure of its own.
    Engine(String),

    /// The recognizer produced output this layer could not decode.
    UnreadableSheet(String),
}

impl fmt::Display for OmrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OmrError::Io(err) => write!(f, "failed to run OMR engine: {}", err),
            OmrError::Engine(msg) => write!(f, "OMR engine failed: {}", msg),
            OmrError::UnreadableSheet(msg) => write!(f, "unreadable sheet: {}", msg),
        }
    }
}

impl std::error::Error for OmrError {}

/// The optical-mark-recognition collaborator.
///
/// The actual bubble detection lives outside this crate; handlers and the
/// report generator only ever talk to this trait. Tests substitute scripted
/// implementations.
#[async_trait]
pub trait OmrEngine: Send + Sync {
    /// Decodes the marked choices from one answer-sheet image.
    ///
    /// An `Ok` holding an empty sequence means the recognizer found no marks;
    /// callers treat that the same as a failed read.
    async fn extract_choices(&self, image_path: &Path) -> Result<ChoiceSequence, OmrError>;

    /// Scores a sheet against the answer key: the number of positions where
    /// the detected choice matches the key.
    fn score(&self, key: &ChoiceSequence, choices: &ChoiceSequence) -> u32 {
        key.iter()
            .zip(choices.iter())
            .filter(|(expected, marked)| expected == marked)
            .count() as u32
    }
}

/// Bridge to an external recognizer executable.
///
/// Invokes `<command> <image_path>` and expects a JSON array of strings on
/// stdout, e.g. `["A","B","C"]`.
pub struct CommandOmr {
    command: String,
}

impl CommandOmr {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl OmrEngine for CommandOmr {
    async fn extract_choices(&self, image_path: &Path) -> Result<ChoiceSequence, OmrError> {
        tracing::debug!("running OMR engine on {}", image_path.display());

        let output = Command::new(&self.command)
            .arg(image_path)
            .output()
            .await
            .map_err(OmrError::Io)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(OmrError::Engine(stderr));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|err| OmrError::UnreadableSheet(err.to_string()))
    }
}
