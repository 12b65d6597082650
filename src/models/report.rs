// src/models/report.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::omr::ChoiceSequence;

/// One graded answer sheet inside `report.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub score: u32,
    pub choices: ChoiceSequence,
    pub correct_answers: ChoiceSequence,
}

/// The full report, keyed by image filename. A `BTreeMap` keeps the JSON and
/// CSV row order stable across runs.
pub type Report = BTreeMap<String, ReportEntry>;
