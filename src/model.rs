use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One dry-run entry: the raw token and what it would become.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderChange {
    pub old: String,
    pub new: String,
}

pub type PlaceholderDiff = BTreeMap<String, PlaceholderChange>;

#[derive(Debug, Clone, Serialize)]
pub struct InputFileEntry {
    pub role: String,
    pub path: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FillCounts {
    pub fields_extracted: usize,
    pub fields_empty: usize,
    pub units_visited: usize,
    pub units_rewritten: usize,
    pub placeholders_resolved: usize,
    pub placeholders_unresolved: usize,
    pub blocks_kept: usize,
    pub blocks_removed: usize,
    pub paragraphs_removed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FillRunReport {
    pub manifest_version: u32,
    pub run_id: String,
    pub started_at: String,
    pub finished_at: String,
    pub dry_run: bool,
    pub inputs: Vec<InputFileEntry>,
    pub output_path: Option<String>,
    pub active_option: Option<String>,
    pub counts: FillCounts,
    pub unresolved_placeholders: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchItemReport {
    pub worksheet: String,
    pub status: String,
    pub output_path: Option<String>,
    pub failure_reason: Option<String>,
    pub counts: Option<FillCounts>,
    pub unresolved_placeholders: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchRunReport {
    pub manifest_version: u32,
    pub run_id: String,
    pub started_at: String,
    pub finished_at: String,
    pub dry_run: bool,
    pub template: InputFileEntry,
    pub worksheet_dir: String,
    pub output_dir: String,
    pub item_count: usize,
    pub failed_count: usize,
    pub items: Vec<BatchItemReport>,
}
