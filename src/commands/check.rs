use anyhow::{Context, Result};
use tracing::{info, warn};

use super::load_schema;
use crate::cli::CheckArgs;
use crate::docx::Document;
use crate::error::FillError;
use crate::extract::WorksheetExtractor;
use crate::validate::Validator;

pub fn run(args: CheckArgs) -> Result<()> {
    let schema = load_schema(&args.schema)?;
    let extractor = WorksheetExtractor::new(&schema)?;
    let validator = Validator::new(&schema)?;

    let worksheet = Document::open(&args.worksheet)
        .with_context(|| format!("failed to load worksheet {}", args.worksheet.display()))?;
    let values = extractor.extract(&worksheet);

    for placeholder in values.blank_keys() {
        warn!(placeholder, "worksheet field is empty");
    }

    validator
        .validate_document(&values, &worksheet)
        .map_err(FillError::from)
        .with_context(|| format!("worksheet {} is incomplete", args.worksheet.display()))?;

    info!(
        worksheet = %args.worksheet.display(),
        fields = values.len(),
        empty = values.blank_keys().len(),
        "worksheet check passed"
    );
    Ok(())
}
