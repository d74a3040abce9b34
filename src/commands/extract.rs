use anyhow::{Context, Result};
use tracing::info;

use super::{load_schema, write_json_stdout};
use crate::cli::ExtractArgs;
use crate::docx::Document;
use crate::extract::WorksheetExtractor;
use crate::util::write_json_pretty;

pub fn run(args: ExtractArgs) -> Result<()> {
    let schema = load_schema(&args.schema)?;
    let extractor = WorksheetExtractor::new(&schema)?;

    let worksheet = Document::open(&args.worksheet)
        .with_context(|| format!("failed to load worksheet {}", args.worksheet.display()))?;
    let values = extractor.extract(&worksheet);

    match &args.output_json {
        Some(path) => {
            write_json_pretty(path, &values)?;
            info!(path = %path.display(), fields = values.len(), "wrote extracted values");
        }
        None => write_json_stdout(&values, "extracted values")?,
    }

    Ok(())
}
