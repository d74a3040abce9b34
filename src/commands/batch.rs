use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{Local, Utc};
use tracing::{error, info};

use super::{fill_options, load_schema, need_sentinel, print_path, write_json_stdout};
use crate::cli::BatchArgs;
use crate::docx::Document;
use crate::model::{BatchItemReport, BatchRunReport, PlaceholderDiff};
use crate::pipeline::{FillEngine, FillOptions};
use crate::util::{
    discover_docx, ensure_directory, input_entry, local_file_stamp, now_utc_string,
    timestamped_docx_path, utc_compact_string, write_json_pretty,
};

struct BatchContext<'a> {
    engine: &'a FillEngine<'a>,
    options: &'a FillOptions,
    template: &'a Path,
    output_dir: &'a Path,
    stamp: &'a str,
    dry_run: bool,
}

pub fn run(args: BatchArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("batch-{}", utc_compact_string(started_ts));

    let schema = load_schema(&args.schema)?;
    let engine = FillEngine::new(&schema, need_sentinel(&args.replace))?;
    let options = fill_options(&args.replace);

    // Fail the whole batch early on an unusable template.
    Document::open(&args.template)
        .with_context(|| format!("failed to load template {}", args.template.display()))?;

    let worksheets = discover_docx(&args.worksheet_dir)?;
    if worksheets.is_empty() {
        bail!("no .docx worksheets found in {}", args.worksheet_dir.display());
    }

    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| args.worksheet_dir.clone());
    if !args.dry_run {
        ensure_directory(&output_dir)?;
    }

    info!(
        run_id = %run_id,
        template = %args.template.display(),
        worksheets = worksheets.len(),
        output_dir = %output_dir.display(),
        dry_run = args.dry_run,
        "starting batch"
    );

    let stamp = local_file_stamp(Local::now());
    let context = BatchContext {
        engine: &engine,
        options: &options,
        template: &args.template,
        output_dir: &output_dir,
        stamp: &stamp,
        dry_run: args.dry_run,
    };

    let mut items = Vec::with_capacity(worksheets.len());
    let mut diffs: BTreeMap<String, PlaceholderDiff> = BTreeMap::new();
    let mut first_error: Option<anyhow::Error> = None;

    for worksheet_path in &worksheets {
        match fill_one(&context, worksheet_path) {
            Ok((item, diff)) => {
                if let Some(diff) = diff {
                    diffs.insert(item.worksheet.clone(), diff);
                }
                items.push(item);
            }
            Err(err) => {
                error!(
                    worksheet = %worksheet_path.display(),
                    error = %format!("{err:#}"),
                    "batch item failed"
                );
                items.push(BatchItemReport {
                    worksheet: worksheet_path.display().to_string(),
                    status: "failed".to_string(),
                    output_path: None,
                    failure_reason: Some(format!("{err:#}")),
                    counts: None,
                    unresolved_placeholders: Vec::new(),
                });
                first_error.get_or_insert(err);
            }
        }
    }

    if args.dry_run {
        write_json_stdout(&diffs, "batch dry-run diff")?;
    }

    let failed_count = items.iter().filter(|item| item.status == "failed").count();
    info!(
        processed = items.len() - failed_count,
        failed = failed_count,
        "batch completed"
    );

    if let Some(report_path) = &args.report_path {
        let report = BatchRunReport {
            manifest_version: 1,
            run_id,
            started_at,
            finished_at: now_utc_string(),
            dry_run: args.dry_run,
            template: input_entry("template", &args.template)?,
            worksheet_dir: args.worksheet_dir.display().to_string(),
            output_dir: output_dir.display().to_string(),
            item_count: items.len(),
            failed_count,
            items,
        };
        write_json_pretty(report_path, &report)?;
        info!(path = %report_path.display(), "wrote batch report");
    }

    if let Some(err) = first_error {
        return Err(err.context(format!(
            "{failed_count} of {} worksheets failed",
            worksheets.len()
        )));
    }
    Ok(())
}

/// Fills a fresh copy of the template from one worksheet.
fn fill_one(
    context: &BatchContext<'_>,
    worksheet_path: &Path,
) -> Result<(BatchItemReport, Option<PlaceholderDiff>)> {
    let worksheet = Document::open(worksheet_path)
        .with_context(|| format!("failed to load worksheet {}", worksheet_path.display()))?;
    let mut template = Document::open(context.template)
        .with_context(|| format!("failed to load template {}", context.template.display()))?;

    if context.dry_run {
        let values = context.engine.prepare_values(&worksheet, context.options)?;
        let diff = context.engine.dry_run_diff(&template, &values);
        let unresolved = diff
            .keys()
            .filter(|token| values.resolved(token).is_none())
            .cloned()
            .collect();
        let item = BatchItemReport {
            worksheet: worksheet_path.display().to_string(),
            status: "dry_run".to_string(),
            output_path: None,
            failure_reason: None,
            counts: None,
            unresolved_placeholders: unresolved,
        };
        return Ok((item, Some(diff)));
    }

    let outcome = context
        .engine
        .fill(&mut template, &worksheet, context.options)?;
    let output_path: PathBuf =
        timestamped_docx_path(worksheet_path, context.output_dir, context.stamp);
    template.save(&output_path)?;
    print_path(&output_path)?;

    info!(
        worksheet = %worksheet_path.display(),
        output = %output_path.display(),
        unresolved = outcome.replace.placeholders_unresolved,
        "batch item filled"
    );

    let item = BatchItemReport {
        worksheet: worksheet_path.display().to_string(),
        status: "filled".to_string(),
        output_path: Some(output_path.display().to_string()),
        failure_reason: None,
        counts: Some(outcome.counts()),
        unresolved_placeholders: outcome.unresolved_placeholders(),
    };
    Ok((item, None))
}
