use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use tracing::info;

use super::{fill_options, load_schema, need_sentinel, print_path, write_json_stdout};
use crate::cli::FillArgs;
use crate::docx::Document;
use crate::model::{FillCounts, FillRunReport, InputFileEntry};
use crate::pipeline::FillEngine;
use crate::util::{
    input_entry, local_file_stamp, now_utc_string, timestamped_docx_path, utc_compact_string,
    write_json_pretty,
};

pub fn run(args: FillArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("fill-{}", utc_compact_string(started_ts));

    let schema = load_schema(&args.schema)?;
    let engine = FillEngine::new(&schema, need_sentinel(&args.replace))?;
    let options = fill_options(&args.replace);

    info!(
        run_id = %run_id,
        template = %args.template.display(),
        worksheet = %args.worksheet.display(),
        dry_run = args.dry_run,
        "starting fill"
    );

    let worksheet = Document::open(&args.worksheet)
        .with_context(|| format!("failed to load worksheet {}", args.worksheet.display()))?;
    let mut template = Document::open(&args.template)
        .with_context(|| format!("failed to load template {}", args.template.display()))?;

    if args.dry_run {
        let values = engine.prepare_values(&worksheet, &options)?;
        let diff = engine.dry_run_diff(&template, &values);
        write_json_stdout(&diff, "dry-run diff")?;

        let unresolved: Vec<String> = diff
            .keys()
            .filter(|token| values.resolved(token).is_none())
            .cloned()
            .collect();
        let fields_empty = values.blank_keys().len();
        let counts = FillCounts {
            fields_extracted: values.len() - fields_empty,
            fields_empty,
            placeholders_unresolved: unresolved.len(),
            ..FillCounts::default()
        };
        info!(
            placeholders = diff.len(),
            unresolved = unresolved.len(),
            "fill dry-run complete"
        );

        if let Some(report_path) = &args.report_path {
            let report = FillRunReport {
                manifest_version: 1,
                run_id,
                started_at,
                finished_at: now_utc_string(),
                dry_run: true,
                inputs: inputs(&args)?,
                output_path: None,
                active_option: engine.active_option(&values, &options),
                counts,
                unresolved_placeholders: unresolved,
            };
            write_json_pretty(report_path, &report)?;
            info!(path = %report_path.display(), "wrote fill report");
        }
        return Ok(());
    }

    let output_path = output_path(&args);
    let outcome = engine.fill(&mut template, &worksheet, &options)?;
    template.save(&output_path)?;
    print_path(&output_path)?;

    let counts = outcome.counts();
    info!(
        output = %output_path.display(),
        resolved = counts.placeholders_resolved,
        unresolved = counts.placeholders_unresolved,
        blocks_removed = counts.blocks_removed,
        "fill completed"
    );

    if let Some(report_path) = &args.report_path {
        let report = FillRunReport {
            manifest_version: 1,
            run_id,
            started_at,
            finished_at: now_utc_string(),
            dry_run: false,
            inputs: inputs(&args)?,
            output_path: Some(output_path.display().to_string()),
            active_option: outcome.active_option.clone(),
            counts,
            unresolved_placeholders: outcome.unresolved_placeholders(),
        };
        write_json_pretty(report_path, &report)?;
        info!(path = %report_path.display(), "wrote fill report");
    }

    Ok(())
}

fn output_path(args: &FillArgs) -> PathBuf {
    args.output.clone().unwrap_or_else(|| {
        let dir = args.template.parent().unwrap_or_else(|| Path::new(""));
        timestamped_docx_path(&args.template, dir, &local_file_stamp(Local::now()))
    })
}

fn inputs(args: &FillArgs) -> Result<Vec<InputFileEntry>> {
    let mut inputs = vec![
        input_entry("template", &args.template)?,
        input_entry("worksheet", &args.worksheet)?,
    ];
    if let Some(schema) = &args.schema.schema {
        inputs.push(input_entry("schema", schema)?);
    }
    Ok(inputs)
}
