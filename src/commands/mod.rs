pub mod batch;
pub mod check;
pub mod extract;
pub mod fill;

use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::{ReplaceArgs, SchemaArgs};
use crate::fields::FieldSchema;
use crate::pipeline::FillOptions;
use crate::replace::NeedSentinel;
use crate::validate::Overrides;

pub(crate) fn load_schema(args: &SchemaArgs) -> Result<FieldSchema> {
    match &args.schema {
        Some(path) => Ok(FieldSchema::load(path)?),
        None => FieldSchema::builtin().context("failed to compile built-in placeholder schema"),
    }
}

pub(crate) fn need_sentinel(args: &ReplaceArgs) -> NeedSentinel {
    NeedSentinel::new(args.need_prefix.as_str(), args.need_suffix.as_str())
}

pub(crate) fn fill_options(args: &ReplaceArgs) -> FillOptions {
    FillOptions {
        overrides: Overrides {
            cfr_part: args.cfr_part.clone(),
            docket_no: args.docket_no.clone(),
            notice_no: args.notice_no.clone(),
        },
        active_option: args.option.clone(),
        skip_validation: args.skip_validation,
    }
}

pub(crate) fn write_json_stdout<T: Serialize>(value: &T, what: &str) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, value)
        .with_context(|| format!("failed to serialize {what} json output"))?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

pub(crate) fn print_path(path: &Path) -> Result<()> {
    let mut output = io::stdout().lock();
    writeln!(output, "{}", path.display())?;
    Ok(())
}
