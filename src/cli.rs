use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::replace::{DEFAULT_NEED_PREFIX, DEFAULT_NEED_SUFFIX};

#[derive(Parser, Debug)]
#[command(
    name = "scdocbuilder",
    version,
    about = "Fill FAA special conditions notice templates from worksheets"
)]
pub struct Cli {
    /// Overrides RUST_LOG.
    #[arg(long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fill one template from one worksheet.
    Fill(FillArgs),
    /// Fill the template once per worksheet in a directory.
    Batch(BatchArgs),
    /// Print the values extracted from a worksheet.
    Extract(ExtractArgs),
    /// Extract and validate a worksheet without touching a template.
    Check(CheckArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SchemaArgs {
    /// JSON or TOML placeholder schema; the built-in FAA worksheet schema
    /// is used when omitted.
    #[arg(long)]
    pub schema: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ReplaceArgs {
    #[arg(long, default_value = DEFAULT_NEED_PREFIX)]
    pub need_prefix: String,

    #[arg(long, default_value = DEFAULT_NEED_SUFFIX)]
    pub need_suffix: String,

    /// Comma-separated 14 CFR parts, e.g. "25" or "23,25".
    #[arg(long)]
    pub cfr_part: Option<String>,

    #[arg(long)]
    pub docket_no: Option<String>,

    #[arg(long)]
    pub notice_no: Option<String>,

    /// Active [[OPTION_n]] choice; defaults to the worksheet's action option.
    #[arg(long)]
    pub option: Option<String>,

    #[arg(long, default_value_t = false)]
    pub skip_validation: bool,
}

#[derive(Args, Debug, Clone)]
pub struct FillArgs {
    #[arg(long)]
    pub template: PathBuf,

    #[arg(long)]
    pub worksheet: PathBuf,

    /// Defaults to `<template stem>_<timestamp>.docx` next to the template.
    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    #[arg(long)]
    pub report_path: Option<PathBuf>,

    #[command(flatten)]
    pub schema: SchemaArgs,

    #[command(flatten)]
    pub replace: ReplaceArgs,
}

#[derive(Args, Debug, Clone)]
pub struct BatchArgs {
    #[arg(long)]
    pub template: PathBuf,

    #[arg(long)]
    pub worksheet_dir: PathBuf,

    /// Defaults to the worksheet directory.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    #[arg(long)]
    pub report_path: Option<PathBuf>,

    #[command(flatten)]
    pub schema: SchemaArgs,

    #[command(flatten)]
    pub replace: ReplaceArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    #[arg(long)]
    pub worksheet: PathBuf,

    #[arg(long)]
    pub output_json: Option<PathBuf>,

    #[command(flatten)]
    pub schema: SchemaArgs,
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    #[arg(long)]
    pub worksheet: PathBuf,

    #[command(flatten)]
    pub schema: SchemaArgs,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}
