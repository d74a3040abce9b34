mod cli;
mod commands;
mod conditional;
mod docx;
mod error;
mod extract;
mod fields;
mod model;
mod pipeline;
mod replace;
mod util;
mod validate;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, LogLevel};
use crate::error::{EXIT_PROCESSING, FillError};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_level);

    if let Err(err) = run(cli) {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(exit_code(&err));
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Fill(args) => commands::fill::run(args),
        Commands::Batch(args) => commands::batch::run(args),
        Commands::Extract(args) => commands::extract::run(args),
        Commands::Check(args) => commands::check::run(args),
    }
}

/// Exit code of the first typed fill error in the chain.
fn exit_code(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<FillError>())
        .map(FillError::exit_code)
        .unwrap_or(EXIT_PROCESSING)
}

fn init_tracing(level: Option<LogLevel>) {
    let env_filter = match level {
        Some(level) => EnvFilter::new(level.as_str()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use anyhow::Context;

    use super::*;
    use crate::error::{EXIT_FILE_NOT_FOUND, EXIT_VALIDATION, ValidationError};

    #[test]
    fn exit_code_finds_fill_error_under_context() {
        let missing: Result<()> = Err(FillError::NotFound {
            path: PathBuf::from("w.docx"),
        })
        .context("failed to load worksheet w.docx");
        assert_eq!(
            exit_code(&missing.expect_err("error kept")),
            EXIT_FILE_NOT_FOUND
        );

        let invalid: Result<()> = Err(FillError::from(ValidationError::MissingField {
            placeholder: "{Applicant name}".to_string(),
        })
        .into());
        assert_eq!(exit_code(&invalid.expect_err("error kept")), EXIT_VALIDATION);

        assert_eq!(
            exit_code(&anyhow::anyhow!("untyped failure")),
            EXIT_PROCESSING
        );
    }
}
