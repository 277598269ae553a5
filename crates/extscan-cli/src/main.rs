//! extscan CLI - filter extension paths by manifest contents
//!
//! Reads newline-delimited paths from stdin and prints those whose extension
//! manifest satisfies the selected filter, in input order.

use colored::Colorize;
use std::process::ExitCode;

use extscan_cli::cli_args::{self, Invocation};
use extscan_cli::commands;
use extscan_cli::logging;

fn main() -> ExitCode {
    logging::init();

    let argv = std::env::args_os().map(|arg| arg.to_string_lossy().into_owned());

    let result = match cli_args::parse_invocation(argv) {
        Invocation::Usage => {
            eprint!("{}", cli_args::usage());
            return ExitCode::from(1);
        }
        Invocation::UnknownKind(kind) => {
            eprintln!(
                "{}: unknown filter kind '{}'\nknown kinds: {}",
                "error".red(),
                kind,
                cli_args::known_kinds().join(", ")
            );
            return ExitCode::from(1);
        }
        Invocation::Invalid(e) => {
            eprint!("{e}");
            return ExitCode::from(1);
        }
        Invocation::Filter(kind) => kind
            .into_filter()
            .map_err(anyhow::Error::from)
            .and_then(commands::filter::run),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "error".red(), e);
            ExitCode::from(1)
        }
    }
}
