//! Command-line argument handling.
//!
//! Two invocation forms select a filter kind:
//!
//! - `extscan filter <kind> <args...>`
//! - `<anything>-filter-<kind> <args...>`, i.e. the binary installed or
//!   symlinked under a kind-specific name.
//!
//! Both are normalised to `<kind> <args...>` and handed to clap.

use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};
use extscan_core::{Filter, FilterError, ManifestKeyFilter, PermissionFilter};
use std::path::Path;

/// Program name used in usage text.
pub const PROGRAM_NAME: &str = "extscan";

/// Marker in the executable name selecting a filter kind.
const KIND_MARKER: &str = "-filter-";

/// Filter kind and its arguments.
#[derive(Parser, Debug)]
#[command(name = "extscan", bin_name = "extscan filter")]
#[command(about = "Keep input paths whose extension manifest matches a filter")]
#[command(disable_help_subcommand = true)]
pub struct FilterCli {
    #[command(subcommand)]
    pub kind: FilterKind,
}

#[derive(Subcommand, Debug)]
pub enum FilterKind {
    /// Keep extensions declaring every permission of at least one group
    Permissions(PermissionsArgs),

    /// Keep extensions whose manifest value at KEY matches any PATTERN
    Manifest(ManifestArgs),
}

#[derive(Args, Debug)]
pub struct PermissionsArgs {
    /// Comma-separated permissions, all required (e.g. `webRequest,webRequestBlocking`)
    #[arg(required = true, value_name = "GROUP", allow_hyphen_values = true)]
    pub groups: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ManifestArgs {
    /// Dotted key path into manifest.json (e.g. `background.service_worker`)
    #[arg(value_name = "KEY", allow_hyphen_values = true)]
    pub key: String,

    /// Regular expressions searched for in the value
    #[arg(required = true, value_name = "PATTERN", allow_hyphen_values = true)]
    pub patterns: Vec<String>,
}

impl FilterKind {
    /// Builds the filter, validating key paths and compiling patterns.
    pub fn into_filter(self) -> Result<Filter, FilterError> {
        match self {
            FilterKind::Permissions(args) => {
                PermissionFilter::new(&args.groups).map(Filter::Permissions)
            }
            FilterKind::Manifest(args) => {
                ManifestKeyFilter::new(&args.key, &args.patterns).map(Filter::ManifestKey)
            }
        }
    }
}

/// What the command line asks for.
#[derive(Debug)]
pub enum Invocation {
    /// No arguments, `--help`/`-h`, or an unrecognised command.
    Usage,
    /// The requested filter kind does not exist.
    UnknownKind(String),
    /// clap rejected the kind-specific arguments.
    Invalid(clap::Error),
    /// Run a filter.
    Filter(FilterKind),
}

/// Interprets a full argument vector, program name included.
pub fn parse_invocation<I, S>(argv: I) -> Invocation
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let argv: Vec<String> = argv.into_iter().map(Into::into).collect();
    let Some((program, rest)) = argv.split_first() else {
        return Invocation::Usage;
    };

    let (kind, args) = match kind_from_program(program) {
        Some(kind) => (kind, rest),
        None => match rest.split_first() {
            Some((command, tail)) if command == "filter" => match tail.split_first() {
                Some((kind, args)) => (kind.as_str(), args),
                None => return Invocation::Usage,
            },
            _ => return Invocation::Usage,
        },
    };

    if is_help(kind) {
        return Invocation::Usage;
    }
    if !known_kinds().iter().any(|known| known == kind) {
        return Invocation::UnknownKind(kind.to_string());
    }
    if args.is_empty() || (args.len() == 1 && is_help(&args[0])) {
        return Invocation::Usage;
    }

    let clap_args = std::iter::once(PROGRAM_NAME)
        .chain(std::iter::once(kind))
        .chain(args.iter().map(String::as_str));
    match FilterCli::try_parse_from(clap_args) {
        Ok(cli) => Invocation::Filter(cli.kind),
        Err(e) => Invocation::Invalid(e),
    }
}

/// Filter kind encoded in the executable name, if any.
fn kind_from_program(program: &str) -> Option<&str> {
    let stem = Path::new(program).file_stem()?.to_str()?;
    let (_, kind) = stem.rsplit_once(KIND_MARKER)?;
    (!kind.is_empty()).then_some(kind)
}

fn is_help(arg: &str) -> bool {
    arg == "--help" || arg == "-h"
}

/// Names of the filter kinds clap knows about.
pub fn known_kinds() -> Vec<String> {
    FilterCli::command()
        .get_subcommands()
        .map(|cmd| cmd.get_name().to_string())
        .collect()
}

/// Usage text printed for `--help` and bad invocations.
pub fn usage() -> String {
    let mut text = format!(
        "Usage: {PROGRAM_NAME} filter <KIND> <ARGS>...\n       {PROGRAM_NAME}-filter-<KIND> <ARGS>...\n\n\
         Reads paths from stdin, one per line, and prints those whose extension\n\
         manifest matches the filter. Output keeps input order.\n\nKinds:\n"
    );
    let mut cmd = FilterCli::command();
    cmd.build();
    for sub in cmd.get_subcommands() {
        let args: Vec<String> = sub
            .get_positionals()
            .map(|arg| {
                let name = arg
                    .get_value_names()
                    .and_then(|names| names.first())
                    .map(|name| name.to_string())
                    .unwrap_or_else(|| arg.get_id().to_string());
                if matches!(arg.get_action(), ArgAction::Append) {
                    format!("<{name}>...")
                } else {
                    format!("<{name}>")
                }
            })
            .collect();
        let about = sub.get_about().map(|s| s.to_string()).unwrap_or_default();
        text.push_str(&format!("  {} {}\n      {}\n", sub.get_name(), args.join(" "), about));
    }
    text
}
