//! `extscan filter` command.
//!
//! Streams paths from stdin through a [`Filter`] on a single-threaded tokio
//! runtime and prints the matching ones.

use anyhow::{Context, Result};
use extscan_core::{Drained, Filter, Pipeline};
use std::process::ExitCode;
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};

/// Run a filter over stdin.
///
/// # Returns
/// Exit code: 0 when all input was processed (matches or not). A hard
/// failure is returned as an error after the output that preceded it has
/// been flushed.
pub fn run(filter: Filter) -> Result<ExitCode> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    let drained = rt.block_on(execute(
        filter,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        tokio::io::stderr(),
    ));
    // A stdin read that is still blocked after a halt cannot be cancelled;
    // do not wait for it.
    rt.shutdown_background();

    let stats = drained?.into_result()?;
    tracing::debug!(?stats, "filter finished");
    Ok(ExitCode::SUCCESS)
}

/// Runs `filter` over `input`, writing to the given sinks.
pub async fn execute<R, O, E>(filter: Filter, input: R, out: O, err: E) -> Result<Drained<O, E>>
where
    R: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin + 'static,
    E: AsyncWrite + Unpin + 'static,
{
    tracing::debug!(kind = filter.kind(), "starting filter");
    Pipeline::new(filter).run(input, out, err).await
}
