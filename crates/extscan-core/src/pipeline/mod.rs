//! Ordered concurrent line pipeline.
//!
//! Lines are opaque byte records split on `\n` (a trailing `\r` is dropped).
//! Filters see a lossy UTF-8 view; output repeats the original bytes.
//!
//! Every input line gets its own task on a [`LocalSet`]. Tasks evaluate
//! their filter as soon as they are spawned, so evaluations overlap and may
//! finish in any order. Output is serialised by a barrier chain: each task
//! holds the [`JoinHandle`] of the task spawned before it, and only after its
//! own verdict is ready does it await that handle. The handle resolves to a
//! [`Baton`] owning the output sinks, which the task writes to and then hands
//! on by returning it. Lines are therefore flushed strictly in input order
//! and no lock guards the sinks; whoever holds the baton may write.
//!
//! A hard failure (filter error, write error, read error) raises the halt
//! signal, which stops the reader at once. Tasks already spawned still run;
//! those before the failing line flush normally, those after it write
//! nothing. After end of input the reader awaits the last handle, which
//! resolves only once the whole chain has flushed.

use std::rc::Rc;

use anyhow::{anyhow, Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::watch;
use tokio::task::{self, JoinHandle, LocalSet};
use tracing::{debug, trace};

use crate::filter::{LineFilter, Verdict};

/// Counters for one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Lines read and handed to the filter.
    pub dispatched: u64,
    /// Lines written to the primary output.
    pub matched: u64,
    /// Lines that produced at least one warning.
    pub warned: u64,
}

/// Output sinks and counters handed from each line task to the next.
struct Baton<O, E> {
    out: O,
    err: E,
    stats: PipelineStats,
    failure: Option<anyhow::Error>,
}

/// Completion signal of the most recently spawned line task.
type Barrier<O, E> = JoinHandle<Result<Baton<O, E>>>;

/// What is left once a run has drained.
#[derive(Debug)]
pub struct Drained<O, E> {
    /// Primary output sink, flushed.
    pub out: O,
    /// Diagnostic sink, flushed.
    pub err: E,
    pub stats: PipelineStats,
    /// The first hard failure, if the run was aborted.
    pub failure: Option<anyhow::Error>,
}

impl<O, E> Drained<O, E> {
    /// Converts an aborted run into an error.
    pub fn into_result(self) -> Result<PipelineStats> {
        match self.failure {
            Some(failure) => Err(failure),
            None => Ok(self.stats),
        }
    }
}

/// Runs a [`LineFilter`] over newline-delimited input.
pub struct Pipeline<F> {
    filter: Rc<F>,
}

impl<F: LineFilter + 'static> Pipeline<F> {
    pub fn new(filter: F) -> Self {
        Self {
            filter: Rc::new(filter),
        }
    }

    /// Reads `input` to the end (or until a hard failure), writing matching
    /// lines to `out` and warnings to `err` in input order.
    ///
    /// Line tasks run on a fresh [`LocalSet`], so this future must be polled
    /// from a single thread (e.g. `block_on` on a current-thread runtime).
    ///
    /// # Errors
    /// Returns `Err` only if a line task panicked, in which case the sinks
    /// are lost. All other failures are reported in [`Drained::failure`].
    pub async fn run<R, O, E>(&self, input: R, out: O, err: E) -> Result<Drained<O, E>>
    where
        R: AsyncBufRead + Unpin,
        O: AsyncWrite + Unpin + 'static,
        E: AsyncWrite + Unpin + 'static,
    {
        LocalSet::new().run_until(self.drive(input, out, err)).await
    }

    async fn drive<R, O, E>(&self, input: R, out: O, err: E) -> Result<Drained<O, E>>
    where
        R: AsyncBufRead + Unpin,
        O: AsyncWrite + Unpin + 'static,
        E: AsyncWrite + Unpin + 'static,
    {
        let (halt_tx, mut halt_rx) = watch::channel(false);
        let halt = Rc::new(halt_tx);

        let mut barrier: Barrier<O, E> = task::spawn_local(async move {
            Ok(Baton {
                out,
                err,
                stats: PipelineStats::default(),
                failure: None,
            })
        });

        let mut records = input.split(b'\n');
        let mut seq: u64 = 0;
        let mut read_failure = None;

        loop {
            let next = tokio::select! {
                biased;
                _ = halted(&mut halt_rx) => {
                    debug!(seq, "halt raised, no further input is read");
                    break;
                }
                next = records.next_segment() => next,
            };

            match next {
                Ok(Some(mut record)) => {
                    if record.last() == Some(&b'\r') {
                        record.pop();
                    }
                    seq += 1;
                    trace!(seq, line = %String::from_utf8_lossy(&record), "dispatching");
                    barrier = task::spawn_local(settle(
                        Rc::clone(&self.filter),
                        seq,
                        record,
                        barrier,
                        Rc::clone(&halt),
                    ));
                }
                Ok(None) => {
                    debug!(lines = seq, "end of input");
                    break;
                }
                Err(e) => {
                    read_failure = Some(
                        anyhow::Error::new(e).context(format!("failed to read input line {}", seq + 1)),
                    );
                    halt.send_replace(true);
                    break;
                }
            }
        }

        let mut baton = barrier
            .await
            .map_err(|e| anyhow!("line task panicked: {e}"))??;

        if baton.failure.is_none() {
            baton.failure = read_failure;
        }
        if let Err(e) = baton.flush().await {
            baton.failure.get_or_insert(e);
        }

        debug!(stats = ?baton.stats, failed = baton.failure.is_some(), "pipeline drained");

        Ok(Drained {
            out: baton.out,
            err: baton.err,
            stats: baton.stats,
            failure: baton.failure,
        })
    }
}

/// Completes when the halt flag is raised.
async fn halted(rx: &mut watch::Receiver<bool>) {
    if rx.wait_for(|halted| *halted).await.is_err() {
        // Sender gone without halting: never fire.
        std::future::pending::<()>().await;
    }
}

/// Evaluates one line, then waits its turn and writes the result.
async fn settle<F, O, E>(
    filter: Rc<F>,
    seq: u64,
    line: Vec<u8>,
    barrier: Barrier<O, E>,
    halt: Rc<watch::Sender<bool>>,
) -> Result<Baton<O, E>>
where
    F: LineFilter,
    O: AsyncWrite + Unpin,
    E: AsyncWrite + Unpin,
{
    let text = String::from_utf8_lossy(&line);
    let outcome = filter.evaluate(&text).await;
    if outcome.is_err() {
        halt.send_replace(true);
    }

    let mut baton = barrier
        .await
        .map_err(|e| anyhow!("line task panicked before line {seq}: {e}"))??;
    baton.stats.dispatched += 1;

    if baton.failure.is_some() {
        trace!(seq, "skipping output after failure");
        return Ok(baton);
    }

    match outcome {
        Ok(verdict) => {
            trace!(seq, matched = verdict.matched, warnings = verdict.warnings.len(), "flushing");
            if let Err(e) = baton.emit(&line, &verdict).await {
                baton.failure = Some(e.context(format!("failed to write output for line {seq}")));
                halt.send_replace(true);
            }
        }
        Err(e) => {
            debug!(seq, error = %e, "line failed");
            baton.failure = Some(e.context(format!("line {seq} ({text})")));
        }
    }

    Ok(baton)
}

impl<O, E> Baton<O, E>
where
    O: AsyncWrite + Unpin,
    E: AsyncWrite + Unpin,
{
    /// Writes warnings, then the line itself if it matched.
    async fn emit(&mut self, line: &[u8], verdict: &Verdict) -> Result<()> {
        if !verdict.warnings.is_empty() {
            self.stats.warned += 1;
            for warning in &verdict.warnings {
                let mut diagnostic = Vec::with_capacity(line.len() + warning.len() + 3);
                diagnostic.extend_from_slice(line);
                diagnostic.extend_from_slice(b": ");
                diagnostic.extend_from_slice(warning.as_bytes());
                diagnostic.push(b'\n');
                self.err
                    .write_all(&diagnostic)
                    .await
                    .context("failed to write diagnostics")?;
            }
            self.err.flush().await.context("failed to write diagnostics")?;
        }

        if verdict.matched {
            self.stats.matched += 1;
            self.out.write_all(line).await?;
            self.out.write_all(b"\n").await?;
            self.out.flush().await?;
        }

        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        self.out.flush().await.context("failed to flush output")?;
        self.err.flush().await.context("failed to flush diagnostics")?;
        Ok(())
    }
}
