//! Reporting sinks for the per-cycle ranking.

use std::fmt::Write as _;
use std::io::{self, Stdout, Write};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

use crate::config::DisplayMode;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report: {0}")]
    Io(#[from] io::Error),
}

/// Receives the top-K ranking at the end of every cycle.
pub trait ReportSink: Send + Sync {
    fn report(&self, top: &[(String, u64)]) -> Result<(), ReportError>;
}

/// Prints `Top {k} apps exceeding threshold: [("app1", 5), ...]` lines.
pub struct ConsoleSink<W> {
    top_k: usize,
    out: Mutex<W>,
}

impl ConsoleSink<Stdout> {
    pub fn stdout(top_k: usize) -> Self {
        Self::new(top_k, io::stdout())
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(top_k: usize, out: W) -> Self {
        Self {
            top_k,
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> ReportSink for ConsoleSink<W> {
    fn report(&self, top: &[(String, u64)]) -> Result<(), ReportError> {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(
            out,
            "Top {} apps exceeding threshold: {}",
            self.top_k,
            format_ranking(top)
        )?;
        out.flush()?;
        Ok(())
    }
}

/// Discards reports; the ranking is only served over HTTP.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl ReportSink for NoopSink {
    fn report(&self, _top: &[(String, u64)]) -> Result<(), ReportError> {
        Ok(())
    }
}

/// The sink matching a display mode.
pub fn sink_for(mode: DisplayMode, top_k: usize) -> Arc<dyn ReportSink> {
    if mode.shows_console() {
        Arc::new(ConsoleSink::stdout(top_k))
    } else {
        Arc::new(NoopSink)
    }
}

/// `[("app1", 5), ("app2", 3)]`
pub fn format_ranking(top: &[(String, u64)]) -> String {
    let mut out = String::from("[");
    for (i, (name, count)) in top.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "({:?}, {})", name, count);
    }
    out.push(']');
    out
}
