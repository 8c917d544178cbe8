//! Display sinks owned by the host
//!
//! - `TextSink`: writes each frame as two text lines (terminal, pipes)
//! - `MemorySink`: keeps frames in memory (tests, snapshots)

use calc_core::{DisplayModel, DisplaySink};
use std::io::Write;
use tracing::warn;

/// Writes frames as `main line` + `status line`
pub struct TextSink<W: Write> {
    out: W,
    frames: usize,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, frames: 0 }
    }

    /// Number of frames presented
    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> DisplaySink for TextSink<W> {
    fn present(&mut self, model: &DisplayModel) {
        self.frames += 1;
        let written = writeln!(self.out, "{}", model.line_with_cursor())
            .and_then(|_| writeln!(self.out, "  {}", model.status_line()))
            .and_then(|_| self.out.flush());
        if let Err(err) = written {
            warn!(%err, "failed to write frame");
        }
    }
}

/// Keeps every presented frame
#[derive(Debug, Default)]
pub struct MemorySink {
    frames: Vec<DisplayModel>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[DisplayModel] {
        &self.frames
    }

    pub fn last(&self) -> Option<&DisplayModel> {
        self.frames.last()
    }
}

impl DisplaySink for MemorySink {
    fn present(&mut self, model: &DisplayModel) {
        self.frames.push(model.clone());
    }
}
