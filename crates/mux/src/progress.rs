//! Progress reporting for a mux session.

use crossbeam::channel::Sender;

use crate::error::MuxError;
use crate::session::MuxSummary;

/// Progress update sent over a channel.
#[derive(Clone, Debug, PartialEq)]
pub enum MuxProgress {
    /// The session has written the segment header.
    Started,
    /// Fraction of the total work done, in `[0, 1]`.
    Progress { fraction: f64 },
    /// The segment is finalized.
    Completed {
        /// Total bytes in the output.
        bytes_written: u64,
    },
    /// The session failed; the output is not valid.
    Failed { error: String },
}

impl MuxProgress {
    /// Get the progress as a fraction (0.0 to 1.0).
    pub fn progress_fraction(&self) -> f64 {
        match self {
            Self::Started => 0.0,
            Self::Progress { fraction } => *fraction,
            Self::Completed { .. } => 1.0,
            Self::Failed { .. } => 0.0,
        }
    }

    /// Whether no further updates will follow.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }
}

/// Receiver of session progress.
pub trait ProgressSink {
    fn on_started(&mut self) {}

    /// `fraction` is in `[0, 1]`.
    fn on_progress(&mut self, fraction: f64);

    fn on_finished(&mut self, _result: Result<&MuxSummary, &MuxError>) {}
}

impl<F: FnMut(f64)> ProgressSink for F {
    fn on_progress(&mut self, fraction: f64) {
        self(fraction)
    }
}

impl ProgressSink for Sender<MuxProgress> {
    fn on_started(&mut self) {
        let _ = self.send(MuxProgress::Started);
    }

    fn on_progress(&mut self, fraction: f64) {
        let _ = self.send(MuxProgress::Progress { fraction });
    }

    fn on_finished(&mut self, result: Result<&MuxSummary, &MuxError>) {
        let update = match result {
            Ok(summary) => MuxProgress::Completed {
                bytes_written: summary.segment.bytes_written,
            },
            Err(e) => MuxProgress::Failed {
                error: e.to_string(),
            },
        };
        let _ = self.send(update);
    }
}

/// Maps a pass-local fraction into the session's overall range.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct ProgressRange {
    pub start: f64,
    pub end: f64,
    /// `end` itself is never reported; the next range owns it.
    pub open_end: bool,
}

impl ProgressRange {
    pub const FULL: Self = Self {
        start: 0.0,
        end: 1.0,
        open_end: false,
    };
    pub const FIRST_HALF: Self = Self {
        start: 0.0,
        end: 0.5,
        open_end: true,
    };
    pub const SECOND_HALF: Self = Self {
        start: 0.5,
        end: 1.0,
        open_end: false,
    };

    /// Overall fraction for a block at `timestamp_ms` out of `duration_s`.
    /// `None` when the duration is unknown.
    pub fn fraction(self, timestamp_ms: u64, duration_s: f64) -> Option<f64> {
        if duration_s <= 0.0 {
            return None;
        }
        let local = (timestamp_ms as f64 / (duration_s * 1000.0)).clamp(0.0, 1.0);
        let overall = self.start + local * (self.end - self.start);
        if self.open_end && overall >= self.end {
            return Some(self.end - f64::EPSILON);
        }
        Some(overall)
    }
}
