/// Cooperative cancellation and progress reporting
///
/// A sink is only ever driven from the coordinating thread of a run, never
/// from workers, so implementations may hold non-thread-safe state.
use std::time::{Duration, Instant};

use crate::error::SearchError;

pub trait ProgressSink {
    /// Return true to request that the run stops
    fn poll_cancel(&mut self) -> bool {
        false
    }

    /// Fraction of queries completed, in 0..=1
    fn report_progress(&mut self, _fraction: f64) {}
}

/// Never cancels, reports nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {}

/// Logs progress whenever the whole percentage changes
#[derive(Debug, Default)]
pub struct LogProgress {
    label: String,
    last_percent: u32,
}

impl LogProgress {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            last_percent: 0,
        }
    }
}

impl ProgressSink for LogProgress {
    fn report_progress(&mut self, fraction: f64) {
        let percent = (100.0 * fraction.clamp(0.0, 1.0)).floor() as u32;
        if percent > self.last_percent {
            log::info!("{}: {}% complete", self.label, percent);
            self.last_percent = percent;
        }
    }
}

/// Wall-clock throttle around a sink, so tight loops can poll cheaply
pub struct Interrupt<'a, S: ProgressSink + ?Sized> {
    sink: &'a mut S,
    interval: Duration,
    last: Instant,
}

impl<'a, S: ProgressSink + ?Sized> Interrupt<'a, S> {
    pub fn new(sink: &'a mut S, interval: Duration) -> Self {
        Self {
            sink,
            interval,
            last: Instant::now(),
        }
    }

    /// Poll the sink if at least one interval has elapsed since the last poll
    pub fn check(&mut self) -> Result<(), SearchError> {
        if self.last.elapsed() >= self.interval {
            self.last = Instant::now();
            if self.sink.poll_cancel() {
                return Err(SearchError::Cancelled);
            }
        }
        Ok(())
    }
}
