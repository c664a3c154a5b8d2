mod human;
mod json;

pub use self::{human::HumanReporter, json::JsonlReporter};

pub trait Reporter: Send + Sync + 'static {
    fn on_result(&mut self, ev: &SparkResultEvent);
    fn on_tick(&mut self, now: std::time::Duration);
    fn finish(&mut self, summary: &RunSummary);
}

#[derive(Default)]
pub struct Counters {
    total: u64,
    ok: u64,
    http_fail: u64,
    transport_fail: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    HttpStatus,
    Transport,
}

/// Result of a single dispatched spark, as observed by the run loop.
#[derive(Debug)]
pub struct SparkResultEvent {
    pub elapsed: std::time::Duration,
    pub index: u64,
    pub x: u32,
    pub y: u32,
    pub latency: std::time::Duration,
    pub status: Option<u16>,
    pub detail: Option<String>,
}

impl SparkResultEvent {
    pub fn is_ok(&self) -> bool {
        self.status.is_some_and(|status| (200..400).contains(&status))
    }

    pub fn failure(&self) -> Option<FailureKind> {
        if self.is_ok() {
            return None;
        }
        Some(match self.status {
            Some(_) => FailureKind::HttpStatus,
            None => FailureKind::Transport,
        })
    }
}

/// Final totals for a completed run.
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    pub elapsed: std::time::Duration,
    pub sent: u64,
    pub dry_run: bool,
}

impl RunSummary {
    pub fn realized_rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            0.0
        } else {
            self.sent as f64 / secs
        }
    }
}
