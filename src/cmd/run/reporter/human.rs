use super::{Counters, FailureKind, Reporter, RunSummary, SparkResultEvent};

/// Echo at most this many transport failure details before going quiet;
/// an unreachable target would otherwise flood the console.
const MAX_ECHOED_FAILURES: u64 = 10;

pub struct HumanReporter {
    interval: std::time::Duration,
    last_tick: std::time::Duration,
    interval_counts: Counters,
    total_counts: Counters,
    echoed_failures: u64,
}

impl HumanReporter {
    pub fn new(interval: std::time::Duration) -> Self {
        Self {
            interval,
            last_tick: std::time::Duration::ZERO,
            interval_counts: Counters::default(),
            total_counts: Counters::default(),
            echoed_failures: 0,
        }
    }

    pub(super) fn apply_counts(c: &mut Counters, ev: &SparkResultEvent) {
        c.total += 1;
        if ev.is_ok() {
            c.ok += 1;
            return;
        }
        match ev.failure() {
            Some(FailureKind::HttpStatus) => c.http_fail += 1,
            _ => c.transport_fail += 1,
        }
    }
}

impl Reporter for HumanReporter {
    fn on_result(&mut self, ev: &SparkResultEvent) {
        Self::apply_counts(&mut self.interval_counts, ev);
        Self::apply_counts(&mut self.total_counts, ev);

        if ev.failure() == Some(FailureKind::Transport)
            && self.echoed_failures < MAX_ECHOED_FAILURES
        {
            self.echoed_failures += 1;
            println!(
                "spark ({}, {}) failed in transport: {}",
                ev.x,
                ev.y,
                ev.detail.as_deref().unwrap_or("unknown error"),
            );
        }
    }

    fn on_tick(&mut self, now: std::time::Duration) {
        if now.saturating_sub(self.last_tick) < self.interval {
            return;
        }
        self.last_tick = now;

        let rps = self.interval_counts.total as f64 / self.interval.as_secs_f64();
        println!(
            "t={:.1}s rps={:.1} ok={} http_fail={} transport_fail={} total_ok={} total_fail={}",
            now.as_secs_f64(),
            rps,
            self.interval_counts.ok,
            self.interval_counts.http_fail,
            self.interval_counts.transport_fail,
            self.total_counts.ok,
            self.total_counts.total - self.total_counts.ok,
        );

        self.interval_counts = Counters::default();
    }

    fn finish(&mut self, summary: &RunSummary) {
        if summary.dry_run {
            println!(
                "done (dry run) sent={} in {:.1}s",
                summary.sent,
                summary.elapsed.as_secs_f64(),
            );
            return;
        }

        println!(
            "done sent={} in {:.1}s ({:.1} req/s) ok={} http_fail={} transport_fail={}",
            summary.sent,
            summary.elapsed.as_secs_f64(),
            summary.realized_rate(),
            self.total_counts.ok,
            self.total_counts.http_fail,
            self.total_counts.transport_fail,
        );
    }
}
