use std::collections::VecDeque;

use rand::{SeedableRng as _, rngs::SmallRng};
use tokio::time::Instant;

use crate::spark::{MAX_COORD, SparkPayload, SparkTuning, pattern::Pattern};

use super::pacer::RatePacer;

/// A single spark request, ready for dispatch.
///
/// Created once per generated point and consumed by exactly one transport
/// call.
#[derive(Debug, Clone)]
pub(super) struct DispatchTask {
    pub(super) index: u64,
    pub(super) x: u32,
    pub(super) y: u32,
    pub(super) url: String,
    pub(super) payload: SparkPayload,
}

/// Produces spark dispatch tasks in paced batches.
///
/// Each tick draws one batch from the pacer and materializes that many
/// tasks; `next_task` hands them out one by one. The generator is exhausted
/// (`None`) once the configured request ceiling is reached; without a
/// ceiling it produces tasks forever.
pub(super) struct SparkGenerator {
    base_url: String,
    pattern: Pattern,
    tuning: SparkTuning,
    batch: u32,
    remaining: Option<u64>,
    step: u64,
    start: Instant,
    pacer: RatePacer,
    rng: SmallRng,
    buffered: VecDeque<DispatchTask>,
}

impl SparkGenerator {
    #[allow(clippy::too_many_arguments)]
    pub(super) fn new(
        base_url: String,
        pattern: Pattern,
        tuning: SparkTuning,
        rate: u32,
        batch: u32,
        jitter: f64,
        count: u64,
    ) -> Self {
        Self::new_with_rng(
            base_url,
            pattern,
            tuning,
            rate,
            batch,
            jitter,
            count,
            SmallRng::from_os_rng(),
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn new_with_rng(
        base_url: String,
        pattern: Pattern,
        tuning: SparkTuning,
        rate: u32,
        batch: u32,
        jitter: f64,
        count: u64,
        rng: SmallRng,
    ) -> Self {
        let batch = batch.max(1);
        Self {
            base_url,
            pattern,
            tuning,
            batch,
            remaining: (count > 0).then_some(count),
            step: 0,
            start: Instant::now(),
            pacer: RatePacer::new(rate, batch, jitter),
            rng,
            buffered: VecDeque::with_capacity(batch as usize),
        }
    }

    /// Produce the next task, applying the pacing delay at tick boundaries.
    ///
    /// Returns `None` once the request ceiling is reached.
    pub(super) async fn next_task(&mut self) -> Option<DispatchTask> {
        if let Some(task) = self.buffered.pop_front() {
            return Some(task);
        }

        let want = match self.remaining {
            Some(0) => return None,
            Some(n) => (self.batch as u64).min(n) as u32,
            None => self.batch,
        };

        self.pacer.wait_for(want).await;

        for _ in 0..want {
            let task = self.build_task();
            self.buffered.push_back(task);
        }
        if let Some(n) = &mut self.remaining {
            *n -= want as u64;
        }

        self.buffered.pop_front()
    }

    fn build_task(&mut self) -> DispatchTask {
        let (x, y) = self.pattern.point_at(self.step, MAX_COORD, &mut self.rng);
        let t_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        let payload = self.tuning.payload_at(t_ms, self.step, x, y, MAX_COORD);

        let task = DispatchTask {
            index: self.step,
            x,
            y,
            url: format!("{}/api/{x}/{y}", self.base_url),
            payload,
        };
        self.step += 1;
        task
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn seeded_generator(pattern: Pattern, rate: u32, batch: u32, count: u64) -> SparkGenerator {
        SparkGenerator::new_with_rng(
            "http://127.0.0.1:4000".to_owned(),
            pattern,
            SparkTuning::default(),
            rate,
            batch,
            0.0,
            count,
            SmallRng::seed_from_u64(7),
        )
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn request_ceiling_is_exact() {
        let mut generator = seeded_generator(Pattern::Random, 1000, 4, 10);

        let mut seen = 0u64;
        while let Some(task) = generator.next_task().await {
            assert_eq!(seen, task.index);
            assert!(task.x <= MAX_COORD && task.y <= MAX_COORD);
            assert_eq!(
                format!("http://127.0.0.1:4000/api/{}/{}", task.x, task.y),
                task.url,
            );
            seen += 1;
        }

        assert_eq!(10, seen);
        // exhausted generators stay exhausted
        assert!(generator.next_task().await.is_none());
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn final_tick_is_trimmed_to_the_ceiling() {
        let mut generator = seeded_generator(Pattern::Golden, 1000, 4, 6);

        let mut seen = 0u64;
        while generator.next_task().await.is_some() {
            seen += 1;
        }
        assert_eq!(6, seen);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn batches_are_paced_at_the_target_rate() {
        // 4 tokens per second, batch of 2: the second tick has to wait for
        // half a second of refill.
        let mut generator = seeded_generator(Pattern::Lissajous, 4, 2, 6);

        let start = Instant::now();
        for _ in 0..2 {
            generator.next_task().await.expect("first tick");
        }
        assert_eq!(Duration::from_secs(0), start.elapsed());

        for _ in 0..2 {
            generator.next_task().await.expect("second tick");
        }
        assert!(start.elapsed() >= Duration::from_millis(500));
        assert!(start.elapsed() < Duration::from_millis(600));
    }
}
