use std::time::Duration;

use rand::{Rng as _, SeedableRng as _};
use tokio::time::{Instant, sleep};

/// Token bucket rate pacer.
///
/// The pacer maintains a floating point token count.
/// Tokens refill continuously at `rate` per second, capped by the batch
/// size. Emitting a tick consumes one batch worth of tokens; if the balance
/// is short the pacer sleeps the remaining slice of the inter-tick
/// interval, so the long term average converges to the configured rate
/// without requiring precise timer guarantees.
///
/// Jitter is applied to the computed sleep duration.
/// Token accounting is not jittered.
pub(super) struct RatePacer {
    rate: f64,
    capacity: f64,
    tokens: f64,
    last: Instant,
    jitter: f64,
    rng: rand::rngs::SmallRng,
}

impl RatePacer {
    pub(super) fn new(rate: u32, batch: u32, jitter: f64) -> Self {
        Self::new_with_rng(rate, batch, jitter, rand::rngs::SmallRng::from_os_rng())
    }

    fn new_with_rng(rate: u32, batch: u32, jitter: f64, rng: rand::rngs::SmallRng) -> Self {
        let normalised_rate = rate.max(1) as f64;
        let capacity = batch.max(1) as f64;

        Self {
            rate: normalised_rate,
            capacity,
            tokens: capacity,
            last: Instant::now(),
            jitter: jitter.clamp(0.0, 1.0),
            rng,
        }
    }

    /// Draw `permits` tokens, sleeping until the bucket covers them.
    ///
    /// Draws larger than one batch are capped to the bucket capacity,
    /// otherwise the bucket could never fill far enough.
    pub(super) async fn wait_for(&mut self, permits: u32) {
        let want = (permits.max(1) as f64).min(self.capacity);
        loop {
            self.refill();

            if self.tokens >= want {
                self.tokens -= want;
                return;
            }

            let missing = want - self.tokens;
            let wait = self.jittered(Duration::from_secs_f64(missing / self.rate));

            // Guard against sleeping for zero when we still need to wait.
            let wait = if wait.is_zero() {
                Duration::from_nanos(1)
            } else {
                wait
            };

            sleep(wait).await;
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f64();
        self.last = now;

        self.tokens = (self.tokens + dt * self.rate).min(self.capacity);
    }

    fn jittered(&mut self, d: Duration) -> Duration {
        if self.jitter <= 0.0 {
            return d;
        }

        let lo = 1.0 - self.jitter;
        let hi = 1.0 + self.jitter;
        let m = self.rng.random_range(lo..=hi);

        Duration::from_secs_f64((d.as_secs_f64() * m).max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::{task::yield_now, time};

    fn seeded_pacer(rate: u32, batch: u32, jitter: f64, seed: u64) -> RatePacer {
        let rng = rand::rngs::SmallRng::seed_from_u64(seed);
        RatePacer::new_with_rng(rate, batch, jitter, rng)
    }

    #[tokio::test(flavor = "current_thread")]
    async fn first_batch_passes_without_sleeping() {
        time::pause();

        let mut p = seeded_pacer(10, 3, 0.0, 1);

        // The bucket starts full, one whole batch is free.
        p.wait_for(3).await;

        // The next draw should block because no time has advanced to refill.
        let h = tokio::spawn(async move {
            let mut p = p;
            p.wait_for(3).await;
            p
        });

        yield_now().await;
        assert!(!h.is_finished());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn refills_at_rate_after_time_advances() {
        time::pause();

        let mut p = seeded_pacer(2, 1, 0.0, 2);

        // Consume the single burst token.
        p.wait_for(1).await;

        // The next draw should need 0.5 seconds at 2 tokens per second.
        let h = tokio::spawn(async move {
            let mut p = p;
            p.wait_for(1).await;
            p
        });

        yield_now().await;
        assert!(!h.is_finished());

        time::advance(Duration::from_millis(499)).await;
        yield_now().await;
        assert!(!h.is_finished());

        time::advance(Duration::from_millis(1)).await;
        let _p = h.await.expect("task join");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn oversized_draws_are_capped_to_capacity() {
        time::pause();

        let mut p = seeded_pacer(3, 3, 0.0, 3);

        // Wanting more than one batch must not deadlock on an unreachable
        // token balance.
        p.wait_for(10).await;
        assert!(p.tokens.abs() < f64::EPSILON);
    }

    #[test]
    fn jitter_bounds_are_respected() {
        let mut p = seeded_pacer(10, 1, 0.25, 4);
        let d = Duration::from_secs(10);

        let j = p.jittered(d);
        let secs = j.as_secs_f64();

        // jitter 0.25 means multiplier in [0.75, 1.25]
        assert!(secs >= 7.5);
        assert!(secs <= 12.5);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn refill_caps_at_capacity() {
        time::pause();

        let mut p = seeded_pacer(100, 5, 0.0, 5);

        // Put the pacer in a depleted state.
        p.tokens = 0.0;
        p.last = Instant::now();

        time::advance(Duration::from_secs(1)).await;

        p.refill();
        assert_eq!(p.tokens, 5.0);
    }
}
