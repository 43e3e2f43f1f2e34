use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

/// Injected artificial-latency capability. The dispatcher uses it to emulate
/// backend latency when the backend is disabled, and the orchestrator uses it
/// to pad rate-limited responses. Injecting it keeps tests free of real
/// sleeps.
#[async_trait]
pub trait Pause: Send + Sync {
    /// Waits a uniformly random duration in `[min, max]`.
    async fn pause(&self, min: Duration, max: Duration);
}

/// Production implementation: uniform sample, tokio sleep.
pub struct RandomPause;

#[async_trait]
impl Pause for RandomPause {
    async fn pause(&self, min: Duration, max: Duration) {
        let min_ms = min.as_millis() as u64;
        let max_ms = max.as_millis() as u64;
        let chosen_ms = if max_ms > min_ms {
            rand::thread_rng().gen_range(min_ms..=max_ms)
        } else {
            min_ms
        };
        tokio::time::sleep(Duration::from_millis(chosen_ms)).await;
    }
}

/// Returns immediately. For tests and tooling that must not block.
pub struct NoPause;

#[async_trait]
impl Pause for NoPause {
    async fn pause(&self, _min: Duration, _max: Duration) {}
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{Pause, RandomPause};

    #[tokio::test(start_paused = true)]
    async fn random_pause_stays_within_the_requested_bounds() {
        let pause = RandomPause;
        let started = tokio::time::Instant::now();

        pause.pause(Duration::from_millis(200), Duration::from_millis(500)).await;

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(200), "paused only {elapsed:?}");
        assert!(elapsed <= Duration::from_millis(500), "paused {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn degenerate_range_uses_the_lower_bound() {
        let pause = RandomPause;
        let started = tokio::time::Instant::now();

        pause.pause(Duration::from_millis(300), Duration::from_millis(300)).await;

        assert!(started.elapsed() >= Duration::from_millis(300));
    }
}
