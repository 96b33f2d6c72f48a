// Exponential reconnect backoff with jitter.
use rand::Rng;
use std::time::Duration;

/// Retry delay sequence: `min(cap, base * 2^n) * (1 ± jitter)`.
///
/// `reset` is called on every successful handshake so a stable connection
/// starts over from the base delay.
#[derive(Debug)]
pub struct ExponentialBackoff {
    base: Duration,
    cap: Duration,
    jitter: f64,
    attempt: u32,
}

impl ExponentialBackoff {
    pub fn new(base: Duration, cap: Duration, jitter: f64) -> Self {
        Self {
            base,
            cap,
            jitter: jitter.clamp(0.0, 1.0),
            attempt: 0,
        }
    }

    pub fn next(&mut self) -> Duration {
        // Saturate the exponent; past the cap the doubling is irrelevant.
        let exponent = self.attempt.min(16);
        self.attempt = self.attempt.saturating_add(1);
        let raw = self.base.as_secs_f64() * 2f64.powi(exponent as i32);
        let capped = raw.min(self.cap.as_secs_f64());
        let factor = if self.jitter > 0.0 {
            1.0 + rand::rng().random_range(-self.jitter..=self.jitter)
        } else {
            1.0
        };
        Duration::from_secs_f64(capped * factor)
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_up_to_the_cap_without_jitter() {
        let mut backoff =
            ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(30), 0.0);
        let delays: Vec<u64> = (0..7).map(|_| backoff.next().as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 16, 30, 30]);
    }

    #[test]
    fn reset_returns_to_base() {
        let mut backoff =
            ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(30), 0.0);
        for _ in 0..5 {
            backoff.next();
        }
        backoff.reset();
        assert_eq!(backoff.next(), Duration::from_secs(1));
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let mut backoff =
            ExponentialBackoff::new(Duration::from_secs(4), Duration::from_secs(30), 0.2);
        for _ in 0..100 {
            backoff.reset();
            let delay = backoff.next().as_secs_f64();
            assert!((3.2..=4.8).contains(&delay), "delay out of bounds: {delay}");
        }
    }

    #[test]
    fn attempt_counter_saturates() {
        let mut backoff =
            ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(30), 0.0);
        for _ in 0..1000 {
            assert!(backoff.next() <= Duration::from_secs(30));
        }
    }
}
