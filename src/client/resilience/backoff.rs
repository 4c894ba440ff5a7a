//! Delay schedule between retry attempts.

use std::time::Duration;

/// `initial * multiplier^(attempt - 1)`, capped at `max`.
///
/// Delays are deterministic unless a jitter fraction is configured, in which
/// case each delay is spread uniformly over `delay * (1 ± jitter)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialBackoff {
    initial: Duration,
    max: Duration,
    multiplier: f64,
    jitter: Option<f64>,
}

impl ExponentialBackoff {
    pub fn new(initial: Duration, max: Duration, multiplier: f64) -> Self {
        Self {
            initial,
            max: max.max(initial),
            multiplier: multiplier.max(1.0),
            jitter: None,
        }
    }

    /// Spread delays by up to `fraction` in either direction (clamped to 0..=1).
    pub fn with_jitter(mut self, fraction: f64) -> Self {
        let fraction = fraction.clamp(0.0, 1.0);
        self.jitter = (fraction > 0.0).then_some(fraction);
        self
    }

    pub fn initial(&self) -> Duration {
        self.initial
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let base_ms = self.initial.as_millis() as f64 * self.multiplier.powi(exponent);
        let max_ms = self.max.as_millis() as f64;
        let mut delay_ms = if base_ms.is_finite() {
            base_ms.min(max_ms)
        } else {
            max_ms
        };

        if let Some(fraction) = self.jitter {
            delay_ms *= 1.0 + rand::random_range(-fraction..=fraction);
        }
        Duration::from_millis(delay_ms.round() as u64)
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(Duration::from_millis(500), Duration::from_secs(5), 2.0)
    }
}
