use std::time::Duration;

/// How long to wait before re-subscribing after a subscription failure.
///
/// `attempt` counts consecutive failures before the current try. The first try after a
/// failure (attempt 0) never waits. There is no attempt limit.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconnectPolicy {
    Immediate,
    Backoff {
        base: Duration,
        max: Duration,
        multiplier: f64,
    },
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        ReconnectPolicy::Backoff {
            base: Duration::from_millis(100),
            max: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

impl ReconnectPolicy {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self {
            ReconnectPolicy::Immediate => Duration::ZERO,
            ReconnectPolicy::Backoff { .. } if attempt == 0 => Duration::ZERO,
            ReconnectPolicy::Backoff {
                base,
                max,
                multiplier,
            } => {
                let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
                let delay = base.as_secs_f64() * multiplier.max(1.0).powi(exponent);
                if delay.is_finite() && delay < max.as_secs_f64() {
                    Duration::from_secs_f64(delay)
                } else {
                    *max
                }
            }
        }
    }
}
