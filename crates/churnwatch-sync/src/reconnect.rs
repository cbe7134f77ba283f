//! Push channel reconnection policy.
//!
//! The backend contract only promises that a dropped channel may come back.
//! The default policy doubles the delay per consecutive failure, caps it,
//! optionally adds jitter, and gives up after a bounded number of attempts.

use std::time::Duration;

use rand::Rng;

use churnwatch_core::config::ReconnectConfig;

/// How long to wait before the next connection attempt, and when to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectPolicy {
    /// Same delay every time.
    Fixed {
        delay: Duration,
        /// `None` retries forever.
        max_attempts: Option<u32>,
    },
    /// `base * 2^(attempt-1)`, capped at `max`.
    Exponential {
        base: Duration,
        max: Duration,
        /// Equal jitter: the delay is drawn from `[d/2, d]`.
        jitter: bool,
        max_attempts: Option<u32>,
    },
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::from(&ReconnectConfig::default())
    }
}

impl From<&ReconnectConfig> for ReconnectPolicy {
    fn from(config: &ReconnectConfig) -> Self {
        let max_attempts = (config.max_attempts > 0).then_some(config.max_attempts);
        match config.strategy.as_str() {
            "fixed" => ReconnectPolicy::Fixed {
                delay: Duration::from_millis(config.base_delay_ms),
                max_attempts,
            },
            _ => ReconnectPolicy::Exponential {
                base: Duration::from_millis(config.base_delay_ms),
                max: Duration::from_millis(config.max_delay_ms),
                jitter: config.jitter,
                max_attempts,
            },
        }
    }
}

impl ReconnectPolicy {
    /// Five seconds, forever.
    pub fn fixed_five_seconds() -> Self {
        ReconnectPolicy::Fixed {
            delay: Duration::from_secs(5),
            max_attempts: None,
        }
    }

    pub fn max_attempts(&self) -> Option<u32> {
        match self {
            ReconnectPolicy::Fixed { max_attempts, .. }
            | ReconnectPolicy::Exponential { max_attempts, .. } => *max_attempts,
        }
    }

    /// Delay before reconnection attempt number `attempt` (1-based, counted
    /// since the last successful open). `None` means give up.
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 {
            return Some(Duration::ZERO);
        }
        if let Some(max) = self.max_attempts() {
            if attempt > max {
                return None;
            }
        }
        match *self {
            ReconnectPolicy::Fixed { delay, .. } => Some(delay),
            ReconnectPolicy::Exponential {
                base, max, jitter, ..
            } => {
                let shift = (attempt - 1).min(31);
                let delay = base.saturating_mul(1u32 << shift).min(max);
                if jitter {
                    let half = delay / 2;
                    let spread = rand::thread_rng().gen_range(0..=half.as_millis() as u64);
                    Some(half + Duration::from_millis(spread))
                } else {
                    Some(delay)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exponential(jitter: bool, max_attempts: Option<u32>) -> ReconnectPolicy {
        ReconnectPolicy::Exponential {
            base: Duration::from_secs(5),
            max: Duration::from_secs(60),
            jitter,
            max_attempts,
        }
    }

    #[test]
    fn fixed_policy_repeats_the_same_delay() {
        let policy = ReconnectPolicy::fixed_five_seconds();
        for attempt in 1..50 {
            assert_eq!(policy.next_delay(attempt), Some(Duration::from_secs(5)));
        }
    }

    #[test]
    fn exponential_policy_doubles_then_caps() {
        let policy = exponential(false, None);
        let delays: Vec<u64> = (1..=6)
            .map(|a| policy.next_delay(a).unwrap().as_secs())
            .collect();
        assert_eq!(delays, vec![5, 10, 20, 40, 60, 60]);
        assert_eq!(policy.next_delay(200), Some(Duration::from_secs(60)));
    }

    #[test]
    fn jitter_stays_within_half_to_full_delay() {
        let policy = exponential(true, None);
        for attempt in 1..=8 {
            let full = exponential(false, None).next_delay(attempt).unwrap();
            for _ in 0..20 {
                let d = policy.next_delay(attempt).unwrap();
                assert!(d >= full / 2 && d <= full, "attempt {attempt}: {d:?}");
            }
        }
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let policy = exponential(false, Some(3));
        assert!(policy.next_delay(3).is_some());
        assert_eq!(policy.next_delay(4), None);
    }

    #[test]
    fn builds_from_config() {
        let config = ReconnectConfig {
            strategy: "fixed".into(),
            base_delay_ms: 2_000,
            max_attempts: 0,
            ..Default::default()
        };
        assert_eq!(
            ReconnectPolicy::from(&config),
            ReconnectPolicy::Fixed {
                delay: Duration::from_secs(2),
                max_attempts: None,
            }
        );

        let default = ReconnectPolicy::default();
        assert_eq!(default.max_attempts(), Some(10));
        assert!(matches!(
            default,
            ReconnectPolicy::Exponential { jitter: true, .. }
        ));
    }
}
