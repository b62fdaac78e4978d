use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which frames of a video are submitted to the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingPolicy {
    /// Only frames whose index is a multiple of `stride` are detected
    pub stride: u64,
    /// Sampling ends once more than this many frames were read
    pub frame_ceiling: u64,
    /// Sampling ends at the first frame with a detection
    pub stop_on_detection: bool,
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        Self {
            stride: 10,
            frame_ceiling: 100,
            stop_on_detection: true,
        }
    }
}

impl SamplingPolicy {
    pub fn should_sample(&self, frame_index: u64) -> bool {
        frame_index % self.stride.max(1) == 0
    }

    /// Evaluated after `frames_read` frames were consumed.
    pub fn should_stop(&self, frames_read: u64, detected: bool) -> bool {
        frames_read > self.frame_ceiling || (self.stop_on_detection && detected)
    }
}

/// Bounded exponential back-off for backend calls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    #[serde(with = "millis")]
    pub initial_backoff: Duration,
    pub multiplier: f64,
    /// Upper bound for any single delay
    #[serde(with = "millis")]
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl RetryPolicy {
    /// Single attempt, the behaviour of a plain fire-and-forget report.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::from_millis(500),
            multiplier: 2.0,
            max_backoff: Duration::from_secs(30),
        }
    }

    pub fn with_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::none()
        }
    }

    /// Delay before attempt number `attempt` (1-based); `None` once attempts run out.
    pub fn backoff(&self, attempt: u32) -> Option<Duration> {
        if attempt <= 1 {
            return Some(Duration::ZERO);
        }
        if attempt > self.max_attempts {
            return None;
        }

        let exponent = i32::try_from(attempt - 2).unwrap_or(i32::MAX);
        let delay = self.initial_backoff.as_secs_f64() * self.multiplier.max(1.0).powi(exponent);
        let delay = Duration::try_from_secs_f64(delay).unwrap_or(Duration::MAX);

        Some(delay.min(self.max_backoff))
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
