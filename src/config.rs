//! Servo configuration parameters
//!
//! All tunable parameters for the oscillation profile and worker threads.
//! Values can be overridden via NVS (non-volatile storage).

use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::pins;

/// Oscillation profile and runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServoConfig {
    // --- Channel ---
    /// PWM carrier frequency (Hz). Fixed at the 50 Hz servo frame rate;
    /// stored so a mismatched NVS blob is caught on load.
    pub pwm_frequency_hz: u32,

    // --- Kick phase ---
    /// Duty cycle (%) that breaks static friction at the start of each cycle
    pub kick_duty_percent: f32,
    /// How long the kick duty is held (milliseconds)
    pub kick_hold_ms: u32,

    // --- Rest phase ---
    /// Duty cycle (%) held for the remainder of each cycle
    pub rest_duty_percent: f32,
    /// How long the rest duty is held (milliseconds)
    pub rest_hold_ms: u32,

    // --- Threads ---
    /// Stack size for the oscillation and reconciler workers (KiB)
    pub worker_stack_kb: usize,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            pwm_frequency_hz: pins::SERVO_PWM_FREQ_HZ,

            kick_duty_percent: 6.0,
            kick_hold_ms: 500,

            rest_duty_percent: 2.0,
            rest_hold_ms: 210_000, // 3.5 min

            worker_stack_kb: 8,
        }
    }
}

impl ServoConfig {
    pub fn kick_hold(&self) -> Duration {
        Duration::from_millis(u64::from(self.kick_hold_ms))
    }

    pub fn rest_hold(&self) -> Duration {
        Duration::from_millis(u64::from(self.rest_hold_ms))
    }

    /// Range-check every field. Values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pwm_frequency_hz != pins::SERVO_PWM_FREQ_HZ {
            return Err(ConfigError::ValidationFailed(
                "pwm_frequency_hz must be 50",
            ));
        }
        if !(0.0..=100.0).contains(&self.kick_duty_percent) {
            return Err(ConfigError::ValidationFailed(
                "kick_duty_percent must be 0–100",
            ));
        }
        if !(0.0..=100.0).contains(&self.rest_duty_percent) {
            return Err(ConfigError::ValidationFailed(
                "rest_duty_percent must be 0–100",
            ));
        }
        if self.kick_duty_percent <= self.rest_duty_percent {
            return Err(ConfigError::ValidationFailed(
                "kick_duty_percent must be > rest_duty_percent",
            ));
        }
        if !(10..=10_000).contains(&self.kick_hold_ms) {
            return Err(ConfigError::ValidationFailed(
                "kick_hold_ms must be 10–10000",
            ));
        }
        if !(10..=3_600_000).contains(&self.rest_hold_ms) {
            return Err(ConfigError::ValidationFailed(
                "rest_hold_ms must be 10–3600000",
            ));
        }
        if !(4..=64).contains(&self.worker_stack_kb) {
            return Err(ConfigError::ValidationFailed(
                "worker_stack_kb must be 4–64",
            ));
        }
        Ok(())
    }
}
