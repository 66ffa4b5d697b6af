//! LEDC servo channel: the production [`PwmPort`].
//!
//! Maps percent duty onto the 14-bit LEDC duty register via the
//! `hw_init` helpers. This is the only module in the system that touches
//! the servo pin.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the real LEDC timer/channel.
//! On host/test: `hw_init` is a no-op and only the bookkeeping here runs,
//! so the register value that would have been written is still observable.

use log::warn;

use crate::app::ports::{PwmError, PwmPort};
use crate::drivers::hw_init;
use crate::pins;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Free,
    Configured { frequency_hz: u32, duty_ticks: u32 },
}

pub struct LedcServoChannel {
    state: ChannelState,
}

impl Default for LedcServoChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl LedcServoChannel {
    pub fn new() -> Self {
        Self {
            state: ChannelState::Free,
        }
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Register value last written, `None` while the channel is free.
    pub fn duty_ticks(&self) -> Option<u32> {
        match self.state {
            ChannelState::Configured { duty_ticks, .. } => Some(duty_ticks),
            ChannelState::Free => None,
        }
    }
}

/// Percent (0–100) to LEDC ticks at [`pins::PWM_RESOLUTION_BITS`].
pub fn percent_to_ticks(percent: f32) -> u32 {
    let clamped = percent.clamp(0.0, 100.0);
    (clamped / 100.0 * pins::PWM_MAX_DUTY as f32).round() as u32
}

impl PwmPort for LedcServoChannel {
    fn configure(&mut self, frequency_hz: u32) -> Result<(), PwmError> {
        hw_init::ledc_servo_init(frequency_hz).map_err(|e| {
            warn!("LEDC servo configure failed: {}", e);
            PwmError::ChannelUnavailable
        })?;
        self.state = ChannelState::Configured {
            frequency_hz,
            duty_ticks: 0,
        };
        Ok(())
    }

    fn set_duty_percent(&mut self, percent: f32) -> Result<(), PwmError> {
        let ChannelState::Configured { frequency_hz, .. } = self.state else {
            return Err(PwmError::ChannelUnavailable);
        };
        let ticks = percent_to_ticks(percent);
        hw_init::ledc_servo_set(ticks).map_err(|e| {
            warn!("LEDC servo duty write failed: {}", e);
            PwmError::WriteFailed
        })?;
        self.state = ChannelState::Configured {
            frequency_hz,
            duty_ticks: ticks,
        };
        Ok(())
    }

    fn release(&mut self) -> Result<(), PwmError> {
        if self.state == ChannelState::Free {
            return Ok(());
        }
        self.state = ChannelState::Free;
        hw_init::ledc_servo_release().map_err(|e| {
            warn!("LEDC servo release failed: {}", e);
            PwmError::ReleaseFailed
        })
    }
}
