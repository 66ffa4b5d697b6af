//! Servo actuator driver.
//!
//! Owns the single PWM output channel that drives the servo signal line
//! and enforces its lifecycle:
//!
//! ```text
//!   Uninitialized ──initialize()──▶ Active ──shutdown()──▶ Released
//!                                     ▲                        │
//!                                     └──────initialize()──────┘
//! ```
//!
//! The driver is a dumb actuator: it range-checks duty values and tracks
//! what was last written, nothing more. Timing lives in the
//! [`OscillationController`](crate::oscillation::OscillationController).

use log::{debug, info, warn};

use crate::app::ports::PwmPort;
use crate::error::ActuatorError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DriverState {
    /// `initialize()` has never run.
    Uninitialized,
    /// Channel configured; carries the last duty successfully written.
    Active { duty: f32 },
    /// `shutdown()` ran; the pin is released.
    Released,
}

pub struct ActuatorDriver<P: PwmPort> {
    port: P,
    frequency_hz: u32,
    state: DriverState,
}

impl<P: PwmPort> ActuatorDriver<P> {
    pub fn new(port: P, frequency_hz: u32) -> Self {
        Self {
            port,
            frequency_hz,
            state: DriverState::Uninitialized,
        }
    }

    /// Configure the channel at the fixed carrier frequency, idling at 0 %.
    ///
    /// A configure failure here means the hardware is unavailable; callers
    /// at boot treat it as fatal.
    pub fn initialize(&mut self) -> Result<(), ActuatorError> {
        if self.is_active() {
            return Err(ActuatorError::AlreadyInitialized);
        }
        self.port.configure(self.frequency_hz)?;
        self.port.set_duty_percent(0.0)?;
        self.state = DriverState::Active { duty: 0.0 };
        info!("Servo channel engaged @ {} Hz", self.frequency_hz);
        Ok(())
    }

    /// Initialize unless the channel is already active.
    pub fn engage(&mut self) -> Result<(), ActuatorError> {
        if self.is_active() {
            return Ok(());
        }
        self.initialize()
    }

    pub fn set_duty_cycle(&mut self, percent: f32) -> Result<(), ActuatorError> {
        if !self.is_active() {
            return Err(ActuatorError::NotInitialized);
        }
        if !(0.0..=100.0).contains(&percent) {
            return Err(ActuatorError::DutyOutOfRange);
        }
        self.port.set_duty_percent(percent)?;
        self.state = DriverState::Active { duty: percent };
        debug!("Servo duty -> {:.2}%", percent);
        Ok(())
    }

    /// Drive to 0 %, stop the generator and release the pin.
    ///
    /// No-op unless the channel is active. Both steps are always attempted;
    /// the first failure is returned after the channel is marked released.
    pub fn shutdown(&mut self) -> Result<(), ActuatorError> {
        if !self.is_active() {
            return Ok(());
        }

        let zeroed = self.port.set_duty_percent(0.0);
        if let Err(e) = zeroed {
            warn!("Servo shutdown: zero duty failed: {}", e);
        }
        let released = self.port.release();
        if let Err(e) = released {
            warn!("Servo shutdown: release failed: {}", e);
        }

        self.state = DriverState::Released;
        info!("Servo channel released");
        zeroed.and(released).map_err(ActuatorError::from)
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, DriverState::Active { .. })
    }

    /// Last duty written, or `None` when the channel is not active.
    pub fn current_duty(&self) -> Option<f32> {
        match self.state {
            DriverState::Active { duty } => Some(duty),
            _ => None,
        }
    }

    pub fn frequency_hz(&self) -> u32 {
        self.frequency_hz
    }

    pub fn port(&self) -> &P {
        &self.port
    }
}
