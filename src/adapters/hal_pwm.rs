//! [`PwmPort`] over any `embedded-hal` 1.0 PWM channel.
//!
//! Lets the actuator driver run against HAL-provided channels (e.g. an
//! `esp-idf-hal` `LedcDriver`) or a board-support crate on another MCU.
//! Frequency is fixed by whoever built the channel; `configure` only
//! checks that it matches and idles the output.

use embedded_hal::pwm::SetDutyCycle;
use log::warn;

use crate::app::ports::{PwmError, PwmPort};

pub struct HalPwm<P: SetDutyCycle> {
    channel: P,
    frequency_hz: u32,
    configured: bool,
}

impl<P: SetDutyCycle> HalPwm<P> {
    /// `frequency_hz` is the carrier the channel was built with.
    pub fn new(channel: P, frequency_hz: u32) -> Self {
        Self {
            channel,
            frequency_hz,
            configured: false,
        }
    }

    pub fn into_inner(self) -> P {
        self.channel
    }

    fn write(&mut self, percent: f32) -> Result<(), PwmError> {
        let max = self.channel.max_duty_cycle();
        let duty = (percent.clamp(0.0, 100.0) / 100.0 * f32::from(max)).round() as u16;
        self.channel.set_duty_cycle(duty).map_err(|e| {
            warn!("HAL PWM write failed: {:?}", e);
            PwmError::WriteFailed
        })
    }
}

impl<P: SetDutyCycle + Send> PwmPort for HalPwm<P> {
    fn configure(&mut self, frequency_hz: u32) -> Result<(), PwmError> {
        if frequency_hz != self.frequency_hz {
            warn!(
                "HAL PWM built for {} Hz, {} Hz requested",
                self.frequency_hz, frequency_hz
            );
            return Err(PwmError::ChannelUnavailable);
        }
        self.write(0.0)?;
        self.configured = true;
        Ok(())
    }

    fn set_duty_percent(&mut self, percent: f32) -> Result<(), PwmError> {
        if !self.configured {
            return Err(PwmError::ChannelUnavailable);
        }
        self.write(percent)
    }

    fn release(&mut self) -> Result<(), PwmError> {
        if !self.configured {
            return Ok(());
        }
        self.configured = false;
        self.channel
            .set_duty_cycle_fully_off()
            .map_err(|_| PwmError::ReleaseFailed)
    }
}
