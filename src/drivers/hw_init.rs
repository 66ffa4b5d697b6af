//! LEDC peripheral helpers for the servo channel.
//!
//! Configures the LEDC timer/channel pair using raw ESP-IDF sys calls.
//! The [`LedcServoChannel`](crate::adapters::hardware::LedcServoChannel)
//! adapter is the only caller. Host builds get no-op stubs so the
//! adapter's bookkeeping runs unchanged in simulation.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors while configuring or driving the LEDC servo channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    LedcTimerFailed(i32),
    LedcChannelFailed(i32),
    LedcDutyFailed(i32),
    LedcStopFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::LedcTimerFailed(rc) => write!(f, "LEDC timer config failed (rc={})", rc),
            Self::LedcChannelFailed(rc) => write!(f, "LEDC channel config failed (rc={})", rc),
            Self::LedcDutyFailed(rc) => write!(f, "LEDC duty update failed (rc={})", rc),
            Self::LedcStopFailed(rc) => write!(f, "LEDC stop failed (rc={})", rc),
        }
    }
}

#[cfg(target_os = "espidf")]
const SERVO_SPEED_MODE: ledc_mode_t = ledc_mode_t_LEDC_LOW_SPEED_MODE;
#[cfg(target_os = "espidf")]
const SERVO_TIMER: ledc_timer_t = ledc_timer_t_LEDC_TIMER_0;
#[cfg(target_os = "espidf")]
const SERVO_CHANNEL: ledc_channel_t = ledc_channel_t_LEDC_CHANNEL_0;

// ── Configure ────────────────────────────────────────────────

/// Configure timer 0 at `freq_hz` with 14-bit resolution and bind
/// channel 0 to the servo GPIO at 0 % duty.
#[cfg(target_os = "espidf")]
pub fn ledc_servo_init(freq_hz: u32) -> Result<(), HwInitError> {
    let timer = ledc_timer_config_t {
        speed_mode: SERVO_SPEED_MODE,
        timer_num: SERVO_TIMER,
        duty_resolution: ledc_timer_bit_t_LEDC_TIMER_14_BIT,
        freq_hz,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    // SAFETY: plain register configuration; the adapter serialises all
    // LEDC access behind the driver's mutex.
    let ret = unsafe { ledc_timer_config(&timer) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::LedcTimerFailed(ret));
    }

    let channel = ledc_channel_config_t {
        speed_mode: SERVO_SPEED_MODE,
        channel: SERVO_CHANNEL,
        timer_sel: SERVO_TIMER,
        gpio_num: pins::SERVO_PWM_GPIO,
        duty: 0,
        hpoint: 0,
        ..Default::default()
    };
    let ret = unsafe { ledc_channel_config(&channel) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::LedcChannelFailed(ret));
    }

    info!(
        "hw_init: LEDC servo CH0 on GPIO{} @ {} Hz",
        pins::SERVO_PWM_GPIO,
        freq_hz
    );
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_servo_init(freq_hz: u32) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): servo channel @ {} Hz", freq_hz);
    Ok(())
}

// ── Duty ─────────────────────────────────────────────────────

/// Write a raw duty register value (0..=`PWM_MAX_DUTY`) and latch it.
#[cfg(target_os = "espidf")]
pub fn ledc_servo_set(duty: u32) -> Result<(), HwInitError> {
    // SAFETY: channel configured by ledc_servo_init(); access serialised
    // by the driver mutex.
    let ret = unsafe { ledc_set_duty(SERVO_SPEED_MODE, SERVO_CHANNEL, duty) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::LedcDutyFailed(ret));
    }
    let ret = unsafe { ledc_update_duty(SERVO_SPEED_MODE, SERVO_CHANNEL) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::LedcDutyFailed(ret));
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_servo_set(_duty: u32) -> Result<(), HwInitError> {
    Ok(())
}

// ── Release ──────────────────────────────────────────────────

/// Stop the generator with the line held low and return the pin to its
/// reset state so it can be reconfigured.
#[cfg(target_os = "espidf")]
pub fn ledc_servo_release() -> Result<(), HwInitError> {
    // SAFETY: see ledc_servo_set().
    let ret = unsafe { ledc_stop(SERVO_SPEED_MODE, SERVO_CHANNEL, 0) };
    let reset = unsafe { gpio_reset_pin(pins::SERVO_PWM_GPIO) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::LedcStopFailed(ret));
    }
    if reset != ESP_OK as i32 {
        return Err(HwInitError::LedcStopFailed(reset));
    }
    info!("hw_init: LEDC servo CH0 stopped, GPIO{} released", pins::SERVO_PWM_GPIO);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_servo_release() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): servo channel released");
    Ok(())
}
