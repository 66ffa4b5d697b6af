//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&self, event: &AppEvent) {
        match event {
            AppEvent::ChannelEngaged { frequency_hz } => {
                info!("SERVO | engaged freq={}Hz", frequency_hz);
            }
            AppEvent::ChannelReleased => {
                info!("SERVO | released");
            }
            AppEvent::OscillationStarted => {
                info!("OSC | state=Running");
            }
            AppEvent::OscillationStopped => {
                info!("OSC | state=Idle");
            }
            AppEvent::DutyWriteFailed { phase, error } => {
                warn!("OSC | write_failed phase={:?} err={}", phase, error);
            }
            AppEvent::ActivationRecorded { id, is_activated } => {
                info!("HIST | id={} activated={}", id, is_activated);
            }
            AppEvent::RedundantActivation { is_activated } => {
                info!("HIST | redundant activated={}", is_activated);
            }
            AppEvent::ActivationNotApplied { is_activated } => {
                warn!("OSC | not_applied activated={}", is_activated);
            }
        }
    }
}
