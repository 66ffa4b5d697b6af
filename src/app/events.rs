//! Outbound application events.
//!
//! The core emits these through the [`EventSink`](super::ports::EventSink)
//! port. Adapters on the other side decide what to do with them: log to
//! serial, forward to a monitoring client, etc.

use crate::error::ActuatorError;
use crate::oscillation::Phase;

/// Structured events emitted by the core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The actuator channel was configured and is idling at 0 % duty.
    ChannelEngaged { frequency_hz: u32 },

    /// The actuator channel was disengaged and released.
    ChannelReleased,

    /// The oscillation worker was scheduled (Idle → Running).
    OscillationStarted,

    /// The oscillation worker halted and the channel is off (Running → Idle).
    OscillationStopped,

    /// A duty write inside the oscillation loop failed; the loop continues.
    DutyWriteFailed { phase: Phase, error: ActuatorError },

    /// A new activation event was committed to the history.
    ActivationRecorded { id: u32, is_activated: bool },

    /// The reconciler dropped a notification equal to the last one it saw.
    RedundantActivation { is_activated: bool },

    /// The controller could not reach the requested state. The next equal
    /// notification is applied again rather than dropped.
    ActivationNotApplied { is_activated: bool },
}
