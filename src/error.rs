//! Unified error types for the ServoSwitch firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! boot path and the command surface uniform. All variants are `Copy` so
//! they can be logged from the oscillation worker and handed back across
//! threads without allocation.

use core::fmt;

use crate::app::ports::{ConfigError, PwmError, StorageError};

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// An actuator command failed.
    Actuator(ActuatorError),
    /// Reading or writing the activation history failed.
    Storage(StorageError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
    /// `switch` was requested before any activation event exists.
    EmptyHistory,
    /// A console line did not name a known command.
    UnknownCommand,
    /// A worker thread could not be spawned.
    Spawn(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::EmptyHistory => write!(f, "no activation recorded yet, run init first"),
            Self::UnknownCommand => write!(f, "unknown command"),
            Self::Spawn(name) => write!(f, "failed to spawn worker '{name}'"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// An operation other than `initialize` ran before the channel was configured.
    NotInitialized,
    /// `initialize` ran on a channel that is already configured.
    AlreadyInitialized,
    /// Requested duty cycle outside 0–100 % (or not a number).
    DutyOutOfRange,
    /// The underlying PWM peripheral reported a failure.
    Pwm(PwmError),
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "channel not initialized"),
            Self::AlreadyInitialized => write!(f, "channel already initialized"),
            Self::DutyOutOfRange => write!(f, "duty cycle out of range"),
            Self::Pwm(e) => write!(f, "PWM: {e}"),
        }
    }
}

impl From<PwmError> for ActuatorError {
    fn from(e: PwmError) -> Self {
        Self::Pwm(e)
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pwm_error_nests_through_actuator() {
        let e: Error = ActuatorError::from(PwmError::WriteFailed).into();
        assert_eq!(e, Error::Actuator(ActuatorError::Pwm(PwmError::WriteFailed)));
        assert_eq!(e.to_string(), "actuator: PWM: duty write failed");
    }

    #[test]
    fn empty_history_message_points_at_init() {
        assert!(Error::EmptyHistory.to_string().contains("init"));
    }
}
