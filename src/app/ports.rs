//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ core (driver · oscillator · reconciler)
//! ```
//!
//! Driven adapters (PWM peripheral, event sinks, storage, clock) implement
//! these traits. The core consumes them via generics, so it never touches
//! hardware directly and every piece runs on the host against mocks.
//!
//! ## Threading
//!
//! The oscillation worker and the reconciler worker run on their own
//! threads, so [`PwmPort`] must be `Send` and [`EventSink`] /
//! [`ActivationListener`] must be `Send + Sync`.

use chrono::{DateTime, Utc};

use crate::config::ServoConfig;

// ───────────────────────────────────────────────────────────────
// PWM port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// A single pulse-width output channel.
pub trait PwmPort: Send {
    /// Configure the channel for PWM output at `frequency_hz` and begin
    /// generating at 0 % duty.
    fn configure(&mut self, frequency_hz: u32) -> Result<(), PwmError>;

    /// Set the duty cycle, in percent (0.0–100.0, already range-checked).
    fn set_duty_percent(&mut self, percent: f32) -> Result<(), PwmError>;

    /// Stop the generator and release the pin.
    fn release(&mut self) -> Result<(), PwmError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The core emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Called from worker threads.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &super::events::AppEvent);
}

impl<T: EventSink + ?Sized> EventSink for std::sync::Arc<T> {
    fn emit(&self, event: &super::events::AppEvent) {
        (**self).emit(event);
    }
}

// ───────────────────────────────────────────────────────────────
// Activation listener (persistence layer → reconciler)
// ───────────────────────────────────────────────────────────────

/// State-changed hook invoked after a new activation event is committed.
///
/// Implementations must return promptly and cannot fail.
pub trait ActivationListener: Send + Sync {
    fn on_activation_changed(&self, is_activated: bool);
}

impl<T: ActivationListener + ?Sized> ActivationListener for std::sync::Arc<T> {
    fn on_activation_changed(&self, is_activated: bool) {
        (**self).on_activation_changed(is_activated);
    }
}

// ───────────────────────────────────────────────────────────────
// Clock port (driven adapter: wall clock for event timestamps)
// ───────────────────────────────────────────────────────────────

pub trait ClockPort {
    /// Current wall-clock time, or `None` when the clock is not synced.
    fn now(&self) -> Option<DateTime<Utc>>;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the servo configuration.
///
/// Implementations MUST validate before persisting; out-of-range values
/// are rejected with [`ConfigError::ValidationFailed`], never clamped.
pub trait ConfigPort {
    /// Returns [`ServoConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<ServoConfig, ConfigError>;

    fn save(&self, config: &ServoConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage.
///
/// Write operations MUST be atomic: no partial writes on power loss.
/// The ESP-IDF NVS API guarantees this per commit.
pub trait StoragePort {
    /// Read a value. Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key. Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`PwmPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PwmError {
    /// Timer or channel could not be configured (pin busy, no free timer).
    ChannelUnavailable,
    /// A duty register update was rejected.
    WriteFailed,
    /// The generator could not be stopped or the pin released.
    ReleaseFailed,
}

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed integrity / deserialization check.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// A stored record could not be decoded.
    Corrupted,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for PwmError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ChannelUnavailable => write!(f, "channel unavailable"),
            Self::WriteFailed => write!(f, "duty write failed"),
            Self::ReleaseFailed => write!(f, "channel release failed"),
        }
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::Corrupted => write!(f, "record corrupted"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
