//! Inbound commands to the toggle service.
//!
//! These represent requests from the outside world (serial console, a
//! future network front-end) that the
//! [`ToggleService`](super::service::ToggleService) interprets.

use core::str::FromStr;

use crate::error::Error;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Record a deactivated event (history bootstrap / reset to off).
    Init,

    /// Record the negation of the latest event.
    Switch,

    /// Report the full activation history.
    Status,
}

impl FromStr for AppCommand {
    type Err = Error;

    /// Case-insensitive; surrounding whitespace and a leading `/` are
    /// ignored so `"/switch-action"` and `"switch"` are equivalent.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let word = line.trim().trim_start_matches('/').to_ascii_lowercase();
        match word.as_str() {
            "init" => Ok(Self::Init),
            "switch" | "switch-action" | "toggle" => Ok(Self::Switch),
            "status" | "" => Ok(Self::Status),
            _ => Err(Error::UnknownCommand),
        }
    }
}
