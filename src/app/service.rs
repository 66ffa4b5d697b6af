//! Application service: the toggle's command surface.
//!
//! [`ToggleService`] owns the activation history and the commit path. It
//! interprets [`AppCommand`]s, persists the resulting event, and only then
//! tells the [`ActivationListener`] (the reconciler) what the desired
//! state now is.
//!
//! ```text
//!  AppCommand ──▶ ┌──────────────────────────┐ ──▶ ActivationListener
//!                 │      ToggleService        │
//!   ClockPort ──▶ │  history · commit path    │ ──▶ EventSink
//!                 └──────────────────────────┘
//!                              │
//!                         StoragePort
//! ```

use std::sync::Arc;

use log::{info, warn};
use serde::Serialize;

use crate::activation::{ActivationEvent, ActivationLog, HistorySummary};
use crate::error::{Error, Result};

use super::commands::AppCommand;
use super::events::AppEvent;
use super::ports::{ActivationListener, ClockPort, EventSink, StoragePort};

// ───────────────────────────────────────────────────────────────
// Replies
// ───────────────────────────────────────────────────────────────

/// Outcome of a command, rendered as JSON on the console.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CommandReply {
    Recorded {
        message: &'static str,
        action: ActivationEvent,
    },
    Status(HistorySummary),
}

impl CommandReply {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            warn!("Reply serialization failed: {}", e);
            String::from(r#"{"error":"reply serialization failed"}"#)
        })
    }
}

/// JSON error line for a failed command.
pub fn error_json(err: &Error) -> String {
    serde_json::json!({ "error": err.to_string() }).to_string()
}

// ───────────────────────────────────────────────────────────────
// ToggleService
// ───────────────────────────────────────────────────────────────

pub struct ToggleService<S, C, L>
where
    S: StoragePort,
    C: ClockPort,
    L: ActivationListener,
{
    history: ActivationLog<S>,
    clock: C,
    listener: L,
    sink: Arc<dyn EventSink>,
}

impl<S, C, L> ToggleService<S, C, L>
where
    S: StoragePort,
    C: ClockPort,
    L: ActivationListener,
{
    pub fn new(storage: S, clock: C, listener: L, sink: Arc<dyn EventSink>) -> Self {
        Self {
            history: ActivationLog::new(storage),
            clock,
            listener,
            sink,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Restore the history and bring the listener in line with it.
    ///
    /// An empty history gets the deactivated sentinel (which notifies on
    /// commit); otherwise the latest persisted value is re-announced so
    /// hardware matches what was stored before the reboot.
    pub fn boot(&mut self) -> Result<()> {
        self.history.load()?;

        match self.history.latest().map(|e| e.is_activated) {
            None => {
                info!("No activation history, recording initial state");
                self.commit(false)?;
            }
            Some(is_activated) => {
                info!("Reconciling to persisted state: activated={}", is_activated);
                self.listener.on_activation_changed(is_activated);
            }
        }
        Ok(())
    }

    // ── Commands ──────────────────────────────────────────────

    pub fn handle_command(&mut self, cmd: AppCommand) -> Result<CommandReply> {
        match cmd {
            AppCommand::Init => {
                let action = self.commit(false)?;
                Ok(CommandReply::Recorded {
                    message: "Action initialized",
                    action,
                })
            }
            AppCommand::Switch => {
                let latest = self.history.latest().ok_or(Error::EmptyHistory)?;
                let action = self.commit(!latest.is_activated)?;
                Ok(CommandReply::Recorded {
                    message: "Action switched",
                    action,
                })
            }
            AppCommand::Status => Ok(CommandReply::Status(self.summary())),
        }
    }

    pub fn summary(&self) -> HistorySummary {
        self.history.summary(self.clock.now())
    }

    pub fn history(&self) -> &ActivationLog<S> {
        &self.history
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    /// Tear down the service, handing back its storage backend.
    pub fn into_storage(self) -> S {
        self.history.into_storage()
    }

    // ── Internals ─────────────────────────────────────────────

    /// Persist, then notify. A failed persist notifies nobody.
    fn commit(&mut self, is_activated: bool) -> Result<ActivationEvent> {
        let event = self.history.append(self.clock.now(), is_activated)?;
        info!("Activation {} recorded: activated={}", event.id, is_activated);
        self.sink.emit(&AppEvent::ActivationRecorded {
            id: event.id,
            is_activated,
        });
        self.listener.on_activation_changed(is_activated);
        Ok(event)
    }
}
