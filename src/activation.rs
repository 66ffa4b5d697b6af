//! Append-only activation history.
//!
//! Each [`ActivationEvent`] is stored as its own postcard record under the
//! `"history"` namespace, keyed `e{id}`. A head record holds the highest
//! committed id; records above it are ignored on load, so a torn append
//! (record written, head not) is invisible after reboot.
//!
//! ```text
//!   history::head = 3
//!   history::e1   = { id: 1, start_time: None,       is_activated: false }
//!   history::e2   = { id: 2, start_time: Some(..),   is_activated: true  }
//!   history::e3   = { id: 3, start_time: Some(..),   is_activated: false }
//! ```

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::{StorageError, StoragePort};

pub const HISTORY_NAMESPACE: &str = "history";
const HEAD_KEY: &str = "head";
/// A record is a u32, a bool and an optional RFC 3339 timestamp.
const MAX_RECORD_SIZE: usize = 64;

/// One transition of the desired servo state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationEvent {
    pub id: u32,
    pub start_time: Option<DateTime<Utc>>,
    pub is_activated: bool,
}

/// Snapshot of the history as reported by the `status` command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySummary {
    pub total_actions: usize,
    pub last_action: Option<ActivationEvent>,
    pub actions: Vec<ActivationEvent>,
    pub server_time: Option<DateTime<Utc>>,
}

pub struct ActivationLog<S: StoragePort> {
    storage: S,
    events: Vec<ActivationEvent>,
    /// Highest committed id, whether or not its record loaded.
    head: u32,
}

impl<S: StoragePort> ActivationLog<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            events: Vec::new(),
            head: 0,
        }
    }

    /// Replace the in-memory history with what storage holds.
    ///
    /// Missing or undecodable records below the head are skipped with a
    /// warning; the rest of the history is still usable.
    pub fn load(&mut self) -> Result<usize, StorageError> {
        self.events.clear();
        self.head = 0;

        let head = match self.read_head() {
            Ok(head) => head,
            Err(StorageError::NotFound) => {
                info!("Activation history: empty");
                return Ok(0);
            }
            Err(e) => return Err(e),
        };
        self.head = head;

        let mut buf = [0u8; MAX_RECORD_SIZE];
        for id in 1..=head {
            let len = match self.storage.read(HISTORY_NAMESPACE, &record_key(id), &mut buf) {
                Ok(len) => len,
                Err(e) => {
                    warn!("Activation record {} unreadable: {}", id, e);
                    continue;
                }
            };
            match postcard::from_bytes::<ActivationEvent>(&buf[..len]) {
                Ok(event) if event.id == id => self.events.push(event),
                Ok(event) => warn!("Activation record {} carries id {}, skipped", id, event.id),
                Err(_) => warn!("Activation record {} corrupted, skipped", id),
            }
        }

        info!(
            "Activation history: {} event(s) restored, head={}",
            self.events.len(),
            head
        );
        Ok(self.events.len())
    }

    /// Persist a new event, then append it in memory.
    ///
    /// Ids continue from the committed head, so a record lost to
    /// corruption is never overwritten. On error nothing is appended and
    /// the next append reuses the id.
    pub fn append(
        &mut self,
        start_time: Option<DateTime<Utc>>,
        is_activated: bool,
    ) -> Result<ActivationEvent, StorageError> {
        let id = self.next_id();
        let event = ActivationEvent {
            id,
            start_time,
            is_activated,
        };

        let bytes = postcard::to_allocvec(&event).map_err(|_| StorageError::Corrupted)?;
        self.storage
            .write(HISTORY_NAMESPACE, &record_key(id), &bytes)?;
        self.storage
            .write(HISTORY_NAMESPACE, HEAD_KEY, &id.to_le_bytes())?;
        self.head = id;

        debug!("Activation record {} committed ({} bytes)", id, bytes.len());
        self.events.push(event.clone());
        Ok(event)
    }

    pub fn latest(&self) -> Option<&ActivationEvent> {
        self.events.last()
    }

    pub fn events(&self) -> &[ActivationEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn summary(&self, server_time: Option<DateTime<Utc>>) -> HistorySummary {
        HistorySummary {
            total_actions: self.events.len(),
            last_action: self.latest().cloned(),
            actions: self.events.clone(),
            server_time,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Highest committed id, `0` for an empty history.
    pub fn head(&self) -> u32 {
        self.head
    }

    fn next_id(&self) -> u32 {
        self.head + 1
    }

    fn read_head(&self) -> Result<u32, StorageError> {
        let mut buf = [0u8; 4];
        match self.storage.read(HISTORY_NAMESPACE, HEAD_KEY, &mut buf)? {
            4 => Ok(u32::from_le_bytes(buf)),
            _ => Err(StorageError::Corrupted),
        }
    }
}

fn record_key(id: u32) -> String {
    format!("e{}", id)
}
