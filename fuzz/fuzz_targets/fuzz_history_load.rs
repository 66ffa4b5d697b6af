//! Fuzz target: activation history restore
//!
//! Plants arbitrary bytes as the head index and the first few records,
//! then loads the history and verifies:
//! - No panics on corrupted or truncated records
//! - Restored ids are strictly increasing and never exceed the head
//! - An append after load continues from the head and is visible on reload
//!
//! cargo fuzz run fuzz_history_load

#![no_main]

use std::collections::HashMap;

use libfuzzer_sys::fuzz_target;
use servoswitch::activation::{ActivationLog, HISTORY_NAMESPACE};
use servoswitch::app::ports::{StorageError, StoragePort};

#[derive(Default)]
struct MemStore {
    data: HashMap<String, Vec<u8>>,
}

impl StoragePort for MemStore {
    fn read(&self, ns: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        match self.data.get(&format!("{ns}::{key}")) {
            Some(v) => {
                let n = v.len().min(buf.len());
                buf[..n].copy_from_slice(&v[..n]);
                Ok(n)
            }
            None => Err(StorageError::NotFound),
        }
    }

    fn write(&mut self, ns: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.data.insert(format!("{ns}::{key}"), data.to_vec());
        Ok(())
    }

    fn exists(&self, ns: &str, key: &str) -> bool {
        self.data.contains_key(&format!("{ns}::{key}"))
    }

    fn delete(&mut self, ns: &str, key: &str) -> Result<(), StorageError> {
        self.data.remove(&format!("{ns}::{key}"));
        Ok(())
    }
}

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let mut store = MemStore::default();
    // Keep the head small so load() stays fast.
    let head = u32::from(data[0] % 8);
    let _ = store.write(HISTORY_NAMESPACE, "head", &head.to_le_bytes());
    for (i, chunk) in data[1..].chunks(12).enumerate().take(8) {
        let _ = store.write(HISTORY_NAMESPACE, &format!("e{}", i + 1), chunk);
    }

    let mut log = ActivationLog::new(store);
    let Ok(restored) = log.load() else {
        return;
    };
    assert!(restored <= head as usize);
    for pair in log.events().windows(2) {
        assert!(pair[0].id < pair[1].id);
    }
    assert!(log.events().iter().all(|e| e.id >= 1 && e.id <= head));

    assert_eq!(log.head(), head);
    let appended = log.append(None, true).expect("in-memory store accepts writes");
    assert_eq!(appended.id, head + 1);

    let mut reloaded = ActivationLog::new(log.into_storage());
    reloaded.load().expect("head was just rewritten");
    assert_eq!(reloaded.latest(), Some(&appended));
});
