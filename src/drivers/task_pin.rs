//! Core-pinned worker thread spawning.
//!
//! On ESP-IDF, `std::thread` is backed by pthreads over FreeRTOS tasks;
//! `esp_pthread_set_cfg()` sets the core affinity, priority and stack of
//! the *next* `pthread_create()` from the calling thread. The config→spawn
//! pair must therefore not interleave with other thread creation on the
//! same thread. On the host only the name and stack size apply.

use std::thread::JoinHandle;

use crate::error::Error;

/// CPU core identifiers for the ESP32 Xtensa dual-core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Core {
    /// Core 0 (PRO_CPU): protocol stacks, console.
    Pro = 0,
    /// Core 1 (APP_CPU): motion timing.
    App = 1,
}

/// Worker spawn parameters.
#[derive(Debug, Clone, Copy)]
pub struct TaskSpec {
    pub core: Core,
    pub priority: u8,
    pub stack_kb: usize,
    /// Must be null-terminated (e.g. `"servo-osc\0"`).
    pub name: &'static str,
}

impl TaskSpec {
    fn display_name(&self) -> &'static str {
        self.name.trim_end_matches('\0')
    }
}

/// Spawn `f` on a thread configured by `spec`.
#[cfg(target_os = "espidf")]
pub fn spawn_on_core(
    spec: TaskSpec,
    f: impl FnOnce() + Send + 'static,
) -> Result<JoinHandle<()>, Error> {
    // SAFETY: the config only affects the next pthread_create() issued by
    // this thread, which is the spawn immediately below.
    unsafe {
        let mut cfg = esp_idf_svc::sys::esp_create_default_pthread_config();
        cfg.pin_to_core = spec.core as i32;
        cfg.prio = i32::from(spec.priority);
        cfg.stack_size = (spec.stack_kb * 1024) as i32;
        cfg.thread_name = spec.name.as_ptr() as *const _;
        let ret = esp_idf_svc::sys::esp_pthread_set_cfg(&cfg);
        if ret != esp_idf_svc::sys::ESP_OK as i32 {
            log::error!("esp_pthread_set_cfg failed for '{}': {}", spec.display_name(), ret);
            return Err(Error::Spawn(spec.display_name()));
        }
    }

    log::info!(
        "Spawning '{}' on {:?} (pri={}, stack={}KB)",
        spec.display_name(),
        spec.core,
        spec.priority,
        spec.stack_kb
    );

    std::thread::Builder::new()
        .name(spec.display_name().into())
        .spawn(f)
        .map_err(|_| Error::Spawn(spec.display_name()))
}

/// Host fallback; ignores core affinity and priority.
#[cfg(not(target_os = "espidf"))]
pub fn spawn_on_core(
    spec: TaskSpec,
    f: impl FnOnce() + Send + 'static,
) -> Result<JoinHandle<()>, Error> {
    log::debug!(
        "Spawning '{}' (sim, no core pinning, stack={}KB)",
        spec.display_name(),
        spec.stack_kb
    );

    std::thread::Builder::new()
        .name(spec.display_name().into())
        .stack_size(spec.stack_kb * 1024)
        .spawn(f)
        .map_err(|_| Error::Spawn(spec.display_name()))
}
