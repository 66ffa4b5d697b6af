//! ESP32 time adapter.
//!
//! Provides wall-clock timestamps for activation events and monotonic
//! uptime for diagnostics.
//!
//! - **`target_os = "espidf"`**: `gettimeofday()` for wall time (rejected
//!   until SNTP has set a plausible date) and `esp_timer_get_time()` for
//!   uptime.
//! - **`not(target_os = "espidf")`**: `std::time::SystemTime` and
//!   `std::time::Instant` for host-side testing and simulation.

use chrono::{DateTime, Utc};

use crate::app::ports::ClockPort;

/// Wall-clock readings before 2020-01-01 mean the RTC was never set.
const EPOCH_2020: i64 = 1_577_836_800;

/// Time adapter for the ESP32 platform.
pub struct Esp32TimeAdapter {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for Esp32TimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32TimeAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Seconds since boot (monotonic).
    #[cfg(target_os = "espidf")]
    pub fn uptime_secs(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1_000_000
    }

    /// Seconds since boot (monotonic).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_secs(&self) -> u64 {
        self.start.elapsed().as_secs()
    }

    #[cfg(target_os = "espidf")]
    fn unix_time(&self) -> Option<(i64, u32)> {
        let mut tv = esp_idf_svc::sys::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, core::ptr::null_mut()) } != 0 {
            return None;
        }
        Some((i64::from(tv.tv_sec), (tv.tv_usec as u32) * 1_000))
    }

    #[cfg(not(target_os = "espidf"))]
    fn unix_time(&self) -> Option<(i64, u32)> {
        let d = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .ok()?;
        Some((i64::try_from(d.as_secs()).ok()?, d.subsec_nanos()))
    }
}

/// `None` for unsynced (pre-2020) readings.
fn plausible(secs: i64, nanos: u32) -> Option<DateTime<Utc>> {
    if secs < EPOCH_2020 {
        return None;
    }
    DateTime::from_timestamp(secs, nanos)
}

impl ClockPort for Esp32TimeAdapter {
    fn now(&self) -> Option<DateTime<Utc>> {
        let (secs, nanos) = self.unix_time()?;
        plausible(secs, nanos)
    }
}
