//! Mock hardware for integration tests.
//!
//! Records every PWM call so tests can assert on the full write history
//! without touching real LEDC registers. The log is shared through an
//! `Arc` because the oscillation worker writes from its own thread.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeZone, Utc};

use servoswitch::app::events::AppEvent;
use servoswitch::app::ports::{ClockPort, EventSink, PwmError, PwmPort, StorageError, StoragePort};
use servoswitch::config::ServoConfig;
use servoswitch::drivers::servo::ActuatorDriver;
use servoswitch::oscillation::OscillationController;

// ── PWM call record ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum PwmCall {
    Configure(u32),
    Duty(f32),
    Release,
}

/// Parks the writer inside one duty write until the test opens it.
#[derive(Default)]
struct DutyGate {
    armed: Option<f32>,
    entered: bool,
    open: bool,
}

#[derive(Clone, Default)]
pub struct PwmLog {
    calls: Arc<Mutex<Vec<PwmCall>>>,
    fail_duty: Arc<AtomicBool>,
    fail_next_configure: Arc<AtomicBool>,
    gate: Arc<(Mutex<DutyGate>, Condvar)>,
}

#[allow(dead_code)]
impl PwmLog {
    pub fn calls(&self) -> Vec<PwmCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn duties(&self) -> Vec<f32> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                PwmCall::Duty(d) => Some(d),
                _ => None,
            })
            .collect()
    }

    pub fn last_duty(&self) -> Option<f32> {
        self.duties().last().copied()
    }

    pub fn is_released(&self) -> bool {
        self.calls().last() == Some(&PwmCall::Release)
    }

    pub fn fail_duty_writes(&self, fail: bool) {
        self.fail_duty.store(fail, Ordering::SeqCst);
    }

    /// Reject the next `configure` with `ChannelUnavailable`.
    pub fn fail_next_configure(&self) {
        self.fail_next_configure.store(true, Ordering::SeqCst);
    }

    /// Block the next write of `percent` until [`open_gate`](Self::open_gate).
    pub fn gate_duty(&self, percent: f32) {
        let mut g = self.gate.0.lock().unwrap();
        *g = DutyGate {
            armed: Some(percent),
            ..DutyGate::default()
        };
    }

    /// Wait (up to 2 s) for a writer to park at the gate.
    pub fn wait_gate_entered(&self) -> bool {
        let (lock, cv) = &*self.gate;
        let g = lock.lock().unwrap();
        let (g, _) = cv
            .wait_timeout_while(g, Duration::from_secs(2), |g| !g.entered)
            .unwrap();
        g.entered
    }

    pub fn open_gate(&self) {
        let (lock, cv) = &*self.gate;
        lock.lock().unwrap().open = true;
        cv.notify_all();
    }

    fn pass_gate(&self, percent: f32) {
        let (lock, cv) = &*self.gate;
        let mut g = lock.lock().unwrap();
        if g.armed != Some(percent) {
            return;
        }
        g.armed = None;
        g.entered = true;
        cv.notify_all();
        let _g = cv.wait_while(g, |g| !g.open).unwrap();
    }

    /// Poll until at least `n` duties have been written (or 2 s elapse).
    pub fn wait_for_duties(&self, n: usize) -> Vec<f32> {
        wait_until(|| self.duties().len() >= n);
        self.duties()
    }
}

pub struct RecordingPwm {
    log: PwmLog,
}

impl RecordingPwm {
    pub fn new() -> (Self, PwmLog) {
        let log = PwmLog::default();
        (Self { log: log.clone() }, log)
    }
}

impl PwmPort for RecordingPwm {
    fn configure(&mut self, frequency_hz: u32) -> Result<(), PwmError> {
        if self.log.fail_next_configure.swap(false, Ordering::SeqCst) {
            return Err(PwmError::ChannelUnavailable);
        }
        self.log.calls.lock().unwrap().push(PwmCall::Configure(frequency_hz));
        Ok(())
    }

    fn set_duty_percent(&mut self, percent: f32) -> Result<(), PwmError> {
        if self.log.fail_duty.load(Ordering::SeqCst) {
            return Err(PwmError::WriteFailed);
        }
        self.log.pass_gate(percent);
        self.log.calls.lock().unwrap().push(PwmCall::Duty(percent));
        Ok(())
    }

    fn release(&mut self) -> Result<(), PwmError> {
        self.log.calls.lock().unwrap().push(PwmCall::Release);
        Ok(())
    }
}

// ── Event recorder ────────────────────────────────────────────

#[derive(Default)]
pub struct EventLog(Mutex<Vec<AppEvent>>);

#[allow(dead_code)]
impl EventLog {
    pub fn events(&self) -> Vec<AppEvent> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, event: &AppEvent) -> usize {
        self.events().iter().filter(|e| *e == event).count()
    }
}

impl EventSink for EventLog {
    fn emit(&self, event: &AppEvent) {
        self.0.lock().unwrap().push(event.clone());
    }
}

// ── Storage + clock ───────────────────────────────────────────

#[derive(Default)]
pub struct MemStorage {
    data: HashMap<String, Vec<u8>>,
    pub read_only: bool,
}

impl StoragePort for MemStorage {
    fn read(&self, ns: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let d = self
            .data
            .get(&format!("{ns}::{key}"))
            .ok_or(StorageError::NotFound)?;
        let len = d.len().min(buf.len());
        buf[..len].copy_from_slice(&d[..len]);
        Ok(len)
    }

    fn write(&mut self, ns: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if self.read_only {
            return Err(StorageError::IoError);
        }
        self.data.insert(format!("{ns}::{key}"), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, ns: &str, key: &str) -> Result<(), StorageError> {
        self.data.remove(&format!("{ns}::{key}"));
        Ok(())
    }

    fn exists(&self, ns: &str, key: &str) -> bool {
        self.data.contains_key(&format!("{ns}::{key}"))
    }
}

pub struct FixedClock;

impl ClockPort for FixedClock {
    fn now(&self) -> Option<DateTime<Utc>> {
        Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).single()
    }
}

// ── Rig ───────────────────────────────────────────────────────

pub struct Rig {
    pub controller: Arc<OscillationController<RecordingPwm>>,
    pub pwm: PwmLog,
    pub events: Arc<EventLog>,
}

/// Controller over an initialized recording channel with short holds.
pub fn rig(kick_ms: u32, rest_ms: u32) -> Rig {
    let cfg = ServoConfig {
        kick_hold_ms: kick_ms,
        rest_hold_ms: rest_ms,
        ..Default::default()
    };
    let (pwm, log) = RecordingPwm::new();
    let mut driver = ActuatorDriver::new(pwm, cfg.pwm_frequency_hz);
    driver.initialize().unwrap();
    let events = Arc::new(EventLog::default());
    let controller = Arc::new(OscillationController::new(
        Arc::new(Mutex::new(driver)),
        &cfg,
        events.clone(),
    ));
    Rig {
        controller,
        pwm: log,
        events,
    }
}

/// Poll `cond` every 2 ms for up to 2 s.
pub fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    cond()
}
