//! Oscillation controller: continuous kick/rest servo motion.
//!
//! ```text
//!            start()                     stop()
//!   ┌──────┐ ──────▶ ┌─────────┐ ──────────────────▶ ┌──────┐
//!   │ Idle │         │ Running │  signal · join ·    │ Idle │
//!   └──────┘ ◀────── └─────────┘  duty 0 · release   └──────┘
//! ```
//!
//! While Running, a dedicated worker thread repeats:
//!
//! | Step | Duty  | Hold   |
//! |------|-------|--------|
//! | Kick | 6.0 % | 0.5 s  |
//! | Rest | 2.0 % | 210 s  |
//!
//! The kick overcomes the servo's deadband; the rest duty holds position
//! at low stress for most of the cycle. Each hold races an async timer
//! against the stop signal, so `stop()` returns within one reactor wake
//! rather than after the remainder of a 210 s hold.
//!
//! A single transition lock serialises `start()` and `stop()`; it is held
//! across the worker join so at most one transition is ever in flight.

use core::time::Duration;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use futures_lite::future;
use log::{debug, error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, PwmPort};
use crate::config::ServoConfig;
use crate::drivers::servo::ActuatorDriver;
use crate::drivers::task_pin::{self, Core, TaskSpec};

/// The actuator driver, shared between the controller and its worker.
pub type SharedDriver<P> = Arc<Mutex<ActuatorDriver<P>>>;

type StopSignal = Signal<CriticalSectionRawMutex, ()>;

/// Recover the guard from a poisoned lock; the driver's state stays
/// meaningful even if a holder panicked mid-write.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OscillationState {
    Idle,
    Running,
}

/// Step of the oscillation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Kick,
    Rest,
}

/// Start/stop surface consumed by the
/// [`ToggleReconciler`](crate::reconciler::ToggleReconciler).
pub trait MotionControl: Send + Sync {
    /// Idle → Running. No-op when already Running. Returns whether motion
    /// is running afterwards; `false` means the start was aborted.
    fn start(&self) -> bool;
    /// Running → Idle, returning only once motion has halted. No-op when Idle.
    fn stop(&self);
    /// Stop and release the channel even when Idle (process termination).
    fn shutdown(&self);
}

// ── Profile ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Profile {
    pub kick_duty: f32,
    pub kick_hold: Duration,
    pub rest_duty: f32,
    pub rest_hold: Duration,
}

impl From<&ServoConfig> for Profile {
    fn from(cfg: &ServoConfig) -> Self {
        Self {
            kick_duty: cfg.kick_duty_percent,
            kick_hold: cfg.kick_hold(),
            rest_duty: cfg.rest_duty_percent,
            rest_hold: cfg.rest_hold(),
        }
    }
}

impl Profile {
    fn steps(&self) -> [(Phase, f32, Duration); 2] {
        [
            (Phase::Kick, self.kick_duty, self.kick_hold),
            (Phase::Rest, self.rest_duty, self.rest_hold),
        ]
    }
}

// ── Worker ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HoldOutcome {
    Elapsed,
    Cancelled,
}

fn hold_or_cancel(stop: &StopSignal, hold: Duration) -> HoldOutcome {
    future::block_on(future::or(
        async {
            stop.wait().await;
            HoldOutcome::Cancelled
        },
        async {
            async_io_mini::Timer::after(hold).await;
            HoldOutcome::Elapsed
        },
    ))
}

fn run_sequence<P: PwmPort>(
    driver: &SharedDriver<P>,
    profile: Profile,
    stop: &StopSignal,
    sink: &dyn EventSink,
) {
    let mut cycles: u64 = 0;
    loop {
        for (phase, duty, hold) in profile.steps() {
            if stop.signaled() {
                debug!("Oscillation worker: stop seen before {:?} write", phase);
                return;
            }

            // Guard is dropped before the hold so stop() can take the lock.
            let written = lock(driver).set_duty_cycle(duty);
            if let Err(e) = written {
                warn!("Oscillation {:?} write ({:.1}%) failed: {}", phase, duty, e);
                sink.emit(&AppEvent::DutyWriteFailed { phase, error: e });
            }

            if hold_or_cancel(stop, hold) == HoldOutcome::Cancelled {
                debug!("Oscillation worker: cancelled during {:?} hold", phase);
                return;
            }
        }
        cycles += 1;
        debug!("Oscillation cycle {} complete", cycles);
    }
}

// ── Controller ────────────────────────────────────────────────

struct ActiveRun {
    stop: Arc<StopSignal>,
    worker: JoinHandle<()>,
}

pub struct OscillationController<P: PwmPort + 'static> {
    driver: SharedDriver<P>,
    sink: Arc<dyn EventSink>,
    profile: Profile,
    task: TaskSpec,
    run: Mutex<Option<ActiveRun>>,
}

impl<P: PwmPort + 'static> OscillationController<P> {
    pub fn new(driver: SharedDriver<P>, config: &ServoConfig, sink: Arc<dyn EventSink>) -> Self {
        Self {
            driver,
            sink,
            profile: Profile::from(config),
            task: TaskSpec {
                core: Core::App,
                priority: 10,
                stack_kb: config.worker_stack_kb,
                name: "servo-osc\0",
            },
            run: Mutex::new(None),
        }
    }

    pub fn start(&self) -> bool {
        let mut run = lock(&self.run);

        if let Some(active) = run.as_ref() {
            if !active.worker.is_finished() {
                debug!("Oscillation start ignored: already running");
                return true;
            }
        }
        if let Some(dead) = run.take() {
            // Only reachable if the worker panicked.
            let _ = dead.worker.join();
            warn!("Oscillation worker had exited; restarting");
        }

        {
            let mut drv = lock(&self.driver);
            let was_active = drv.is_active();
            if let Err(e) = drv.engage() {
                error!("Oscillation start aborted, channel unavailable: {}", e);
                return false;
            }
            if !was_active {
                self.sink.emit(&AppEvent::ChannelEngaged {
                    frequency_hz: drv.frequency_hz(),
                });
            }
        }

        let stop = Arc::new(StopSignal::new());
        let worker_stop = Arc::clone(&stop);
        let driver = Arc::clone(&self.driver);
        let sink = Arc::clone(&self.sink);
        let profile = self.profile;

        match task_pin::spawn_on_core(self.task, move || {
            run_sequence(&driver, profile, &worker_stop, sink.as_ref());
        }) {
            Ok(worker) => {
                *run = Some(ActiveRun { stop, worker });
                info!(
                    "Oscillation started (kick {:.1}%/{:?}, rest {:.1}%/{:?})",
                    profile.kick_duty, profile.kick_hold, profile.rest_duty, profile.rest_hold
                );
                self.sink.emit(&AppEvent::OscillationStarted);
                true
            }
            Err(e) => {
                error!("Oscillation start aborted: {}", e);
                self.release_channel();
                false
            }
        }
    }

    pub fn stop(&self) {
        let mut run = lock(&self.run);
        let Some(active) = run.take() else {
            debug!("Oscillation stop ignored: already idle");
            return;
        };

        active.stop.signal(());
        if active.worker.join().is_err() {
            error!("Oscillation worker panicked");
        }

        self.release_channel();
        info!("Oscillation stopped");
        self.sink.emit(&AppEvent::OscillationStopped);
    }

    pub fn shutdown(&self) {
        self.stop();
        self.release_channel();
    }

    pub fn state(&self) -> OscillationState {
        if lock(&self.run).is_some() {
            OscillationState::Running
        } else {
            OscillationState::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == OscillationState::Running
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn driver(&self) -> &SharedDriver<P> {
        &self.driver
    }

    /// Zero the duty and release the pin. Best effort; failures are logged
    /// by the driver and the channel is considered released regardless.
    fn release_channel(&self) {
        let mut drv = lock(&self.driver);
        if !drv.is_active() {
            return;
        }
        if let Err(e) = drv.shutdown() {
            warn!("Servo channel release incomplete: {}", e);
        }
        self.sink.emit(&AppEvent::ChannelReleased);
    }
}

impl<P: PwmPort + 'static> MotionControl for OscillationController<P> {
    fn start(&self) -> bool {
        OscillationController::start(self)
    }

    fn stop(&self) {
        OscillationController::stop(self);
    }

    fn shutdown(&self) {
        OscillationController::shutdown(self);
    }
}

impl<P: PwmPort + 'static> Drop for OscillationController<P> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
