//! Oscillation controller against a recording PWM channel.
//!
//! Holds are shortened to milliseconds; the long-hold cases use a 60 s
//! rest so a stop that waited the hold out would blow the 1 s budget.

use std::sync::Arc;
use std::thread::{self, sleep};
use std::time::{Duration, Instant};

use servoswitch::app::events::AppEvent;
use servoswitch::oscillation::{OscillationState, Phase};

use crate::mock_hw::{PwmCall, rig, wait_until};

const STOP_BUDGET: Duration = Duration::from_secs(1);

#[test]
fn start_writes_kick_then_rest() {
    let r = rig(20, 20);
    r.controller.start();
    assert_eq!(r.controller.state(), OscillationState::Running);

    let duties = r.pwm.wait_for_duties(5);
    // Initial 0 from initialize(), then the cycle repeats.
    assert_eq!(&duties[..5], &[0.0, 6.0, 2.0, 6.0, 2.0]);
    r.controller.stop();
}

#[test]
fn stop_during_long_rest_returns_promptly() {
    let r = rig(10, 60_000);
    r.controller.start();
    r.pwm.wait_for_duties(3);

    let t0 = Instant::now();
    r.controller.stop();
    assert!(t0.elapsed() < STOP_BUDGET, "stop took {:?}", t0.elapsed());

    assert_eq!(r.controller.state(), OscillationState::Idle);
    assert_eq!(r.pwm.last_duty(), Some(0.0));
    assert!(r.pwm.is_released());
}

#[test]
fn stop_during_kick_hold_returns_promptly() {
    let r = rig(5_000, 10);
    r.controller.start();
    assert_eq!(r.pwm.wait_for_duties(2)[1], 6.0);

    let t0 = Instant::now();
    r.controller.stop();
    assert!(t0.elapsed() < STOP_BUDGET);
    assert_eq!(r.pwm.last_duty(), Some(0.0));
    assert!(r.pwm.is_released());
}

#[test]
fn stop_during_kick_write_leaves_channel_off() {
    let r = rig(10_000, 10_000);
    r.pwm.gate_duty(6.0);
    r.controller.start();
    assert!(r.pwm.wait_gate_entered(), "worker never reached the kick write");

    let ctl = Arc::clone(&r.controller);
    let stopper = thread::spawn(move || {
        let t0 = Instant::now();
        ctl.stop();
        t0.elapsed()
    });
    sleep(Duration::from_millis(30));
    assert!(!stopper.is_finished(), "stop returned while the kick write was in flight");
    r.pwm.open_gate();
    let took = stopper.join().unwrap();

    assert!(took < STOP_BUDGET);
    assert_eq!(r.controller.state(), OscillationState::Idle);
    assert_eq!(r.pwm.duties(), [0.0, 6.0, 0.0]);
    assert!(r.pwm.is_released());
    let settled = r.pwm.calls().len();
    sleep(Duration::from_millis(50));
    assert_eq!(r.pwm.calls().len(), settled, "no writes after stop returned");
}

#[test]
fn second_start_does_not_add_a_writer() {
    let r = rig(10, 10);
    r.controller.start();
    r.controller.start();
    let duties = r.pwm.wait_for_duties(12);
    r.controller.stop();

    assert_eq!(r.events.count(&AppEvent::OscillationStarted), 1);
    // One writer strictly alternates kick and rest.
    for pair in duties[1..11].windows(2) {
        assert_ne!(pair[0], pair[1], "duplicate write in {:?}", duties);
    }
}

#[test]
fn stop_while_idle_touches_nothing() {
    let r = rig(10, 10);
    let before = r.pwm.calls();
    r.controller.stop();
    assert_eq!(r.pwm.calls(), before);
    assert!(r.events.events().is_empty());
}

#[test]
fn restart_reconfigures_released_channel() {
    let r = rig(10, 10);
    r.controller.start();
    r.pwm.wait_for_duties(3);
    r.controller.stop();

    r.controller.start();
    assert!(wait_until(|| r.pwm.calls().iter().filter(|c| matches!(c, PwmCall::Configure(_))).count() == 2));
    let after_restart = r.pwm.duties().len();
    r.pwm.wait_for_duties(after_restart + 2);
    r.controller.stop();
    assert!(r.pwm.is_released());
}

#[test]
fn write_failures_are_reported_and_cycle_continues() {
    let r = rig(10, 10);
    r.pwm.fail_duty_writes(true);
    r.controller.start();

    assert!(wait_until(|| {
        r.events
            .events()
            .iter()
            .filter(|e| matches!(e, AppEvent::DutyWriteFailed { .. }))
            .count()
            >= 4
    }));
    assert!(r.controller.is_running());
    assert!(r.events.events().iter().any(|e| matches!(
        e,
        AppEvent::DutyWriteFailed {
            phase: Phase::Rest,
            ..
        }
    )));

    r.pwm.fail_duty_writes(false);
    let before = r.pwm.duties().len();
    r.pwm.wait_for_duties(before + 2);
    r.controller.stop();
    assert_eq!(r.pwm.last_duty(), Some(0.0));
}

#[test]
fn shutdown_releases_even_when_idle() {
    let r = rig(10, 10);
    r.controller.shutdown();
    assert!(r.pwm.is_released());
    assert_eq!(r.events.count(&AppEvent::ChannelReleased), 1);
    r.controller.shutdown();
    assert_eq!(r.events.count(&AppEvent::ChannelReleased), 1);
}
