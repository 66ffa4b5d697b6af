//! Toggle reconciler driving a real oscillation controller.

use std::sync::Arc;
use std::time::{Duration, Instant};

use servoswitch::app::events::AppEvent;
use servoswitch::app::ports::ActivationListener;
use servoswitch::reconciler::ToggleReconciler;

use crate::mock_hw::{Rig, rig, wait_until};

fn reconciler(r: &Rig) -> ToggleReconciler {
    ToggleReconciler::new(Arc::clone(&r.controller), r.events.clone()).unwrap()
}

#[test]
fn activation_starts_oscillation() {
    let r = rig(20, 20);
    let rec = reconciler(&r);

    rec.on_activation_changed(true);
    assert!(wait_until(|| r.controller.is_running()));
    let duties = r.pwm.wait_for_duties(3);
    assert_eq!(&duties[1..3], &[6.0, 2.0]);
}

#[test]
fn quick_off_after_on_ends_idle_at_zero() {
    let r = rig(10, 10_000);
    let rec = reconciler(&r);

    rec.on_activation_changed(true);
    rec.on_activation_changed(false);

    assert!(wait_until(|| !r.controller.is_running() && r.events.count(&AppEvent::OscillationStarted) <= r.events.count(&AppEvent::OscillationStopped)));
    assert_eq!(r.pwm.last_duty(), Some(0.0));
    assert_eq!(rec.last_observed(), Some(false));
}

#[test]
fn deactivation_while_idle_writes_nothing() {
    let r = rig(10, 10);
    let rec = reconciler(&r);
    let before = r.pwm.calls();

    rec.on_activation_changed(false);
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(r.pwm.calls(), before);
    assert!(!r.controller.is_running());
}

#[test]
fn repeated_activation_causes_one_transition() {
    let r = rig(10, 10);
    let rec = reconciler(&r);

    rec.on_activation_changed(true);
    assert!(wait_until(|| r.controller.is_running()));
    rec.on_activation_changed(true);
    rec.on_activation_changed(true);
    std::thread::sleep(Duration::from_millis(30));

    assert_eq!(r.events.count(&AppEvent::OscillationStarted), 1);
    assert_eq!(
        r.events
            .count(&AppEvent::RedundantActivation { is_activated: true }),
        2
    );
}

#[test]
fn hook_returns_while_stop_is_in_flight() {
    let r = rig(10, 60_000);
    let rec = reconciler(&r);
    rec.on_activation_changed(true);
    assert!(wait_until(|| r.pwm.duties().len() >= 3));

    let t0 = Instant::now();
    rec.on_activation_changed(false);
    assert!(t0.elapsed() < Duration::from_millis(50), "hook blocked");
    assert!(wait_until(|| r.pwm.is_released()));
}

#[test]
fn shutdown_stops_and_releases() {
    let r = rig(10, 10);
    let rec = reconciler(&r);
    rec.on_activation_changed(true);
    assert!(wait_until(|| r.controller.is_running()));

    rec.shutdown();
    assert!(!r.controller.is_running());
    assert!(r.pwm.is_released());
    assert_eq!(r.pwm.last_duty(), Some(0.0));
}

#[test]
fn redelivered_activation_retries_failed_engage() {
    let r = rig(10, 10);
    let rec = reconciler(&r);
    let not_applied = AppEvent::ActivationNotApplied { is_activated: true };

    rec.on_activation_changed(true);
    assert!(wait_until(|| r.controller.is_running()));
    rec.on_activation_changed(false);
    assert!(wait_until(|| !r.controller.is_running() && r.pwm.is_released()));

    r.pwm.fail_next_configure();
    rec.on_activation_changed(true);
    assert!(wait_until(|| r.events.count(&not_applied) == 1));
    assert!(!r.controller.is_running());

    rec.on_activation_changed(true);
    assert!(wait_until(|| r.controller.is_running()));
    assert_eq!(rec.last_observed(), Some(true));
    assert_eq!(r.events.count(&AppEvent::OscillationStarted), 2);
    assert_eq!(
        r.events
            .count(&AppEvent::RedundantActivation { is_activated: true }),
        0
    );
}
