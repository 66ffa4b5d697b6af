//! End to end: console command → history commit → reconciler → servo.

use std::sync::Arc;

use servoswitch::app::commands::AppCommand;
use servoswitch::app::service::{CommandReply, ToggleService};
use servoswitch::error::Error;
use servoswitch::reconciler::ToggleReconciler;

use crate::mock_hw::{FixedClock, MemStorage, Rig, rig, wait_until};

type Service = ToggleService<MemStorage, FixedClock, Arc<ToggleReconciler>>;

fn service(r: &Rig, storage: MemStorage) -> Service {
    let rec = Arc::new(ToggleReconciler::new(Arc::clone(&r.controller), r.events.clone()).unwrap());
    ToggleService::new(storage, FixedClock, rec, r.events.clone())
}

fn run(svc: &mut Service, line: &str) -> Result<CommandReply, Error> {
    line.parse::<AppCommand>().and_then(|cmd| svc.handle_command(cmd))
}

#[test]
fn switch_twice_runs_then_parks_the_servo() {
    let r = rig(10, 10);
    let mut svc = service(&r, MemStorage::default());
    svc.boot().unwrap();
    assert!(!r.controller.is_running());

    run(&mut svc, "/switch-action").unwrap();
    assert!(wait_until(|| r.controller.is_running()));
    r.pwm.wait_for_duties(3);

    run(&mut svc, "switch").unwrap();
    assert!(wait_until(|| !r.controller.is_running() && r.pwm.is_released()));

    let json = run(&mut svc, "status").unwrap().to_json();
    assert!(json.starts_with(r#"{"total_actions":3,"#), "{json}");
}

#[test]
fn init_forces_off_from_any_state() {
    let r = rig(10, 10);
    let mut svc = service(&r, MemStorage::default());
    svc.boot().unwrap();
    run(&mut svc, "switch").unwrap();
    assert!(wait_until(|| r.controller.is_running()));

    let reply = run(&mut svc, "init").unwrap();
    assert!(reply.to_json().contains(r#""message":"Action initialized""#));
    assert!(wait_until(|| !r.controller.is_running()));
    assert_eq!(r.pwm.last_duty(), Some(0.0));
}

#[test]
fn reboot_resumes_persisted_activation() {
    let storage = {
        let r = rig(10, 10);
        let mut svc = service(&r, MemStorage::default());
        svc.boot().unwrap();
        run(&mut svc, "switch").unwrap();
        svc.into_storage()
    };

    let r = rig(10, 10);
    let mut svc = service(&r, storage);
    svc.boot().unwrap();
    assert!(wait_until(|| r.controller.is_running()));
    assert_eq!(svc.history().len(), 2);
}

#[test]
fn failed_persist_leaves_servo_alone() {
    let r = rig(10, 10);
    let mut svc = service(&r, MemStorage::default());
    svc.boot().unwrap();

    let mut storage = svc.into_storage();
    storage.read_only = true;
    let mut svc = service(&r, storage);
    svc.boot().unwrap();
    let before = r.pwm.calls();
    assert!(matches!(run(&mut svc, "switch"), Err(Error::Storage(_))));

    std::thread::sleep(std::time::Duration::from_millis(30));
    assert!(!r.controller.is_running());
    assert_eq!(r.pwm.calls(), before);
}

#[test]
fn unknown_command_is_rejected() {
    let r = rig(10, 10);
    let mut svc = service(&r, MemStorage::default());
    assert_eq!(run(&mut svc, "reboot"), Err(Error::UnknownCommand));
    assert_eq!(run(&mut svc, "switch"), Err(Error::EmptyHistory));
}
