//! Panic fail-safe.
//!
//! A panic anywhere in the firmware must not leave the servo holding its
//! last duty. The hook installed here drives the LEDC channel to 0 % and
//! releases it through the raw `hw_init` helpers, never through the
//! [`ActuatorDriver`](crate::drivers::servo::ActuatorDriver): the
//! panicking thread may be the one holding the driver lock.
//!
//! The previously installed hook still runs afterwards, so the default
//! ESP-IDF abort/reset path is unchanged.

use std::any::Any;

use crate::drivers::hw_init;

/// Best-effort extraction of a panic message.
pub fn panic_reason(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic"
    }
}

/// Zero the servo duty register and release the pin, ignoring errors.
pub fn force_servo_off() {
    if let Err(e) = hw_init::ledc_servo_set(0) {
        log::error!("Fail-safe: zero duty failed: {}", e);
    }
    if let Err(e) = hw_init::ledc_servo_release() {
        log::error!("Fail-safe: release failed: {}", e);
    }
}

/// Install a panic hook that runs `failsafe` before the previous hook.
///
/// Must be called once during init, after the servo channel exists.
pub fn install_panic_handler<F>(failsafe: F)
where
    F: Fn() + Send + Sync + 'static,
{
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_default();
        log::error!("PANIC at {}: {}", location, panic_reason(info.payload()));

        failsafe();
        previous(info);
    }));
}
