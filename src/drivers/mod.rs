//! Servo driver, LEDC peripheral helpers, worker thread spawning, and the
//! timer driver behind the hold timers.

pub mod hw_init;
pub mod servo;
pub mod task_pin;
pub mod time_driver;
