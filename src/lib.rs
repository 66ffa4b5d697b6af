//! ServoSwitch firmware library.
//!
//! Exposes the core (actuator driver, oscillation controller, toggle
//! reconciler) and its adapters for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod activation;
pub mod app;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod oscillation;
pub mod pins;
pub mod reconciler;

pub mod adapters;
pub mod drivers;
