//! Application layer: port traits, events, and the toggle service.
//!
//! The core components ([`ActuatorDriver`](crate::drivers::servo::ActuatorDriver),
//! [`OscillationController`](crate::oscillation::OscillationController),
//! [`ToggleReconciler`](crate::reconciler::ToggleReconciler)) reach the
//! outside world only through the **port traits** in [`ports`]. The
//! [`service`] module wires the activation history to the reconciler.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
