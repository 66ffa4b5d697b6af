//! ServoSwitch Firmware: Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  LedcServoChannel  LogEventSink   NvsAdapter   Esp32Time       │
//! │  (PwmPort)         (EventSink)    (Config+NVS) (ClockPort)     │
//! │  Serial console    (AppCommand lines → JSON replies)           │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ToggleService ──▶ ToggleReconciler ──▶ OscillationController  │
//! │  (history)         (hook, applier)      (kick/rest worker)     │
//! │                                              │                 │
//! │                                         ActuatorDriver         │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::io::BufRead;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use log::{info, warn};

use servoswitch::adapters::hardware::LedcServoChannel;
use servoswitch::adapters::log_sink::LogEventSink;
use servoswitch::adapters::nvs::NvsAdapter;
use servoswitch::adapters::time::Esp32TimeAdapter;
use servoswitch::app::commands::AppCommand;
use servoswitch::app::events::AppEvent;
use servoswitch::app::ports::{ConfigPort, EventSink};
use servoswitch::app::service::{ToggleService, error_json};
use servoswitch::config::ServoConfig;
use servoswitch::diagnostics;
use servoswitch::drivers::servo::ActuatorDriver;
use servoswitch::error::Error;
use servoswitch::oscillation::OscillationController;
use servoswitch::reconciler::ToggleReconciler;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  ServoSwitch v{}                  ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let nvs = match NvsAdapter::new() {
        Ok(n) => n,
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults and no persistence", e);
            NvsAdapter::default()
        }
    };
    let config = nvs.load().unwrap_or_else(|e| {
        warn!("NVS config load failed ({}), using defaults", e);
        ServoConfig::default()
    });

    // ── 3. Servo channel (fatal if unavailable) ───────────────
    let sink: Arc<dyn EventSink> = Arc::new(LogEventSink::new());
    let mut driver = ActuatorDriver::new(LedcServoChannel::new(), config.pwm_frequency_hz);
    driver.initialize().map_err(Error::from)?;
    sink.emit(&AppEvent::ChannelEngaged {
        frequency_hz: driver.frequency_hz(),
    });
    diagnostics::install_panic_handler(diagnostics::force_servo_off);

    // ── 4. Core wiring ────────────────────────────────────────
    let controller = Arc::new(OscillationController::new(
        Arc::new(Mutex::new(driver)),
        &config,
        Arc::clone(&sink),
    ));
    let reconciler = Arc::new(ToggleReconciler::new(
        Arc::clone(&controller),
        Arc::clone(&sink),
    )?);
    let mut service = ToggleService::new(
        nvs,
        Esp32TimeAdapter::new(),
        Arc::clone(&reconciler),
        Arc::clone(&sink),
    );
    service.boot()?;

    // ── 5. Console loop ───────────────────────────────────────
    info!("Ready: init | switch | status | quit");
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                warn!("Console read failed: {}", e);
                break;
            }
        };
        let line = line.trim();
        if line.eq_ignore_ascii_case("quit") {
            break;
        }

        match line
            .parse::<AppCommand>()
            .and_then(|cmd| service.handle_command(cmd))
        {
            Ok(reply) => println!("{}", reply.to_json()),
            Err(e) => {
                warn!("Command '{}' failed: {}", line, e);
                println!("{}", error_json(&e));
            }
        }
    }

    // ── 6. Orderly shutdown ───────────────────────────────────
    info!("Shutting down");
    reconciler.shutdown();
    controller.shutdown();
    Ok(())
}
