//! Toggle reconciler: maps activation changes onto the oscillation
//! controller.
//!
//! The activation hook runs inside the activation-history commit path and
//! must return promptly, while `stop()` may block until the worker joins.
//! The hook therefore only publishes the desired state into a
//! latest-value [`Signal`]; a dedicated applier thread waits on it and
//! drives the controller.
//!
//! ```text
//!   on_activation_changed(v) ─▶ dedupe ─▶ Signal<Directive> ─▶ applier
//!                                                                │
//!                                         start() / stop() ◀─────┘
//! ```
//!
//! Rapid alternations coalesce: if several changes land while a
//! transition is in flight, only the most recent one is applied, so the
//! controller always converges on the latest observed value. A start that
//! aborts is not counted as applied, so a redelivered `true` retries it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use futures_lite::future;
use log::{debug, error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{ActivationListener, EventSink};
use crate::drivers::task_pin::{self, Core, TaskSpec};
use crate::error::Error;
use crate::oscillation::{MotionControl, lock};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Directive {
    Activate,
    Deactivate,
    Shutdown,
}

type DirectiveSignal = Signal<CriticalSectionRawMutex, Directive>;

const APPLIER_TASK: TaskSpec = TaskSpec {
    core: Core::Pro,
    priority: 5,
    stack_kb: 8,
    name: "toggle-apply\0",
};

/// State shared between the activation hook and the applier.
struct Shared {
    /// Value the applier is converging on. Cleared when a start aborts so
    /// a redelivered `true` is applied again.
    desired: Mutex<Option<bool>>,
    /// Set before the shutdown directive is published; the applier checks
    /// it after every wake, so a later directive cannot mask it.
    closed: AtomicBool,
    sink: Arc<dyn EventSink>,
}

impl Shared {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn start_aborted(&self) {
        {
            let mut desired = lock(&self.desired);
            if *desired == Some(true) {
                *desired = None;
            }
        }
        warn!("Activation not applied: controller failed to start");
        self.sink
            .emit(&AppEvent::ActivationNotApplied { is_activated: true });
    }
}

pub struct ToggleReconciler {
    last_observed: Mutex<Option<bool>>,
    shared: Arc<Shared>,
    directive: Arc<DirectiveSignal>,
    applier: Mutex<Option<JoinHandle<()>>>,
}

impl ToggleReconciler {
    /// Spawn the applier thread that owns the controller's transitions.
    pub fn new<C>(controller: Arc<C>, sink: Arc<dyn EventSink>) -> Result<Self, Error>
    where
        C: MotionControl + 'static,
    {
        let shared = Arc::new(Shared {
            desired: Mutex::new(None),
            closed: AtomicBool::new(false),
            sink,
        });
        let directive = Arc::new(DirectiveSignal::new());

        let rx = Arc::clone(&directive);
        let applier_shared = Arc::clone(&shared);
        let applier = task_pin::spawn_on_core(APPLIER_TASK, move || {
            apply_directives(controller.as_ref(), &rx, &applier_shared);
        })?;

        Ok(Self {
            last_observed: Mutex::new(None),
            shared,
            directive,
            applier: Mutex::new(Some(applier)),
        })
    }

    /// Most recent activation value seen, `None` before the first.
    pub fn last_observed(&self) -> Option<bool> {
        *lock(&self.last_observed)
    }

    /// Stop the applier, shutting the controller down on its way out.
    /// Blocks until the applier has exited. Later calls are no-ops.
    pub fn shutdown(&self) {
        if self.shared.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.directive.signal(Directive::Shutdown);
        if let Some(applier) = lock(&self.applier).take() {
            if applier.join().is_err() {
                error!("Toggle applier panicked");
            }
        }
        info!("Toggle reconciler shut down");
    }
}

impl ActivationListener for ToggleReconciler {
    fn on_activation_changed(&self, is_activated: bool) {
        if self.shared.is_closed() {
            warn!("Activation change ({}) after shutdown ignored", is_activated);
            return;
        }

        *lock(&self.last_observed) = Some(is_activated);
        {
            let mut desired = lock(&self.shared.desired);
            if *desired == Some(is_activated) {
                debug!("Activation unchanged ({}), nothing to do", is_activated);
                self.shared
                    .sink
                    .emit(&AppEvent::RedundantActivation { is_activated });
                return;
            }
            *desired = Some(is_activated);
        }

        let directive = if is_activated {
            Directive::Activate
        } else {
            Directive::Deactivate
        };
        info!("Activation -> {}, requesting {:?}", is_activated, directive);
        self.directive.signal(directive);
    }
}

impl Drop for ToggleReconciler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn apply_directives<C: MotionControl + ?Sized>(
    controller: &C,
    rx: &DirectiveSignal,
    shared: &Shared,
) {
    loop {
        let directive = future::block_on(rx.wait());
        if shared.is_closed() {
            break;
        }
        match directive {
            Directive::Activate => {
                if !controller.start() {
                    shared.start_aborted();
                }
            }
            Directive::Deactivate => controller.stop(),
            Directive::Shutdown => break,
        }
    }
    controller.shutdown();
}
