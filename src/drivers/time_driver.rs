//! Time driver for the embassy timer stack.
//!
//! `async_io_mini::Timer` (the oscillation hold timer) reads ticks and
//! registers wakeups through `embassy-time-driver`, which must be provided
//! exactly once per binary.
//!
//! - **`target_os = "espidf"`**: 1 MHz ticks from `esp_timer_get_time()`.
//!   Wakeups are queued and fired by a single dispatcher thread, started on
//!   the first registration.
//! - **`not(target_os = "espidf")`**: the `std` driver shipped with
//!   `embassy-time`.

#[cfg(not(target_os = "espidf"))]
use embassy_time as _;

#[cfg(target_os = "espidf")]
mod esp {
    use core::task::Waker;
    use core::time::Duration;
    use std::sync::{Condvar, Mutex, MutexGuard, Once, PoisonError};

    use embassy_time_driver::Driver;

    const DISPATCH_STACK: usize = 4096;

    struct EspTimerDriver {
        pending: Mutex<Vec<(u64, Waker)>>,
        changed: Condvar,
        dispatcher: Once,
    }

    embassy_time_driver::time_driver_impl!(static DRIVER: EspTimerDriver = EspTimerDriver {
        pending: Mutex::new(Vec::new()),
        changed: Condvar::new(),
        dispatcher: Once::new(),
    });

    impl EspTimerDriver {
        fn queue(&self) -> MutexGuard<'_, Vec<(u64, Waker)>> {
            self.pending.lock().unwrap_or_else(PoisonError::into_inner)
        }

        fn dispatch(&self) {
            let mut pending = self.queue();
            loop {
                let now = self.now();
                let mut next = u64::MAX;
                pending.retain(|(at, waker)| {
                    if *at <= now {
                        waker.wake_by_ref();
                        false
                    } else {
                        next = next.min(*at);
                        true
                    }
                });

                pending = if next == u64::MAX {
                    self.changed
                        .wait(pending)
                        .unwrap_or_else(PoisonError::into_inner)
                } else {
                    self.changed
                        .wait_timeout(pending, Duration::from_micros(next - now))
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                };
            }
        }
    }

    impl Driver for EspTimerDriver {
        fn now(&self) -> u64 {
            (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
        }

        fn schedule_wake(&self, at: u64, waker: &Waker) {
            self.dispatcher.call_once(|| {
                let spawned = std::thread::Builder::new()
                    .name("time-wake".into())
                    .stack_size(DISPATCH_STACK)
                    .spawn(|| DRIVER.dispatch());
                if let Err(e) = spawned {
                    log::error!("Time driver dispatcher failed to start: {}", e);
                }
            });

            let mut pending = self.queue();
            match pending.iter_mut().find(|(_, w)| w.will_wake(waker)) {
                Some(entry) => entry.0 = entry.0.min(at),
                None => pending.push((at, waker.clone())),
            }
            self.changed.notify_one();
        }
    }
}
