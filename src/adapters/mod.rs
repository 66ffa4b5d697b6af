//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements   | Connects to                    |
//! |------------|--------------|--------------------------------|
//! | `hardware` | PwmPort      | ESP32 LEDC (servo channel)     |
//! | `hal_pwm`  | PwmPort      | any embedded-hal PWM channel   |
//! | `log_sink` | EventSink    | Serial log output              |
//! | `nvs`      | ConfigPort   | NVS / in-memory store          |
//! |            | StoragePort  |                                |
//! | `time`     | ClockPort    | ESP32 system clock             |

pub mod hal_pwm;
pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod time;
