//! GPIO / peripheral pin assignments for the ServoSwitch board.
//!
//! Single source of truth; drivers reference this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Servo signal
// ---------------------------------------------------------------------------

/// LEDC PWM output driving the servo signal line.
pub const SERVO_PWM_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// Hobby-servo frame rate (20 ms period).
pub const SERVO_PWM_FREQ_HZ: u32 = 50;
/// LEDC timer resolution (bits). 14-bit gives 0.006 % duty steps at 50 Hz,
/// fine enough to tell the 2.0 % rest from neighbouring positions.
pub const PWM_RESOLUTION_BITS: u32 = 14;
/// Largest duty register value at [`PWM_RESOLUTION_BITS`].
pub const PWM_MAX_DUTY: u32 = (1 << PWM_RESOLUTION_BITS) - 1;
