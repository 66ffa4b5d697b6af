//! Fuzz target: console command parsing
//!
//! Feeds arbitrary UTF-8 lines to `AppCommand::from_str` and checks that
//! parsing never panics and that accepted lines are insensitive to case
//! and surrounding whitespace.
//!
//! cargo fuzz run fuzz_console_command

#![no_main]

use libfuzzer_sys::fuzz_target;
use servoswitch::app::commands::AppCommand;

fuzz_target!(|data: &[u8]| {
    let Ok(line) = core::str::from_utf8(data) else {
        return;
    };

    let Ok(cmd) = line.parse::<AppCommand>() else {
        return;
    };

    let padded = format!("  {}\n", line.to_ascii_uppercase());
    assert_eq!(padded.parse::<AppCommand>(), Ok(cmd));
});
