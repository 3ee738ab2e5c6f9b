#![cfg(all(feature = "hardware", target_os = "linux"))]

use glass_hardware::gpio::GpioLines;
use glass_traits::{Level, OutputLines};

// Only meaningful on a Raspberry Pi; the pins are left low afterwards.

#[test]
fn drive_lines_toggle_without_error() {
    let mut lines = GpioLines::open(&[16, 5, 6]).expect("open drive lines");
    lines.set_line(16, Level::High).expect("enable high");
    lines.set_line(5, Level::High).expect("a high");
    lines.set_line(5, Level::Low).expect("a low");
    lines.set_line(16, Level::Low).expect("enable low");
}

#[test]
fn unconfigured_pin_is_rejected() {
    let mut lines = GpioLines::open(&[5]).expect("open drive lines");
    let err = lines.set_line(6, Level::High).expect_err("pin 6 not claimed");
    assert!(err.to_string().contains("pin 6"));
}
