// src/value.rs

use std::fmt::Write;

// Every runtime datum is a plain f64 for now.
pub type Value = f64;

/// Renders a value the way traces and the REPL show it.
/// Whole numbers drop their fractional part: `3.0` prints as `3`.
pub fn format_value(value: Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

pub fn write_value(out: &mut impl Write, value: Value) {
    let _ = write!(out, "{}", value);
}
