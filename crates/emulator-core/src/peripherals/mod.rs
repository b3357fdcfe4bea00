//! Memory-mapped peripheral devices.

/// Character-output console device.
pub mod console;

pub use console::{Console, ConsoleOutput, CONSOLE_BASE, CONSOLE_LEN};
