//! Emulator core for an RV32I + Zicsr machine with machine/user privilege
//! levels and synchronous trap delivery.
//!
//! The crate is host-agnostic: it exposes the memory bus, the interpreter,
//! and pure state dumps, and leaves run loops, batching, and rendering to
//! the embedding host.

/// Memory model primitives: bus capability, RAM, and MMIO dispatch.
pub mod memory;
pub use memory::{
    validate_alignment, AccessWidth, Bus, BusFault, MmioDevice, Ram, SystemBus, DEFAULT_RAM_BYTES,
};

/// Architectural CPU state model primitives.
pub mod state;
pub use state::{ArchitecturalState, Gpr, PrivilegeLevel, ABI_NAMES, GENERAL_REGISTER_COUNT};

/// Control and status register file.
pub mod csr;
pub use csr::{csr_address, csr_name, CsrError, CsrFile, CSR_NAMES};

/// Synchronous exception cause taxonomy.
pub mod trap;
pub use trap::TrapCause;

/// Instruction decode for RV32I + Zicsr.
pub mod decoder;
pub use decoder::{decode, Instruction};

/// Public host-facing API contract types.
pub mod api;
pub use api::{StateDump, StepOutcome};

/// Instruction execution pipeline and trap delivery.
pub mod execute;
pub use execute::Interpreter;

/// Instruction disassembly.
pub mod disasm;
pub use disasm::{disassemble_word, format_instruction, format_row, DisasmRow};

/// Memory-mapped peripheral devices.
pub mod peripherals;
pub use peripherals::{Console, ConsoleOutput, CONSOLE_BASE, CONSOLE_LEN};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
