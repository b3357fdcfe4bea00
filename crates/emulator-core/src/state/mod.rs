//! Architectural CPU state model primitives.

/// Architectural register file types and storage model.
pub mod registers;

pub use registers::{
    ArchitecturalState, Gpr, PrivilegeLevel, ABI_NAMES, GENERAL_REGISTER_COUNT,
};
