use thiserror::Error;

/// Synchronous exception causes recorded in `mcause`.
///
/// The numeric values are the standard RISC-V exception codes; the high
/// (interrupt) bit is always zero because this core has no interrupt
/// sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u32)]
pub enum TrapCause {
    /// Instruction fetch from an address that is not 4-byte aligned.
    #[error("instruction address misaligned")]
    InstructionAddressMisaligned = 0,
    /// Instruction fetch from an unmapped address.
    #[error("instruction access fault")]
    InstructionAccessFault = 1,
    /// Undecodable instruction word, illegal CSR access, or `mret` outside
    /// machine mode.
    #[error("illegal instruction")]
    IllegalInstruction = 2,
    /// `ebreak`. Carried for `mcause` completeness; the interpreter surfaces
    /// `ebreak` as a halt rather than delivering this trap.
    #[error("breakpoint")]
    Breakpoint = 3,
    /// Load with an address not aligned to the access width.
    #[error("load address misaligned")]
    LoadAddressMisaligned = 4,
    /// Load from an unmapped address.
    #[error("load access fault")]
    LoadAccessFault = 5,
    /// Store with an address not aligned to the access width.
    #[error("store address misaligned")]
    StoreAddressMisaligned = 6,
    /// Store to an unmapped address.
    #[error("store access fault")]
    StoreAccessFault = 7,
    /// `ecall` executed in user mode.
    #[error("environment call from user mode")]
    UserEcall = 8,
    /// `ecall` executed in machine mode.
    #[error("environment call from machine mode")]
    MachineEcall = 11,
}

impl TrapCause {
    /// Converts a trap cause to the value stored in `mcause`.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self as u32
    }

    /// Converts an `mcause` value back into a trap cause.
    #[must_use]
    pub const fn from_u32(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::InstructionAddressMisaligned),
            1 => Some(Self::InstructionAccessFault),
            2 => Some(Self::IllegalInstruction),
            3 => Some(Self::Breakpoint),
            4 => Some(Self::LoadAddressMisaligned),
            5 => Some(Self::LoadAccessFault),
            6 => Some(Self::StoreAddressMisaligned),
            7 => Some(Self::StoreAccessFault),
            8 => Some(Self::UserEcall),
            11 => Some(Self::MachineEcall),
            _ => None,
        }
    }
}
