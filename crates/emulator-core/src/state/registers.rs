/// Number of architecturally visible general-purpose registers (`x0..x31`).
pub const GENERAL_REGISTER_COUNT: usize = 32;

/// Architecturally visible general-purpose register identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Gpr(u8);

impl Gpr {
    /// The hardwired zero register `x0`.
    pub const ZERO: Self = Self(0);
    /// Return address register `x1` (`ra`).
    pub const RA: Self = Self(1);
    /// Stack pointer register `x2` (`sp`).
    pub const SP: Self = Self(2);
    /// First argument/return register `x10` (`a0`).
    pub const A0: Self = Self(10);

    /// Decodes a 5-bit register field into a register identifier.
    #[must_use]
    pub const fn from_u5(bits: u8) -> Option<Self> {
        if bits < GENERAL_REGISTER_COUNT as u8 {
            Some(Self(bits))
        } else {
            None
        }
    }

    /// Returns the register number (`0..=31`).
    #[must_use]
    pub const fn num(self) -> u8 {
        self.0
    }

    /// Returns the array index for this register (`0..=31`).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns the ABI name of this register (`zero`, `ra`, `sp`, ...).
    #[must_use]
    pub const fn abi_name(self) -> &'static str {
        ABI_NAMES[self.0 as usize]
    }
}

/// ABI register names indexed by register number.
pub const ABI_NAMES: [&str; GENERAL_REGISTER_COUNT] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

/// Privilege level of the hart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum PrivilegeLevel {
    /// User mode (encoding 0).
    User = 0,
    /// Machine mode (encoding 3). Initial privilege after construction.
    #[default]
    Machine = 3,
}

impl PrivilegeLevel {
    /// Returns the 2-bit encoding used by the `mstatus.MPP` field.
    #[must_use]
    pub const fn encoding(self) -> u32 {
        self as u32
    }

    /// Decodes an MPP field value. Anything other than machine mode
    /// collapses to user, matching the WARL treatment of the field.
    #[must_use]
    pub const fn from_mpp(bits: u32) -> Self {
        match bits & 0b11 {
            3 => Self::Machine,
            _ => Self::User,
        }
    }
}

/// Architectural register state: general registers, program counter, and
/// current privilege level.
///
/// `x0` is hardwired to zero: writes through [`ArchitecturalState::set_gpr`]
/// are discarded, so the invariant holds without a fixup pass after each
/// instruction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ArchitecturalState {
    gpr: [u32; GENERAL_REGISTER_COUNT],
    pc: u32,
    privilege: PrivilegeLevel,
}

impl ArchitecturalState {
    /// Reads a general-purpose register.
    #[must_use]
    pub const fn gpr(&self, reg: Gpr) -> u32 {
        self.gpr[reg.index()]
    }

    /// Writes a general-purpose register. Writes to `x0` are discarded.
    pub const fn set_gpr(&mut self, reg: Gpr, value: u32) {
        if reg.index() != 0 {
            self.gpr[reg.index()] = value;
        }
    }

    /// Reads the program counter.
    #[must_use]
    pub const fn pc(&self) -> u32 {
        self.pc
    }

    /// Writes the program counter.
    pub const fn set_pc(&mut self, value: u32) {
        self.pc = value;
    }

    /// Returns the current privilege level.
    #[must_use]
    pub const fn privilege(&self) -> PrivilegeLevel {
        self.privilege
    }

    /// Sets the current privilege level.
    pub const fn set_privilege(&mut self, level: PrivilegeLevel) {
        self.privilege = level;
    }

    /// Returns all general registers in numeric order.
    #[must_use]
    pub const fn gpr_snapshot(&self) -> [u32; GENERAL_REGISTER_COUNT] {
        self.gpr
    }
}
