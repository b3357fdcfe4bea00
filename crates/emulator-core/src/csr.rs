//! Control and status register file for the Zicsr subset this core models.
//!
//! Only machine-mode trap handling state and the user-readable counters are
//! implemented. `mstatus` models the MPP field alone; all other bits read as
//! zero and ignore writes.

use thiserror::Error;

use crate::state::PrivilegeLevel;

/// `mstatus` CSR address.
pub const CSR_MSTATUS: u16 = 0x300;
/// `mtvec` CSR address.
pub const CSR_MTVEC: u16 = 0x305;
/// `mscratch` CSR address.
pub const CSR_MSCRATCH: u16 = 0x340;
/// `mepc` CSR address.
pub const CSR_MEPC: u16 = 0x341;
/// `mcause` CSR address.
pub const CSR_MCAUSE: u16 = 0x342;
/// `mtval` CSR address.
pub const CSR_MTVAL: u16 = 0x343;
/// `cycle` counter CSR address (low 32 bits, read-only).
pub const CSR_CYCLE: u16 = 0xC00;
/// `instret` counter CSR address (low 32 bits, read-only).
pub const CSR_INSTRET: u16 = 0xC02;
/// `cycleh` counter CSR address (high 32 bits, read-only).
pub const CSR_CYCLEH: u16 = 0xC80;
/// `instreth` counter CSR address (high 32 bits, read-only).
pub const CSR_INSTRETH: u16 = 0xC82;

/// Bit position of the MPP field within `mstatus`.
pub const MSTATUS_MPP_SHIFT: u32 = 11;

const MACHINE_CSR_START: u16 = 0x300;
const MACHINE_CSR_END: u16 = 0x3FF;

/// CSR access rejection. Every variant is delivered to the guest as an
/// illegal-instruction trap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum CsrError {
    /// The address is outside the implemented CSR set.
    #[error("csr {0:#05x} is not implemented")]
    Unimplemented(u16),
    /// A machine-mode CSR was accessed from user mode.
    #[error("csr {0:#05x} requires machine mode")]
    PrivilegeTooLow(u16),
    /// A write targeted a read-only counter.
    #[error("csr {0:#05x} is read-only")]
    ReadOnly(u16),
}

/// Name/address pairs for the implemented CSR set, in address order.
pub const CSR_NAMES: [(&str, u16); 10] = [
    ("mstatus", CSR_MSTATUS),
    ("mtvec", CSR_MTVEC),
    ("mscratch", CSR_MSCRATCH),
    ("mepc", CSR_MEPC),
    ("mcause", CSR_MCAUSE),
    ("mtval", CSR_MTVAL),
    ("cycle", CSR_CYCLE),
    ("instret", CSR_INSTRET),
    ("cycleh", CSR_CYCLEH),
    ("instreth", CSR_INSTRETH),
];

/// Returns the canonical name of an implemented CSR address.
#[must_use]
pub fn csr_name(addr: u16) -> Option<&'static str> {
    CSR_NAMES
        .iter()
        .find(|(_, a)| *a == addr)
        .map(|(name, _)| *name)
}

/// Resolves a CSR name (case-insensitive) to its address.
#[must_use]
pub fn csr_address(name: &str) -> Option<u16> {
    CSR_NAMES
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, addr)| *addr)
}

/// The implemented CSR state.
///
/// Counters are kept as native 64-bit values and split over the
/// `cycle`/`cycleh` and `instret`/`instreth` address pairs on read.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CsrFile {
    mpp: PrivilegeLevel,
    mscratch: u32,
    mtvec: u32,
    mepc: u32,
    mcause: u32,
    mtval: u32,
    cycle: u64,
    instret: u64,
}

impl Default for CsrFile {
    fn default() -> Self {
        Self {
            mpp: PrivilegeLevel::User,
            mscratch: 0,
            mtvec: 0,
            mepc: 0,
            mcause: 0,
            mtval: 0,
            cycle: 0,
            instret: 0,
        }
    }
}

impl CsrFile {
    /// Validates that `addr` names an implemented CSR reachable from the
    /// given privilege level.
    ///
    /// # Errors
    ///
    /// Returns [`CsrError::Unimplemented`] for unknown addresses and
    /// [`CsrError::PrivilegeTooLow`] for machine-mode CSRs accessed from
    /// user mode.
    pub const fn check_access(addr: u16, privilege: PrivilegeLevel) -> Result<(), CsrError> {
        if !Self::is_implemented(addr) {
            return Err(CsrError::Unimplemented(addr));
        }
        if addr >= MACHINE_CSR_START
            && addr <= MACHINE_CSR_END
            && !matches!(privilege, PrivilegeLevel::Machine)
        {
            return Err(CsrError::PrivilegeTooLow(addr));
        }
        Ok(())
    }

    /// Returns `true` when `addr` names an implemented CSR.
    #[must_use]
    pub const fn is_implemented(addr: u16) -> bool {
        matches!(
            addr,
            CSR_MSTATUS
                | CSR_MTVEC
                | CSR_MSCRATCH
                | CSR_MEPC
                | CSR_MCAUSE
                | CSR_MTVAL
                | CSR_CYCLE
                | CSR_INSTRET
                | CSR_CYCLEH
                | CSR_INSTRETH
        )
    }

    /// Returns `true` when `addr` names a read-only CSR.
    #[must_use]
    pub const fn is_read_only(addr: u16) -> bool {
        matches!(addr, CSR_CYCLE | CSR_INSTRET | CSR_CYCLEH | CSR_INSTRETH)
    }

    /// Reads a CSR.
    ///
    /// # Errors
    ///
    /// Returns a [`CsrError`] when the address is unimplemented or requires
    /// a higher privilege level.
    #[allow(clippy::cast_possible_truncation)]
    pub fn read(&self, addr: u16, privilege: PrivilegeLevel) -> Result<u32, CsrError> {
        Self::check_access(addr, privilege)?;
        let value = match addr {
            CSR_MSTATUS => self.mpp.encoding() << MSTATUS_MPP_SHIFT,
            CSR_MTVEC => self.mtvec,
            CSR_MSCRATCH => self.mscratch,
            CSR_MEPC => self.mepc,
            CSR_MCAUSE => self.mcause,
            CSR_MTVAL => self.mtval,
            CSR_CYCLE => self.cycle as u32,
            CSR_CYCLEH => (self.cycle >> 32) as u32,
            CSR_INSTRET => self.instret as u32,
            CSR_INSTRETH => (self.instret >> 32) as u32,
            _ => unreachable!("check_access admits only implemented CSRs"),
        };
        Ok(value)
    }

    /// Writes a CSR.
    ///
    /// `mstatus` retains only the MPP field. `mepc` has its low bit forced
    /// to zero.
    ///
    /// # Errors
    ///
    /// Returns a [`CsrError`] when the address is unimplemented, requires a
    /// higher privilege level, or is read-only.
    pub fn write(
        &mut self,
        addr: u16,
        value: u32,
        privilege: PrivilegeLevel,
    ) -> Result<(), CsrError> {
        Self::check_access(addr, privilege)?;
        if Self::is_read_only(addr) {
            return Err(CsrError::ReadOnly(addr));
        }
        match addr {
            CSR_MSTATUS => self.mpp = PrivilegeLevel::from_mpp(value >> MSTATUS_MPP_SHIFT),
            CSR_MTVEC => self.mtvec = value,
            CSR_MSCRATCH => self.mscratch = value,
            CSR_MEPC => self.mepc = value & !0b1,
            CSR_MCAUSE => self.mcause = value,
            CSR_MTVAL => self.mtval = value,
            _ => unreachable!("read-only CSRs were rejected above"),
        }
        Ok(())
    }

    /// Records trap state: saved PC, cause, trap value, and the pre-trap
    /// privilege level in MPP.
    pub const fn record_trap(
        &mut self,
        epc: u32,
        cause: u32,
        tval: u32,
        prior: PrivilegeLevel,
    ) {
        self.mepc = epc;
        self.mcause = cause;
        self.mtval = tval;
        self.mpp = prior;
    }

    /// Returns the trap vector base with the mode bits cleared (direct mode
    /// is the only supported dispatch mode).
    #[must_use]
    pub const fn trap_vector(&self) -> u32 {
        self.mtvec & !0b11
    }

    /// Returns the saved exception PC.
    #[must_use]
    pub const fn mepc(&self) -> u32 {
        self.mepc
    }

    /// Returns the saved previous privilege level.
    #[must_use]
    pub const fn mpp(&self) -> PrivilegeLevel {
        self.mpp
    }

    /// Clears MPP back to user mode, as `mret` requires.
    pub const fn clear_mpp(&mut self) {
        self.mpp = PrivilegeLevel::User;
    }

    /// Returns the `mscratch` value.
    #[must_use]
    pub const fn mscratch(&self) -> u32 {
        self.mscratch
    }

    /// Returns the raw `mtvec` value.
    #[must_use]
    pub const fn mtvec(&self) -> u32 {
        self.mtvec
    }

    /// Returns the `mcause` value.
    #[must_use]
    pub const fn mcause(&self) -> u32 {
        self.mcause
    }

    /// Returns the `mtval` value.
    #[must_use]
    pub const fn mtval(&self) -> u32 {
        self.mtval
    }

    /// Increments the cycle counter. Called once per attempted step.
    pub const fn count_cycle(&mut self) {
        self.cycle = self.cycle.wrapping_add(1);
    }

    /// Increments the retired-instruction counter.
    pub const fn count_retirement(&mut self) {
        self.instret = self.instret.wrapping_add(1);
    }

    /// Returns the 64-bit cycle counter.
    #[must_use]
    pub const fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Returns the 64-bit retired-instruction counter.
    #[must_use]
    pub const fn instret(&self) -> u64 {
        self.instret
    }
}
