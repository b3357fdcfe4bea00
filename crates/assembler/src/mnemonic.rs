//! Mnemonic and register-name resolution.
//!
//! Mnemonics and register names are case-insensitive; the tables below are
//! the single source of truth for what the assembler accepts. Labels stay
//! case-sensitive and never pass through here.

use slate_core::Gpr;

/// Register-register ALU operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum ROp {
    Add,
    Sub,
    Sll,
    Slt,
    Sltu,
    Xor,
    Srl,
    Sra,
    Or,
    And,
}

/// Register-immediate ALU operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum IOp {
    Addi,
    Slti,
    Sltiu,
    Xori,
    Ori,
    Andi,
}

/// Immediate shift operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum ShiftOp {
    Slli,
    Srli,
    Srai,
}

/// Load operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum LoadOp {
    Lb,
    Lh,
    Lw,
    Lbu,
    Lhu,
}

/// Store operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum StoreOp {
    Sb,
    Sh,
    Sw,
}

/// Conditional branch operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum BranchOp {
    Beq,
    Bne,
    Blt,
    Bge,
    Bltu,
    Bgeu,
}

/// Upper-immediate operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum UpperOp {
    Lui,
    Auipc,
}

/// CSR read-modify-write flavors. Register and immediate source forms share
/// these; [`MnemonicKind`] distinguishes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum CsrOp {
    Rw,
    Rs,
    Rc,
}

/// Pseudo-instructions the assembler expands into real encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum PseudoOp {
    Nop,
    Mv,
    Li,
    La,
    J,
    Jr,
    Ret,
    Call,
    Beqz,
    Bnez,
    Bltz,
    Bgez,
    Blez,
    Bgtz,
    Not,
    Neg,
    Seqz,
    Snez,
}

/// Resolution of a mnemonic: which operand shape to parse and which
/// encoding family it lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MnemonicKind {
    /// `op rd, rs1, rs2`
    RType(ROp),
    /// `op rd, rs1, imm`
    IType(IOp),
    /// `op rd, rs1, shamt`
    Shift(ShiftOp),
    /// `op rd, offset(rs1)`
    Load(LoadOp),
    /// `op rs2, offset(rs1)`
    Store(StoreOp),
    /// `op rs1, rs2, target`
    Branch(BranchOp),
    /// `jal [rd,] target`
    Jal,
    /// `jalr rd, rs1, offset` or `jalr rs1`
    Jalr,
    /// `op rd, imm20`
    Upper(UpperOp),
    /// `op rd, csr, rs1`
    CsrReg(CsrOp),
    /// `op rd, csr, uimm`
    CsrImm(CsrOp),
    /// No operands.
    Fence,
    /// No operands.
    Ecall,
    /// No operands.
    Ebreak,
    /// No operands.
    Mret,
    /// Assembler-level mnemonic with its own operand shape.
    Pseudo(PseudoOp),
}

/// Resolves a mnemonic, case-insensitively.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn resolve_mnemonic(name: &str) -> Option<MnemonicKind> {
    use MnemonicKind as K;
    let kind = match name.to_ascii_lowercase().as_str() {
        "add" => K::RType(ROp::Add),
        "sub" => K::RType(ROp::Sub),
        "sll" => K::RType(ROp::Sll),
        "slt" => K::RType(ROp::Slt),
        "sltu" => K::RType(ROp::Sltu),
        "xor" => K::RType(ROp::Xor),
        "srl" => K::RType(ROp::Srl),
        "sra" => K::RType(ROp::Sra),
        "or" => K::RType(ROp::Or),
        "and" => K::RType(ROp::And),
        "addi" => K::IType(IOp::Addi),
        "slti" => K::IType(IOp::Slti),
        "sltiu" => K::IType(IOp::Sltiu),
        "xori" => K::IType(IOp::Xori),
        "ori" => K::IType(IOp::Ori),
        "andi" => K::IType(IOp::Andi),
        "slli" => K::Shift(ShiftOp::Slli),
        "srli" => K::Shift(ShiftOp::Srli),
        "srai" => K::Shift(ShiftOp::Srai),
        "lb" => K::Load(LoadOp::Lb),
        "lh" => K::Load(LoadOp::Lh),
        "lw" => K::Load(LoadOp::Lw),
        "lbu" => K::Load(LoadOp::Lbu),
        "lhu" => K::Load(LoadOp::Lhu),
        "sb" => K::Store(StoreOp::Sb),
        "sh" => K::Store(StoreOp::Sh),
        "sw" => K::Store(StoreOp::Sw),
        "beq" => K::Branch(BranchOp::Beq),
        "bne" => K::Branch(BranchOp::Bne),
        "blt" => K::Branch(BranchOp::Blt),
        "bge" => K::Branch(BranchOp::Bge),
        "bltu" => K::Branch(BranchOp::Bltu),
        "bgeu" => K::Branch(BranchOp::Bgeu),
        "jal" => K::Jal,
        "jalr" => K::Jalr,
        "lui" => K::Upper(UpperOp::Lui),
        "auipc" => K::Upper(UpperOp::Auipc),
        "csrrw" => K::CsrReg(CsrOp::Rw),
        "csrrs" => K::CsrReg(CsrOp::Rs),
        "csrrc" => K::CsrReg(CsrOp::Rc),
        "csrrwi" => K::CsrImm(CsrOp::Rw),
        "csrrsi" => K::CsrImm(CsrOp::Rs),
        "csrrci" => K::CsrImm(CsrOp::Rc),
        "fence" => K::Fence,
        "ecall" => K::Ecall,
        "ebreak" => K::Ebreak,
        "mret" => K::Mret,
        "nop" => K::Pseudo(PseudoOp::Nop),
        "mv" => K::Pseudo(PseudoOp::Mv),
        "li" => K::Pseudo(PseudoOp::Li),
        "la" => K::Pseudo(PseudoOp::La),
        "j" => K::Pseudo(PseudoOp::J),
        "jr" => K::Pseudo(PseudoOp::Jr),
        "ret" => K::Pseudo(PseudoOp::Ret),
        "call" => K::Pseudo(PseudoOp::Call),
        "beqz" => K::Pseudo(PseudoOp::Beqz),
        "bnez" => K::Pseudo(PseudoOp::Bnez),
        "bltz" => K::Pseudo(PseudoOp::Bltz),
        "bgez" => K::Pseudo(PseudoOp::Bgez),
        "blez" => K::Pseudo(PseudoOp::Blez),
        "bgtz" => K::Pseudo(PseudoOp::Bgtz),
        "not" => K::Pseudo(PseudoOp::Not),
        "neg" => K::Pseudo(PseudoOp::Neg),
        "seqz" => K::Pseudo(PseudoOp::Seqz),
        "snez" => K::Pseudo(PseudoOp::Snez),
        _ => return None,
    };
    Some(kind)
}

/// Resolves a register name (`x0..x31`, ABI names, `fp`), case-insensitively.
#[must_use]
pub fn resolve_register(name: &str) -> Option<Gpr> {
    let lower = name.to_ascii_lowercase();

    if let Some(number) = lower.strip_prefix('x') {
        if number.len() > 1 && number.starts_with('0') {
            return None;
        }
        return number.parse::<u8>().ok().and_then(Gpr::from_u5);
    }
    if lower == "fp" {
        return Gpr::from_u5(8);
    }
    slate_core::ABI_NAMES
        .iter()
        .position(|abi| *abi == lower)
        .and_then(|index| Gpr::from_u5(u8::try_from(index).ok()?))
}

#[cfg(test)]
mod tests {
    use super::{resolve_mnemonic, resolve_register, MnemonicKind, PseudoOp, ROp};
    use slate_core::Gpr;

    #[test]
    fn mnemonic_resolution_is_case_insensitive() {
        assert_eq!(resolve_mnemonic("ADD"), Some(MnemonicKind::RType(ROp::Add)));
        assert_eq!(resolve_mnemonic("Add"), Some(MnemonicKind::RType(ROp::Add)));
        assert_eq!(
            resolve_mnemonic("LI"),
            Some(MnemonicKind::Pseudo(PseudoOp::Li))
        );
    }

    #[test]
    fn unknown_mnemonics_do_not_resolve() {
        assert_eq!(resolve_mnemonic("mul"), None);
        assert_eq!(resolve_mnemonic("wfi"), None);
        assert_eq!(resolve_mnemonic("addw"), None);
    }

    #[test]
    fn numeric_and_abi_register_names_resolve_to_the_same_register() {
        assert_eq!(resolve_register("x10"), resolve_register("a0"));
        assert_eq!(resolve_register("X2"), resolve_register("sp"));
        assert_eq!(resolve_register("fp"), resolve_register("s0"));
        assert_eq!(resolve_register("zero"), Some(Gpr::ZERO));
        assert_eq!(resolve_register("T6"), Gpr::from_u5(31));
    }

    #[test]
    fn out_of_range_and_padded_register_numbers_are_rejected() {
        assert_eq!(resolve_register("x32"), None);
        assert_eq!(resolve_register("x01"), None);
        assert_eq!(resolve_register("y0"), None);
    }
}
