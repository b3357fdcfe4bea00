//! Instruction and directive encoding (pass 2).
//!
//! Proto-instructions become canonical 32-bit RV32I/Zicsr words; data
//! directives become little-endian bytes. Immediates are range-checked
//! here, with `%hi`/`%lo` and `%pcrel_hi`/`%pcrel_lo` resolved so the
//! high/low pairs reconstruct the original value exactly.

use crate::mnemonic::{BranchOp, CsrOp, IOp, LoadOp, ROp, ShiftOp, StoreOp, UpperOp};
use crate::parser::{Directive, Expr, ImmSpec, ProtoInstruction, Reloc};
use crate::symbols::SymbolTable;

const OPCODE_LOAD: u32 = 0x03;
const OPCODE_OP_IMM: u32 = 0x13;
const OPCODE_AUIPC: u32 = 0x17;
const OPCODE_STORE: u32 = 0x23;
const OPCODE_OP: u32 = 0x33;
const OPCODE_LUI: u32 = 0x37;
const OPCODE_BRANCH: u32 = 0x63;
const OPCODE_JALR: u32 = 0x67;
const OPCODE_JAL: u32 = 0x6F;
const OPCODE_MISC_MEM: u32 = 0x0F;
const OPCODE_SYSTEM: u32 = 0x73;

const ECALL_WORD: u32 = 0x0000_0073;
const EBREAK_WORD: u32 = 0x0010_0073;
const MRET_WORD: u32 = 0x3020_0073;
const FENCE_WORD: u32 = 0x0000_000F;

/// Encoding error with its source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeError {
    /// 1-based source line.
    pub line: u32,
    /// Error detail.
    pub kind: EncodeErrorKind,
}

/// Classification of encoding errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeErrorKind {
    /// A symbol did not resolve in pass 2.
    UndefinedSymbol(String),
    /// Signed 12-bit immediate out of range.
    ImmediateOutOfRange(i64),
    /// Shift amount outside `0..=31`.
    ShamtOutOfRange(i64),
    /// CSR immediate outside `0..=31`.
    UimmOutOfRange(i64),
    /// Branch target further than ±4 KiB.
    BranchOutOfRange(i64),
    /// Jump target further than ±1 MiB.
    JumpOutOfRange(i64),
    /// Branch or jump target at an odd offset.
    OddOffset(i64),
}

impl std::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::fmt::Display for EncodeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UndefinedSymbol(name) => write!(f, "undefined symbol '{name}'"),
            Self::ImmediateOutOfRange(v) => {
                write!(f, "immediate {v} does not fit in signed 12 bits")
            }
            Self::ShamtOutOfRange(v) => write!(f, "shift amount {v} outside 0..=31"),
            Self::UimmOutOfRange(v) => write!(f, "CSR immediate {v} outside 0..=31"),
            Self::BranchOutOfRange(v) => write!(f, "branch offset {v} out of range"),
            Self::JumpOutOfRange(v) => write!(f, "jump offset {v} out of range"),
            Self::OddOffset(v) => write!(f, "branch or jump offset {v} is odd"),
        }
    }
}

impl std::error::Error for EncodeError {}

fn lookup_in<'a>(symbols: &'a SymbolTable) -> impl Fn(&str) -> Option<i64> + 'a {
    |name| symbols.get(name).map(|s| s.value)
}

fn eval(
    expr: &Expr,
    symbols: &SymbolTable,
    addr: u32,
    line: u32,
) -> Result<i64, EncodeError> {
    expr.eval(&lookup_in(symbols), addr).map_err(|symbol| EncodeError {
        line,
        kind: EncodeErrorKind::UndefinedSymbol(symbol),
    })
}

/// Sign-extends the low 12 bits of a value.
const fn low12(value: i64) -> i64 {
    ((value & 0xFFF) ^ 0x800) - 0x800
}

/// High 20 bits adjusted so `hi20 << 12` plus the sign-extended low part
/// reconstructs `value`.
const fn high20(value: i64) -> u32 {
    (((value.wrapping_add(0x800)) >> 12) & 0xF_FFFF) as u32
}

/// Resolves an immediate spec to the value that goes into the encoding:
/// U-type specs yield the 20-bit field, everything else a signed value.
fn resolve_imm(
    spec: &ImmSpec,
    symbols: &SymbolTable,
    addr: u32,
    line: u32,
) -> Result<i64, EncodeError> {
    let value = eval(&spec.expr, symbols, addr, line)?;
    let resolved = match spec.reloc {
        Reloc::None => value,
        Reloc::Hi => i64::from(high20(value)),
        Reloc::Lo => low12(value),
        Reloc::PcrelHi => i64::from(high20(value - i64::from(addr))),
        // Pairs with the auipc one instruction back.
        Reloc::PcrelLo => low12(value - i64::from(addr) + 4),
    };
    Ok(resolved)
}

const fn fits_i12(value: i64) -> bool {
    value >= -2048 && value <= 2047
}

const fn r_funct(op: ROp) -> (u32, u32) {
    match op {
        ROp::Add => (0x00, 0x0),
        ROp::Sub => (0x20, 0x0),
        ROp::Sll => (0x00, 0x1),
        ROp::Slt => (0x00, 0x2),
        ROp::Sltu => (0x00, 0x3),
        ROp::Xor => (0x00, 0x4),
        ROp::Srl => (0x00, 0x5),
        ROp::Sra => (0x20, 0x5),
        ROp::Or => (0x00, 0x6),
        ROp::And => (0x00, 0x7),
    }
}

const fn i_funct3(op: IOp) -> u32 {
    match op {
        IOp::Addi => 0x0,
        IOp::Slti => 0x2,
        IOp::Sltiu => 0x3,
        IOp::Xori => 0x4,
        IOp::Ori => 0x6,
        IOp::Andi => 0x7,
    }
}

const fn shift_funct(op: ShiftOp) -> (u32, u32) {
    match op {
        ShiftOp::Slli => (0x00, 0x1),
        ShiftOp::Srli => (0x00, 0x5),
        ShiftOp::Srai => (0x20, 0x5),
    }
}

const fn load_funct3(op: LoadOp) -> u32 {
    match op {
        LoadOp::Lb => 0x0,
        LoadOp::Lh => 0x1,
        LoadOp::Lw => 0x2,
        LoadOp::Lbu => 0x4,
        LoadOp::Lhu => 0x5,
    }
}

const fn store_funct3(op: StoreOp) -> u32 {
    match op {
        StoreOp::Sb => 0x0,
        StoreOp::Sh => 0x1,
        StoreOp::Sw => 0x2,
    }
}

const fn branch_funct3(op: BranchOp) -> u32 {
    match op {
        BranchOp::Beq => 0x0,
        BranchOp::Bne => 0x1,
        BranchOp::Blt => 0x4,
        BranchOp::Bge => 0x5,
        BranchOp::Bltu => 0x6,
        BranchOp::Bgeu => 0x7,
    }
}

const fn csr_funct3(op: CsrOp, immediate_form: bool) -> u32 {
    let base = match op {
        CsrOp::Rw => 0x1,
        CsrOp::Rs => 0x2,
        CsrOp::Rc => 0x3,
    };
    if immediate_form {
        base + 4
    } else {
        base
    }
}

const fn encode_r(opcode: u32, funct3: u32, funct7: u32, rd: u32, rs1: u32, rs2: u32) -> u32 {
    funct7 << 25 | rs2 << 20 | rs1 << 15 | funct3 << 12 | rd << 7 | opcode
}

const fn encode_i(opcode: u32, funct3: u32, rd: u32, rs1: u32, imm: u32) -> u32 {
    (imm & 0xFFF) << 20 | rs1 << 15 | funct3 << 12 | rd << 7 | opcode
}

const fn encode_s(opcode: u32, funct3: u32, rs1: u32, rs2: u32, imm: u32) -> u32 {
    (imm >> 5 & 0x7F) << 25 | rs2 << 20 | rs1 << 15 | funct3 << 12 | (imm & 0x1F) << 7 | opcode
}

const fn encode_b(opcode: u32, funct3: u32, rs1: u32, rs2: u32, imm: u32) -> u32 {
    (imm >> 12 & 0x1) << 31
        | (imm >> 5 & 0x3F) << 25
        | rs2 << 20
        | rs1 << 15
        | funct3 << 12
        | (imm >> 1 & 0xF) << 8
        | (imm >> 11 & 0x1) << 7
        | opcode
}

const fn encode_u(opcode: u32, rd: u32, imm20: u32) -> u32 {
    imm20 << 12 | rd << 7 | opcode
}

const fn encode_j(opcode: u32, rd: u32, imm: u32) -> u32 {
    (imm >> 20 & 0x1) << 31
        | (imm >> 1 & 0x3FF) << 21
        | (imm >> 11 & 0x1) << 20
        | (imm >> 12 & 0xFF) << 12
        | rd << 7
        | opcode
}

/// Encodes one proto-instruction located at `addr`.
///
/// # Errors
///
/// Returns an [`EncodeError`] for unresolved symbols and out-of-range
/// immediates or offsets.
#[allow(clippy::too_many_lines, clippy::cast_sign_loss, clippy::cast_possible_truncation)]
pub fn encode_proto(
    proto: &ProtoInstruction,
    addr: u32,
    symbols: &SymbolTable,
    line: u32,
) -> Result<u32, EncodeError> {
    let err = |kind| EncodeError { line, kind };

    let word = match proto {
        ProtoInstruction::RType { op, rd, rs1, rs2 } => {
            let (funct7, funct3) = r_funct(*op);
            encode_r(
                OPCODE_OP,
                funct3,
                funct7,
                rd.num().into(),
                rs1.num().into(),
                rs2.num().into(),
            )
        }
        ProtoInstruction::IType { op, rd, rs1, imm } => {
            let value = resolve_imm(imm, symbols, addr, line)?;
            if imm.reloc == Reloc::None && !fits_i12(value) {
                return Err(err(EncodeErrorKind::ImmediateOutOfRange(value)));
            }
            encode_i(
                OPCODE_OP_IMM,
                i_funct3(*op),
                rd.num().into(),
                rs1.num().into(),
                value as u32,
            )
        }
        ProtoInstruction::Shift { op, rd, rs1, shamt } => {
            let value = eval(shamt, symbols, addr, line)?;
            if !(0..=31).contains(&value) {
                return Err(err(EncodeErrorKind::ShamtOutOfRange(value)));
            }
            let (funct7, funct3) = shift_funct(*op);
            encode_i(
                OPCODE_OP_IMM,
                funct3,
                rd.num().into(),
                rs1.num().into(),
                funct7 << 5 | value as u32,
            )
        }
        ProtoInstruction::Load {
            op,
            rd,
            base,
            offset,
        } => {
            let value = resolve_imm(offset, symbols, addr, line)?;
            if offset.reloc == Reloc::None && !fits_i12(value) {
                return Err(err(EncodeErrorKind::ImmediateOutOfRange(value)));
            }
            encode_i(
                OPCODE_LOAD,
                load_funct3(*op),
                rd.num().into(),
                base.num().into(),
                value as u32,
            )
        }
        ProtoInstruction::Store {
            op,
            rs2,
            base,
            offset,
        } => {
            let value = resolve_imm(offset, symbols, addr, line)?;
            if offset.reloc == Reloc::None && !fits_i12(value) {
                return Err(err(EncodeErrorKind::ImmediateOutOfRange(value)));
            }
            encode_s(
                OPCODE_STORE,
                store_funct3(*op),
                base.num().into(),
                rs2.num().into(),
                value as u32,
            )
        }
        ProtoInstruction::Branch {
            op,
            rs1,
            rs2,
            target,
        } => {
            let value = eval(target, symbols, addr, line)?;
            let offset = value - i64::from(addr);
            if offset % 2 != 0 {
                return Err(err(EncodeErrorKind::OddOffset(offset)));
            }
            if !(-4096..=4094).contains(&offset) {
                return Err(err(EncodeErrorKind::BranchOutOfRange(offset)));
            }
            encode_b(
                OPCODE_BRANCH,
                branch_funct3(*op),
                rs1.num().into(),
                rs2.num().into(),
                offset as u32,
            )
        }
        ProtoInstruction::Jal { rd, target } => {
            let value = eval(target, symbols, addr, line)?;
            let offset = value - i64::from(addr);
            if offset % 2 != 0 {
                return Err(err(EncodeErrorKind::OddOffset(offset)));
            }
            if !(-1_048_576..=1_048_574).contains(&offset) {
                return Err(err(EncodeErrorKind::JumpOutOfRange(offset)));
            }
            encode_j(OPCODE_JAL, rd.num().into(), offset as u32)
        }
        ProtoInstruction::Jalr { rd, rs1, offset } => {
            let value = resolve_imm(offset, symbols, addr, line)?;
            if offset.reloc == Reloc::None && !fits_i12(value) {
                return Err(err(EncodeErrorKind::ImmediateOutOfRange(value)));
            }
            encode_i(
                OPCODE_JALR,
                0x0,
                rd.num().into(),
                rs1.num().into(),
                value as u32,
            )
        }
        ProtoInstruction::Upper { op, rd, imm } => {
            let opcode = match op {
                UpperOp::Lui => OPCODE_LUI,
                UpperOp::Auipc => OPCODE_AUIPC,
            };
            // A plain operand is the 20-bit field itself, truncated the
            // same way the disassembler prints it.
            let field = resolve_imm(imm, symbols, addr, line)? as u32 & 0xF_FFFF;
            encode_u(opcode, rd.num().into(), field)
        }
        ProtoInstruction::CsrReg { op, rd, csr, rs1 } => encode_i(
            OPCODE_SYSTEM,
            csr_funct3(*op, false),
            rd.num().into(),
            rs1.num().into(),
            u32::from(*csr),
        ),
        ProtoInstruction::CsrImm { op, rd, csr, uimm } => {
            let value = eval(uimm, symbols, addr, line)?;
            if !(0..=31).contains(&value) {
                return Err(err(EncodeErrorKind::UimmOutOfRange(value)));
            }
            encode_i(
                OPCODE_SYSTEM,
                csr_funct3(*op, true),
                rd.num().into(),
                value as u32,
                u32::from(*csr),
            )
        }
        ProtoInstruction::Fence => FENCE_WORD,
        ProtoInstruction::Ecall => ECALL_WORD,
        ProtoInstruction::Ebreak => EBREAK_WORD,
        ProtoInstruction::Mret => MRET_WORD,
    };
    Ok(word)
}

/// Encodes a data directive's bytes. `size` is the pass-1 size, which
/// fixes the padding for `.zero` and `.align`.
///
/// # Errors
///
/// Returns an [`EncodeError`] when a value expression does not resolve.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn encode_directive(
    directive: &Directive,
    addr: u32,
    size: u32,
    symbols: &SymbolTable,
    line: u32,
) -> Result<Vec<u8>, EncodeError> {
    let mut bytes = Vec::with_capacity(size as usize);
    match directive {
        Directive::Byte(items) => {
            for expr in items {
                let value = eval(expr, symbols, addr, line)?;
                bytes.push(value as u8);
            }
        }
        Directive::Half(items) => {
            for expr in items {
                let value = eval(expr, symbols, addr, line)?;
                bytes.extend_from_slice(&(value as u16).to_le_bytes());
            }
        }
        Directive::Word(items) => {
            for expr in items {
                let value = eval(expr, symbols, addr, line)?;
                bytes.extend_from_slice(&(value as u32).to_le_bytes());
            }
        }
        Directive::Ascii(s) => bytes.extend_from_slice(s.as_bytes()),
        Directive::Asciz(s) => {
            bytes.extend_from_slice(s.as_bytes());
            bytes.push(0);
        }
        Directive::Zero(_) | Directive::Align(_) => {
            bytes.resize(size as usize, 0);
        }
        Directive::Equ { .. } | Directive::Globl(_) => {}
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::{encode_proto, EncodeErrorKind};
    use crate::parser::{parse_line, ProtoInstruction, Stmt};
    use crate::symbols::{Symbol, SymbolKind, SymbolTable};
    use slate_core::{decode, disassemble_word, Instruction};

    fn protos(text: &str) -> Vec<ProtoInstruction> {
        match parse_line(text, 1).unwrap().stmt {
            Some(Stmt::Instruction(protos)) => protos,
            other => panic!("expected instruction, got {other:?}"),
        }
    }

    fn encode_one(text: &str, addr: u32) -> u32 {
        let protos = protos(text);
        assert_eq!(protos.len(), 1, "expected a single real instruction");
        encode_proto(&protos[0], addr, &SymbolTable::new(), 1).unwrap()
    }

    fn with_symbol(name: &str, value: i64) -> SymbolTable {
        let mut symbols = SymbolTable::new();
        symbols.insert(
            name.to_owned(),
            Symbol {
                value,
                line: 1,
                kind: SymbolKind::Label,
            },
        );
        symbols
    }

    #[test]
    fn canonical_words_match_the_reference_encodings() {
        assert_eq!(encode_one("addi a0, zero, 42", 0), 0x02A0_0513);
        assert_eq!(encode_one("add a0, a1, a2", 0), 0x00C5_8533);
        assert_eq!(encode_one("sw a0, 12(sp)", 0), 0x00A1_2623);
        assert_eq!(encode_one("srai a0, a0, 3", 0), 0x4035_5513);
        assert_eq!(encode_one("ecall", 0), 0x0000_0073);
        assert_eq!(encode_one("ebreak", 0), 0x0010_0073);
        assert_eq!(encode_one("mret", 0), 0x3020_0073);
        assert_eq!(encode_one("csrrw a0, mscratch, a1", 0), 0x3405_9573);
    }

    #[test]
    fn branch_encoding_round_trips_through_the_decoder() {
        let symbols = with_symbol("loop", 0xF8);
        let protos = protos("bne t0, t1, loop");
        let word = encode_proto(&protos[0], 0x100, &symbols, 1).unwrap();
        let Some(Instruction::Bne { offset, .. }) = decode(word) else {
            panic!("encoded branch must decode");
        };
        assert_eq!(offset, -8);
    }

    #[test]
    fn jal_encoding_round_trips_through_the_decoder() {
        let symbols = with_symbol("fn", 0x2000);
        let protos = protos("jal ra, fn");
        let word = encode_proto(&protos[0], 0x1000, &symbols, 1).unwrap();
        let Some(Instruction::Jal { offset, .. }) = decode(word) else {
            panic!("encoded jal must decode");
        };
        assert_eq!(offset, 0x1000);
    }

    #[test]
    fn hi_lo_pair_reconstructs_any_constant() {
        for constant in [
            0_i64,
            1,
            0x7FF,
            0x800,
            0xFFF,
            0x1000,
            0x1234_5678,
            0x7FFF_FFFF,
            0x8000_0000,
            0xDEAD_BEEF,
            0xFFFF_F800,
            0xFFFF_FFFF,
        ] {
            let symbols = with_symbol("k", constant);
            let pair = protos("li a0, k");
            assert_eq!(pair.len(), 2);
            let lui = encode_proto(&pair[0], 0, &symbols, 1).unwrap();
            let addi = encode_proto(&pair[1], 4, &symbols, 1).unwrap();

            let Some(Instruction::Lui { imm, .. }) = decode(lui) else {
                panic!("expected lui");
            };
            let Some(Instruction::Addi { imm: low, .. }) = decode(addi) else {
                panic!("expected addi");
            };
            let reconstructed = imm.wrapping_add(low as u32);
            assert_eq!(
                u64::from(reconstructed),
                constant as u64 & 0xFFFF_FFFF,
                "hi/lo split failed for {constant:#x}"
            );
        }
    }

    #[test]
    fn pcrel_pair_reconstructs_the_target_address() {
        for (pc, target) in [
            (0x0_u32, 0x800_i64),
            (0x1000, 0x800),
            (0x1000, 0x1F_F800),
            (0x8000, 0x24),
            (0x10_0000, 0xF_FFFC),
        ] {
            let symbols = with_symbol("sym", target);
            let pair = protos("la a0, sym");
            let auipc = encode_proto(&pair[0], pc, &symbols, 1).unwrap();
            let addi = encode_proto(&pair[1], pc + 4, &symbols, 1).unwrap();

            let Some(Instruction::Auipc { imm, .. }) = decode(auipc) else {
                panic!("expected auipc");
            };
            let Some(Instruction::Addi { imm: low, .. }) = decode(addi) else {
                panic!("expected addi");
            };
            let reconstructed = pc.wrapping_add(imm).wrapping_add(low as u32);
            assert_eq!(
                i64::from(reconstructed),
                target,
                "pcrel split failed for pc={pc:#x} target={target:#x}"
            );
        }
    }

    #[test]
    fn out_of_range_immediates_are_rejected() {
        let protos_list = protos("addi a0, a0, 2048");
        let error = encode_proto(&protos_list[0], 0, &SymbolTable::new(), 1).unwrap_err();
        assert_eq!(error.kind, EncodeErrorKind::ImmediateOutOfRange(2048));

        let protos_list = protos("slli a0, a0, 32");
        let error = encode_proto(&protos_list[0], 0, &SymbolTable::new(), 1).unwrap_err();
        assert_eq!(error.kind, EncodeErrorKind::ShamtOutOfRange(32));

        let protos_list = protos("csrrwi a0, mscratch, 32");
        let error = encode_proto(&protos_list[0], 0, &SymbolTable::new(), 1).unwrap_err();
        assert_eq!(error.kind, EncodeErrorKind::UimmOutOfRange(32));
    }

    #[test]
    fn branch_range_and_parity_are_enforced() {
        let symbols = with_symbol("far", 0x2000);
        let protos_list = protos("beq zero, zero, far");
        let error = encode_proto(&protos_list[0], 0, &symbols, 1).unwrap_err();
        assert_eq!(error.kind, EncodeErrorKind::BranchOutOfRange(0x2000));

        let symbols = with_symbol("odd", 0x101);
        let protos_list = protos("beq zero, zero, odd");
        let error = encode_proto(&protos_list[0], 0x100, &symbols, 1).unwrap_err();
        assert_eq!(error.kind, EncodeErrorKind::OddOffset(1));
    }

    #[test]
    fn undefined_symbols_surface_with_their_name() {
        let protos_list = protos("j nowhere");
        let error = encode_proto(&protos_list[0], 0, &SymbolTable::new(), 1).unwrap_err();
        assert_eq!(
            error.kind,
            EncodeErrorKind::UndefinedSymbol("nowhere".to_owned())
        );
    }

    #[test]
    fn lui_plain_operand_is_the_20_bit_field() {
        let word = encode_one("lui a0, 0x12345", 0);
        assert_eq!(disassemble_word(0, word).text, "lui a0, 0x12345");
    }
}
