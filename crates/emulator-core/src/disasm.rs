//! Instruction disassembly.
//!
//! Converts raw instruction words back into assembly text. Branch and jump
//! targets are printed as absolute addresses so a disassembled listing
//! re-assembles to the same image when placed at the same origin.

use crate::csr::csr_name;
use crate::decoder::{decode, Instruction};
use crate::state::Gpr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single disassembled instruction row.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisasmRow {
    /// Address of the instruction.
    pub addr: u32,
    /// Raw 32-bit encoding.
    pub word: u32,
    /// Decoded assembly text, or a `.word` directive for illegal encodings.
    pub text: String,
}

/// Disassembles one instruction word located at `addr`.
#[must_use]
pub fn disassemble_word(addr: u32, word: u32) -> DisasmRow {
    let text = decode(word).map_or_else(
        || format!(".word {word:#010x}"),
        |instruction| format_instruction(addr, instruction),
    );
    DisasmRow { addr, word, text }
}

/// Formats a disassembly row the way listings print it.
#[must_use]
pub fn format_row(row: &DisasmRow) -> String {
    format!("{:08x}: {:08x}  {}", row.addr, row.word, row.text)
}

fn r(reg: Gpr) -> &'static str {
    reg.abi_name()
}

fn target(addr: u32, offset: i32) -> String {
    format!("{:#x}", addr.wrapping_add(offset as u32))
}

fn csr(addr: u16) -> String {
    csr_name(addr).map_or_else(|| format!("{addr:#05x}"), str::to_owned)
}

/// Formats a decoded instruction located at `addr` as assembly text.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn format_instruction(addr: u32, instruction: Instruction) -> String {
    use Instruction as I;
    match instruction {
        I::Lui { rd, imm } => format!("lui {}, {:#x}", r(rd), imm >> 12),
        I::Auipc { rd, imm } => format!("auipc {}, {:#x}", r(rd), imm >> 12),
        I::Jal { rd, offset } => format!("jal {}, {}", r(rd), target(addr, offset)),
        I::Jalr { rd, rs1, offset } => format!("jalr {}, {}, {}", r(rd), r(rs1), offset),
        I::Beq { rs1, rs2, offset } => {
            format!("beq {}, {}, {}", r(rs1), r(rs2), target(addr, offset))
        }
        I::Bne { rs1, rs2, offset } => {
            format!("bne {}, {}, {}", r(rs1), r(rs2), target(addr, offset))
        }
        I::Blt { rs1, rs2, offset } => {
            format!("blt {}, {}, {}", r(rs1), r(rs2), target(addr, offset))
        }
        I::Bge { rs1, rs2, offset } => {
            format!("bge {}, {}, {}", r(rs1), r(rs2), target(addr, offset))
        }
        I::Bltu { rs1, rs2, offset } => {
            format!("bltu {}, {}, {}", r(rs1), r(rs2), target(addr, offset))
        }
        I::Bgeu { rs1, rs2, offset } => {
            format!("bgeu {}, {}, {}", r(rs1), r(rs2), target(addr, offset))
        }
        I::Lb { rd, rs1, offset } => format!("lb {}, {}({})", r(rd), offset, r(rs1)),
        I::Lh { rd, rs1, offset } => format!("lh {}, {}({})", r(rd), offset, r(rs1)),
        I::Lw { rd, rs1, offset } => format!("lw {}, {}({})", r(rd), offset, r(rs1)),
        I::Lbu { rd, rs1, offset } => format!("lbu {}, {}({})", r(rd), offset, r(rs1)),
        I::Lhu { rd, rs1, offset } => format!("lhu {}, {}({})", r(rd), offset, r(rs1)),
        I::Sb { rs1, rs2, offset } => format!("sb {}, {}({})", r(rs2), offset, r(rs1)),
        I::Sh { rs1, rs2, offset } => format!("sh {}, {}({})", r(rs2), offset, r(rs1)),
        I::Sw { rs1, rs2, offset } => format!("sw {}, {}({})", r(rs2), offset, r(rs1)),
        I::Addi { rd, rs1, imm } => format!("addi {}, {}, {}", r(rd), r(rs1), imm),
        I::Slti { rd, rs1, imm } => format!("slti {}, {}, {}", r(rd), r(rs1), imm),
        I::Sltiu { rd, rs1, imm } => format!("sltiu {}, {}, {}", r(rd), r(rs1), imm),
        I::Xori { rd, rs1, imm } => format!("xori {}, {}, {}", r(rd), r(rs1), imm),
        I::Ori { rd, rs1, imm } => format!("ori {}, {}, {}", r(rd), r(rs1), imm),
        I::Andi { rd, rs1, imm } => format!("andi {}, {}, {}", r(rd), r(rs1), imm),
        I::Slli { rd, rs1, shamt } => format!("slli {}, {}, {}", r(rd), r(rs1), shamt),
        I::Srli { rd, rs1, shamt } => format!("srli {}, {}, {}", r(rd), r(rs1), shamt),
        I::Srai { rd, rs1, shamt } => format!("srai {}, {}, {}", r(rd), r(rs1), shamt),
        I::Add { rd, rs1, rs2 } => format!("add {}, {}, {}", r(rd), r(rs1), r(rs2)),
        I::Sub { rd, rs1, rs2 } => format!("sub {}, {}, {}", r(rd), r(rs1), r(rs2)),
        I::Sll { rd, rs1, rs2 } => format!("sll {}, {}, {}", r(rd), r(rs1), r(rs2)),
        I::Slt { rd, rs1, rs2 } => format!("slt {}, {}, {}", r(rd), r(rs1), r(rs2)),
        I::Sltu { rd, rs1, rs2 } => format!("sltu {}, {}, {}", r(rd), r(rs1), r(rs2)),
        I::Xor { rd, rs1, rs2 } => format!("xor {}, {}, {}", r(rd), r(rs1), r(rs2)),
        I::Srl { rd, rs1, rs2 } => format!("srl {}, {}, {}", r(rd), r(rs1), r(rs2)),
        I::Sra { rd, rs1, rs2 } => format!("sra {}, {}, {}", r(rd), r(rs1), r(rs2)),
        I::Or { rd, rs1, rs2 } => format!("or {}, {}, {}", r(rd), r(rs1), r(rs2)),
        I::And { rd, rs1, rs2 } => format!("and {}, {}, {}", r(rd), r(rs1), r(rs2)),
        I::Fence => "fence".to_owned(),
        I::Ecall => "ecall".to_owned(),
        I::Ebreak => "ebreak".to_owned(),
        I::Mret => "mret".to_owned(),
        I::Csrrw { rd, rs1, csr: c } => format!("csrrw {}, {}, {}", r(rd), csr(c), r(rs1)),
        I::Csrrs { rd, rs1, csr: c } => format!("csrrs {}, {}, {}", r(rd), csr(c), r(rs1)),
        I::Csrrc { rd, rs1, csr: c } => format!("csrrc {}, {}, {}", r(rd), csr(c), r(rs1)),
        I::Csrrwi { rd, uimm, csr: c } => format!("csrrwi {}, {}, {}", r(rd), csr(c), uimm),
        I::Csrrsi { rd, uimm, csr: c } => format!("csrrsi {}, {}, {}", r(rd), csr(c), uimm),
        I::Csrrci { rd, uimm, csr: c } => format!("csrrci {}, {}, {}", r(rd), csr(c), uimm),
    }
}

#[cfg(test)]
mod tests {
    use super::{disassemble_word, format_row};

    #[test]
    fn alu_and_load_instructions_format_with_abi_names() {
        assert_eq!(disassemble_word(0, 0xFFF5_0513).text, "addi a0, a0, -1");
        assert_eq!(disassemble_word(0, 0x00A1_2623).text, "sw a0, 12(sp)");
    }

    #[test]
    fn branch_targets_are_absolute_addresses() {
        // beq x0, x0, -8 located at 0x100 targets 0xf8
        assert_eq!(disassemble_word(0x100, 0xFE00_0CE3).text, "beq zero, zero, 0xf8");
    }

    #[test]
    fn csr_addresses_print_by_name_when_known() {
        assert_eq!(
            disassemble_word(0, 0x3405_9573).text,
            "csrrw a0, mscratch, a1"
        );
    }

    #[test]
    fn illegal_words_fall_back_to_word_directives() {
        assert_eq!(disassemble_word(0, 0x0000_0000).text, ".word 0x00000000");
    }

    #[test]
    fn rows_format_with_address_and_raw_word() {
        let row = disassemble_word(0x80, 0x0000_0013);
        assert_eq!(format_row(&row), "00000080: 00000013  addi zero, zero, 0");
    }
}
