//! Pseudo-instruction expansion.
//!
//! Every pseudo parses its own operand shape and expands into one or more
//! real proto-instructions at parse time, so pass 1 sees only fixed-width
//! encodings. `li` is the one variable-width pseudo: its width is pinned
//! here (1 word for a literal that fits signed 12 bits, 2 words otherwise)
//! and pass 2 encodes whatever was pinned, keeping addresses stable across
//! passes.

use slate_core::Gpr;

use crate::mnemonic::{BranchOp, IOp, PseudoOp, ROp, UpperOp};
use crate::parser::{
    parse_expr, parse_imm, Cursor, Expr, ImmSpec, ParseError, ProtoInstruction, Reloc,
};

fn fits_i12(value: i64) -> bool {
    (-2048..=2047).contains(&value)
}

fn comma(cursor: &mut Cursor) -> Result<(), ParseError> {
    cursor.expect_punct(',', "','")
}

/// Parses the operands of `op` and expands it.
///
/// # Errors
///
/// Returns a [`ParseError`] when the operand shape does not match.
#[allow(clippy::too_many_lines)]
pub(crate) fn parse_pseudo(
    op: PseudoOp,
    cursor: &mut Cursor,
) -> Result<Vec<ProtoInstruction>, ParseError> {
    let expansion = match op {
        PseudoOp::Nop => vec![addi(Gpr::ZERO, Gpr::ZERO, Expr::Int(0))],
        PseudoOp::Mv => {
            let rd = cursor.expect_register()?;
            comma(cursor)?;
            let rs = cursor.expect_register()?;
            vec![addi(rd, rs, Expr::Int(0))]
        }
        PseudoOp::Li => {
            let rd = cursor.expect_register()?;
            comma(cursor)?;
            let imm = parse_imm(cursor)?;
            expand_li(rd, imm)
        }
        PseudoOp::La => {
            let rd = cursor.expect_register()?;
            comma(cursor)?;
            let target = parse_expr(cursor)?;
            vec![
                ProtoInstruction::Upper {
                    op: UpperOp::Auipc,
                    rd,
                    imm: ImmSpec {
                        expr: target.clone(),
                        reloc: Reloc::PcrelHi,
                    },
                },
                ProtoInstruction::IType {
                    op: IOp::Addi,
                    rd,
                    rs1: rd,
                    imm: ImmSpec {
                        expr: target,
                        reloc: Reloc::PcrelLo,
                    },
                },
            ]
        }
        PseudoOp::J => {
            let target = parse_expr(cursor)?;
            vec![ProtoInstruction::Jal {
                rd: Gpr::ZERO,
                target,
            }]
        }
        PseudoOp::Jr => {
            let rs = cursor.expect_register()?;
            vec![jalr_zero(rs)]
        }
        PseudoOp::Ret => vec![jalr_zero(Gpr::RA)],
        PseudoOp::Call => {
            let target = parse_expr(cursor)?;
            vec![
                ProtoInstruction::Upper {
                    op: UpperOp::Auipc,
                    rd: Gpr::RA,
                    imm: ImmSpec {
                        expr: target.clone(),
                        reloc: Reloc::PcrelHi,
                    },
                },
                ProtoInstruction::Jalr {
                    rd: Gpr::RA,
                    rs1: Gpr::RA,
                    offset: ImmSpec {
                        expr: target,
                        reloc: Reloc::PcrelLo,
                    },
                },
            ]
        }
        PseudoOp::Beqz => branch_zero(cursor, BranchOp::Beq, false)?,
        PseudoOp::Bnez => branch_zero(cursor, BranchOp::Bne, false)?,
        PseudoOp::Bltz => branch_zero(cursor, BranchOp::Blt, false)?,
        PseudoOp::Bgez => branch_zero(cursor, BranchOp::Bge, false)?,
        PseudoOp::Blez => branch_zero(cursor, BranchOp::Bge, true)?,
        PseudoOp::Bgtz => branch_zero(cursor, BranchOp::Blt, true)?,
        PseudoOp::Not => {
            let rd = cursor.expect_register()?;
            comma(cursor)?;
            let rs = cursor.expect_register()?;
            vec![ProtoInstruction::IType {
                op: IOp::Xori,
                rd,
                rs1: rs,
                imm: ImmSpec::plain(Expr::Int(-1)),
            }]
        }
        PseudoOp::Neg => {
            let rd = cursor.expect_register()?;
            comma(cursor)?;
            let rs = cursor.expect_register()?;
            vec![ProtoInstruction::RType {
                op: ROp::Sub,
                rd,
                rs1: Gpr::ZERO,
                rs2: rs,
            }]
        }
        PseudoOp::Seqz => {
            let rd = cursor.expect_register()?;
            comma(cursor)?;
            let rs = cursor.expect_register()?;
            vec![ProtoInstruction::IType {
                op: IOp::Sltiu,
                rd,
                rs1: rs,
                imm: ImmSpec::plain(Expr::Int(1)),
            }]
        }
        PseudoOp::Snez => {
            let rd = cursor.expect_register()?;
            comma(cursor)?;
            let rs = cursor.expect_register()?;
            vec![ProtoInstruction::RType {
                op: ROp::Sltu,
                rd,
                rs1: Gpr::ZERO,
                rs2: rs,
            }]
        }
    };
    Ok(expansion)
}

fn addi(rd: Gpr, rs1: Gpr, expr: Expr) -> ProtoInstruction {
    ProtoInstruction::IType {
        op: IOp::Addi,
        rd,
        rs1,
        imm: ImmSpec::plain(expr),
    }
}

fn jalr_zero(rs1: Gpr) -> ProtoInstruction {
    ProtoInstruction::Jalr {
        rd: Gpr::ZERO,
        rs1,
        offset: ImmSpec::plain(Expr::Int(0)),
    }
}

/// `beqz`-family shapes: `op rs, target`. When `swap` is set the register
/// goes into the rs2 slot (`blez`/`bgtz` compare `x0` against `rs`).
fn branch_zero(
    cursor: &mut Cursor,
    op: BranchOp,
    swap: bool,
) -> Result<Vec<ProtoInstruction>, ParseError> {
    let rs = cursor.expect_register()?;
    comma(cursor)?;
    let target = parse_expr(cursor)?;
    let (rs1, rs2) = if swap { (Gpr::ZERO, rs) } else { (rs, Gpr::ZERO) };
    Ok(vec![ProtoInstruction::Branch {
        op,
        rs1,
        rs2,
        target,
    }])
}

/// `li rd, imm`: one `addi` when the value is a literal fitting signed
/// 12 bits, otherwise `lui`+`addi` through the `%hi`/`%lo` split. A
/// symbolic immediate always takes the wide form because its value is not
/// known until pass 2.
fn expand_li(rd: Gpr, imm: ImmSpec) -> Vec<ProtoInstruction> {
    if imm.reloc == Reloc::None {
        if let Some(value) = imm.expr.literal() {
            if fits_i12(value) {
                return vec![addi(rd, Gpr::ZERO, imm.expr)];
            }
        }
    }
    vec![
        ProtoInstruction::Upper {
            op: UpperOp::Lui,
            rd,
            imm: ImmSpec {
                expr: imm.expr.clone(),
                reloc: Reloc::Hi,
            },
        },
        ProtoInstruction::IType {
            op: IOp::Addi,
            rd,
            rs1: rd,
            imm: ImmSpec {
                expr: imm.expr,
                reloc: Reloc::Lo,
            },
        },
    ]
}
