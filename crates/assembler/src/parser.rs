//! Assembly source line parser for instructions, labels, and directives.
//!
//! Each line is zero or more labels followed by at most one directive or
//! instruction. Parsing resolves mnemonics and register names and expands
//! pseudo-instructions, producing proto-instructions: real instructions
//! whose immediates may still reference unresolved symbols.

use slate_core::{csr_address, Gpr};

use crate::lexer::{tokenize, LexError, RelocFn, Token};
use crate::mnemonic::{
    resolve_mnemonic, resolve_register, BranchOp, CsrOp, IOp, LoadOp, MnemonicKind, ROp, ShiftOp,
    StoreOp, UpperOp,
};
use crate::pseudo;

/// A constant expression over integers, symbols, and `+`/`-`.
///
/// `.` names the current location counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Integer literal.
    Int(i64),
    /// Symbol reference, resolved against the symbol table.
    Sym(String),
    /// The current location counter.
    Dot,
    /// Unary negation.
    Neg(Box<Expr>),
    /// Addition.
    Add(Box<Expr>, Box<Expr>),
    /// Subtraction.
    Sub(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Folds the expression if it contains no symbols.
    #[must_use]
    pub fn literal(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Sym(_) | Self::Dot => None,
            Self::Neg(inner) => inner.literal().map(i64::wrapping_neg),
            Self::Add(lhs, rhs) => Some(lhs.literal()?.wrapping_add(rhs.literal()?)),
            Self::Sub(lhs, rhs) => Some(lhs.literal()?.wrapping_sub(rhs.literal()?)),
        }
    }

    /// Evaluates the expression.
    ///
    /// # Errors
    ///
    /// Returns the name of the first symbol `lookup` cannot resolve.
    pub fn eval<F>(&self, lookup: &F, dot: u32) -> Result<i64, String>
    where
        F: Fn(&str) -> Option<i64>,
    {
        match self {
            Self::Int(v) => Ok(*v),
            Self::Sym(name) => lookup(name).ok_or_else(|| name.clone()),
            Self::Dot => Ok(i64::from(dot)),
            Self::Neg(inner) => Ok(inner.eval(lookup, dot)?.wrapping_neg()),
            Self::Add(lhs, rhs) => {
                Ok(lhs.eval(lookup, dot)?.wrapping_add(rhs.eval(lookup, dot)?))
            }
            Self::Sub(lhs, rhs) => {
                Ok(lhs.eval(lookup, dot)?.wrapping_sub(rhs.eval(lookup, dot)?))
            }
        }
    }
}

/// Relocation applied to an immediate expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reloc {
    /// Use the evaluated value directly.
    None,
    /// `%hi`: bits 31:12 with carry adjustment.
    Hi,
    /// `%lo`: sign-extended bits 11:0.
    Lo,
    /// `%pcrel_hi`: PC-relative high part for `auipc`.
    PcrelHi,
    /// `%pcrel_lo`: PC-relative low part pairing with the `auipc` one
    /// instruction earlier.
    PcrelLo,
}

impl From<RelocFn> for Reloc {
    fn from(value: RelocFn) -> Self {
        match value {
            RelocFn::Hi => Self::Hi,
            RelocFn::Lo => Self::Lo,
            RelocFn::PcrelHi => Self::PcrelHi,
            RelocFn::PcrelLo => Self::PcrelLo,
        }
    }
}

/// An immediate operand: an expression plus the relocation to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImmSpec {
    /// The underlying expression.
    pub expr: Expr,
    /// Relocation applied after evaluation.
    pub reloc: Reloc,
}

impl ImmSpec {
    /// A plain immediate with no relocation.
    #[must_use]
    pub const fn plain(expr: Expr) -> Self {
        Self {
            expr,
            reloc: Reloc::None,
        }
    }
}

/// A real instruction awaiting pass-2 immediate resolution and encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum ProtoInstruction {
    RType { op: ROp, rd: Gpr, rs1: Gpr, rs2: Gpr },
    IType { op: IOp, rd: Gpr, rs1: Gpr, imm: ImmSpec },
    Shift { op: ShiftOp, rd: Gpr, rs1: Gpr, shamt: Expr },
    Load { op: LoadOp, rd: Gpr, base: Gpr, offset: ImmSpec },
    Store { op: StoreOp, rs2: Gpr, base: Gpr, offset: ImmSpec },
    Branch { op: BranchOp, rs1: Gpr, rs2: Gpr, target: Expr },
    Jal { rd: Gpr, target: Expr },
    Jalr { rd: Gpr, rs1: Gpr, offset: ImmSpec },
    Upper { op: UpperOp, rd: Gpr, imm: ImmSpec },
    CsrReg { op: CsrOp, rd: Gpr, csr: u16, rs1: Gpr },
    CsrImm { op: CsrOp, rd: Gpr, csr: u16, uimm: Expr },
    Fence,
    Ecall,
    Ebreak,
    Mret,
}

/// A parsed data or symbol directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `.byte v, ...`
    Byte(Vec<Expr>),
    /// `.half v, ...` (2-aligned)
    Half(Vec<Expr>),
    /// `.word v, ...` (4-aligned)
    Word(Vec<Expr>),
    /// `.ascii "s"`
    Ascii(String),
    /// `.asciz "s"` / `.string "s"`
    Asciz(String),
    /// `.zero n`
    Zero(Expr),
    /// `.align n` (power-of-two exponent)
    Align(Expr),
    /// `.equ name, expr`
    Equ {
        /// Symbol being defined.
        name: String,
        /// Its value.
        expr: Expr,
    },
    /// `.globl name` (recorded, otherwise unused)
    Globl(String),
}

/// The statement part of a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    /// A directive.
    Directive(Directive),
    /// One instruction, already expanded to its real encodings.
    Instruction(Vec<ProtoInstruction>),
}

/// A single parsed source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// 1-based source line number.
    pub number: u32,
    /// Labels bound at this line's address, in order of appearance.
    pub labels: Vec<String>,
    /// The directive or instruction, if any.
    pub stmt: Option<Stmt>,
}

/// Parse error with its source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// 1-based source line number.
    pub line: u32,
    /// Error detail.
    pub kind: ParseErrorKind,
}

/// Classification of parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Tokenization failed.
    Lex(LexError),
    /// Unknown or misspelled mnemonic.
    UnknownMnemonic(String),
    /// Unknown directive name.
    UnknownDirective(String),
    /// Not a register name.
    BadRegister(String),
    /// Not an implemented CSR name or a 12-bit CSR number.
    BadCsr(String),
    /// A specific token was required.
    Expected(&'static str),
    /// Extra tokens after a complete statement.
    TrailingTokens,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lex(e) => write!(f, "{e}"),
            Self::UnknownMnemonic(m) => write!(f, "unknown mnemonic '{m}'"),
            Self::UnknownDirective(d) => write!(f, "unknown directive '{d}'"),
            Self::BadRegister(r) => write!(f, "invalid register name '{r}'"),
            Self::BadCsr(c) => write!(f, "unknown CSR '{c}'"),
            Self::Expected(what) => write!(f, "expected {what}"),
            Self::TrailingTokens => write!(f, "unexpected tokens after statement"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Token cursor over one line.
pub(crate) struct Cursor {
    tokens: Vec<Token>,
    pos: usize,
    line: u32,
}

impl Cursor {
    fn new(tokens: Vec<Token>, line: u32) -> Self {
        Self {
            tokens,
            pos: 0,
            line,
        }
    }

    pub(crate) fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError {
            line: self.line,
            kind,
        }
    }

    pub(crate) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, ahead: usize) -> Option<&Token> {
        self.tokens.get(self.pos + ahead)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn is_done(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub(crate) fn take_punct(&mut self, c: char) -> bool {
        if self.peek() == Some(&Token::Punct(c)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn expect_punct(&mut self, c: char, what: &'static str) -> Result<(), ParseError> {
        if self.take_punct(c) {
            Ok(())
        } else {
            Err(self.error(ParseErrorKind::Expected(what)))
        }
    }

    pub(crate) fn expect_ident(&mut self, what: &'static str) -> Result<String, ParseError> {
        match self.next() {
            Some(Token::Ident(name)) => Ok(name),
            _ => Err(self.error(ParseErrorKind::Expected(what))),
        }
    }

    pub(crate) fn expect_register(&mut self) -> Result<Gpr, ParseError> {
        match self.next() {
            Some(Token::Ident(name)) => resolve_register(&name)
                .ok_or_else(|| self.error(ParseErrorKind::BadRegister(name))),
            _ => Err(self.error(ParseErrorKind::Expected("register"))),
        }
    }

    pub(crate) fn expect_string(&mut self) -> Result<String, ParseError> {
        match self.next() {
            Some(Token::Str(s)) => Ok(s),
            _ => Err(self.error(ParseErrorKind::Expected("string literal"))),
        }
    }

    fn expect_end(&self) -> Result<(), ParseError> {
        if self.is_done() {
            Ok(())
        } else {
            Err(self.error(ParseErrorKind::TrailingTokens))
        }
    }
}

/// Parses one source line.
///
/// # Errors
///
/// Returns a [`ParseError`]; the caller records it and treats the line as
/// blank so later lines still parse.
pub fn parse_line(text: &str, number: u32) -> Result<Line, ParseError> {
    let tokens = tokenize(text).map_err(|e| ParseError {
        line: number,
        kind: ParseErrorKind::Lex(e),
    })?;
    let mut cursor = Cursor::new(tokens, number);

    let mut labels = Vec::new();
    while let (Some(Token::Ident(_)), Some(Token::Punct(':'))) =
        (cursor.peek(), cursor.peek_at(1))
    {
        let Some(Token::Ident(name)) = cursor.next() else {
            unreachable!("peek established an identifier");
        };
        cursor.pos += 1; // the colon
        labels.push(name);
    }

    let stmt = if cursor.is_done() {
        None
    } else {
        let head = cursor.expect_ident("mnemonic or directive")?;
        if head.starts_with('.') && head.len() > 1 {
            Some(Stmt::Directive(parse_directive(&head, &mut cursor)?))
        } else {
            let kind = resolve_mnemonic(&head)
                .ok_or_else(|| cursor.error(ParseErrorKind::UnknownMnemonic(head.clone())))?;
            Some(Stmt::Instruction(parse_instruction(kind, &mut cursor)?))
        }
    };

    cursor.expect_end()?;
    Ok(Line {
        number,
        labels,
        stmt,
    })
}

fn parse_directive(name: &str, cursor: &mut Cursor) -> Result<Directive, ParseError> {
    match name.to_ascii_lowercase().as_str() {
        ".byte" => Ok(Directive::Byte(parse_expr_list(cursor)?)),
        ".half" => Ok(Directive::Half(parse_expr_list(cursor)?)),
        ".word" => Ok(Directive::Word(parse_expr_list(cursor)?)),
        ".ascii" => Ok(Directive::Ascii(cursor.expect_string()?)),
        ".asciz" | ".string" => Ok(Directive::Asciz(cursor.expect_string()?)),
        ".zero" => Ok(Directive::Zero(parse_expr(cursor)?)),
        ".align" => Ok(Directive::Align(parse_expr(cursor)?)),
        ".equ" => {
            let symbol = cursor.expect_ident("symbol name")?;
            cursor.expect_punct(',', "',' after symbol name")?;
            let expr = parse_expr(cursor)?;
            Ok(Directive::Equ { name: symbol, expr })
        }
        ".globl" | ".global" => Ok(Directive::Globl(cursor.expect_ident("symbol name")?)),
        _ => Err(cursor.error(ParseErrorKind::UnknownDirective(name.to_owned()))),
    }
}

fn parse_expr_list(cursor: &mut Cursor) -> Result<Vec<Expr>, ParseError> {
    let mut exprs = vec![parse_expr(cursor)?];
    while cursor.take_punct(',') {
        exprs.push(parse_expr(cursor)?);
    }
    Ok(exprs)
}

/// Parses a `+`/`-` expression. Parenthesized groups are not part of the
/// grammar; parentheses always belong to memory operands or relocation
/// functions.
pub(crate) fn parse_expr(cursor: &mut Cursor) -> Result<Expr, ParseError> {
    let mut lhs = parse_term(cursor)?;
    loop {
        if cursor.take_punct('+') {
            let rhs = parse_term(cursor)?;
            lhs = Expr::Add(Box::new(lhs), Box::new(rhs));
        } else if cursor.take_punct('-') {
            let rhs = parse_term(cursor)?;
            lhs = Expr::Sub(Box::new(lhs), Box::new(rhs));
        } else {
            return Ok(lhs);
        }
    }
}

fn parse_term(cursor: &mut Cursor) -> Result<Expr, ParseError> {
    if cursor.take_punct('-') {
        return Ok(Expr::Neg(Box::new(parse_term(cursor)?)));
    }
    if cursor.take_punct('+') {
        return parse_term(cursor);
    }
    match cursor.next() {
        Some(Token::Int(v)) => Ok(Expr::Int(v)),
        Some(Token::Ident(name)) => {
            if name == "." {
                Ok(Expr::Dot)
            } else {
                Ok(Expr::Sym(name))
            }
        }
        _ => Err(cursor.error(ParseErrorKind::Expected("expression"))),
    }
}

/// Parses an immediate operand, with or without a relocation function.
pub(crate) fn parse_imm(cursor: &mut Cursor) -> Result<ImmSpec, ParseError> {
    if let Some(Token::Reloc(reloc)) = cursor.peek() {
        let reloc = Reloc::from(*reloc);
        cursor.pos += 1;
        cursor.expect_punct('(', "'(' after relocation function")?;
        let expr = parse_expr(cursor)?;
        cursor.expect_punct(')', "')' closing relocation function")?;
        Ok(ImmSpec { expr, reloc })
    } else {
        Ok(ImmSpec::plain(parse_expr(cursor)?))
    }
}

/// Parses `offset(base)` with the offset optional.
pub(crate) fn parse_mem_operand(cursor: &mut Cursor) -> Result<(ImmSpec, Gpr), ParseError> {
    let offset = if cursor.peek() == Some(&Token::Punct('(')) {
        ImmSpec::plain(Expr::Int(0))
    } else {
        parse_imm(cursor)?
    };
    cursor.expect_punct('(', "'(' before base register")?;
    let base = cursor.expect_register()?;
    cursor.expect_punct(')', "')' after base register")?;
    Ok((offset, base))
}

fn parse_csr(cursor: &mut Cursor) -> Result<u16, ParseError> {
    match cursor.next() {
        Some(Token::Ident(name)) => {
            csr_address(&name).ok_or_else(|| cursor.error(ParseErrorKind::BadCsr(name)))
        }
        Some(Token::Int(v)) => u16::try_from(v)
            .ok()
            .filter(|addr| *addr <= 0xFFF)
            .ok_or_else(|| cursor.error(ParseErrorKind::BadCsr(v.to_string()))),
        _ => Err(cursor.error(ParseErrorKind::Expected("CSR name or number"))),
    }
}

/// Returns true when the cursor sits on a register name followed by a comma.
fn at_register_then_comma(cursor: &Cursor) -> bool {
    matches!(
        (cursor.peek(), cursor.peek_at(1)),
        (Some(Token::Ident(name)), Some(Token::Punct(',')))
            if resolve_register(name).is_some()
    )
}

#[allow(clippy::too_many_lines)]
fn parse_instruction(
    kind: MnemonicKind,
    cursor: &mut Cursor,
) -> Result<Vec<ProtoInstruction>, ParseError> {
    let proto = match kind {
        MnemonicKind::RType(op) => {
            let rd = cursor.expect_register()?;
            cursor.expect_punct(',', "',' after destination register")?;
            let rs1 = cursor.expect_register()?;
            cursor.expect_punct(',', "',' after first source register")?;
            let rs2 = cursor.expect_register()?;
            ProtoInstruction::RType { op, rd, rs1, rs2 }
        }
        MnemonicKind::IType(op) => {
            let rd = cursor.expect_register()?;
            cursor.expect_punct(',', "',' after destination register")?;
            let rs1 = cursor.expect_register()?;
            cursor.expect_punct(',', "',' after source register")?;
            let imm = parse_imm(cursor)?;
            ProtoInstruction::IType { op, rd, rs1, imm }
        }
        MnemonicKind::Shift(op) => {
            let rd = cursor.expect_register()?;
            cursor.expect_punct(',', "',' after destination register")?;
            let rs1 = cursor.expect_register()?;
            cursor.expect_punct(',', "',' after source register")?;
            let shamt = parse_expr(cursor)?;
            ProtoInstruction::Shift { op, rd, rs1, shamt }
        }
        MnemonicKind::Load(op) => {
            let rd = cursor.expect_register()?;
            cursor.expect_punct(',', "',' after destination register")?;
            let (offset, base) = parse_mem_operand(cursor)?;
            ProtoInstruction::Load {
                op,
                rd,
                base,
                offset,
            }
        }
        MnemonicKind::Store(op) => {
            let rs2 = cursor.expect_register()?;
            cursor.expect_punct(',', "',' after source register")?;
            let (offset, base) = parse_mem_operand(cursor)?;
            ProtoInstruction::Store {
                op,
                rs2,
                base,
                offset,
            }
        }
        MnemonicKind::Branch(op) => {
            let rs1 = cursor.expect_register()?;
            cursor.expect_punct(',', "',' after first register")?;
            let rs2 = cursor.expect_register()?;
            cursor.expect_punct(',', "',' after second register")?;
            let target = parse_expr(cursor)?;
            ProtoInstruction::Branch {
                op,
                rs1,
                rs2,
                target,
            }
        }
        MnemonicKind::Jal => {
            let rd = if at_register_then_comma(cursor) {
                let rd = cursor.expect_register()?;
                cursor.expect_punct(',', "',' after destination register")?;
                rd
            } else {
                Gpr::RA
            };
            let target = parse_expr(cursor)?;
            ProtoInstruction::Jal { rd, target }
        }
        MnemonicKind::Jalr => {
            let first = cursor.expect_register()?;
            if cursor.is_done() {
                ProtoInstruction::Jalr {
                    rd: Gpr::RA,
                    rs1: first,
                    offset: ImmSpec::plain(Expr::Int(0)),
                }
            } else {
                cursor.expect_punct(',', "',' after destination register")?;
                let rs1 = cursor.expect_register()?;
                cursor.expect_punct(',', "',' after source register")?;
                let offset = parse_imm(cursor)?;
                ProtoInstruction::Jalr {
                    rd: first,
                    rs1,
                    offset,
                }
            }
        }
        MnemonicKind::Upper(op) => {
            let rd = cursor.expect_register()?;
            cursor.expect_punct(',', "',' after destination register")?;
            let imm = parse_imm(cursor)?;
            ProtoInstruction::Upper { op, rd, imm }
        }
        MnemonicKind::CsrReg(op) => {
            let rd = cursor.expect_register()?;
            cursor.expect_punct(',', "',' after destination register")?;
            let csr = parse_csr(cursor)?;
            cursor.expect_punct(',', "',' after CSR")?;
            let rs1 = cursor.expect_register()?;
            ProtoInstruction::CsrReg { op, rd, csr, rs1 }
        }
        MnemonicKind::CsrImm(op) => {
            let rd = cursor.expect_register()?;
            cursor.expect_punct(',', "',' after destination register")?;
            let csr = parse_csr(cursor)?;
            cursor.expect_punct(',', "',' after CSR")?;
            let uimm = parse_expr(cursor)?;
            ProtoInstruction::CsrImm { op, rd, csr, uimm }
        }
        MnemonicKind::Fence => ProtoInstruction::Fence,
        MnemonicKind::Ecall => ProtoInstruction::Ecall,
        MnemonicKind::Ebreak => ProtoInstruction::Ebreak,
        MnemonicKind::Mret => ProtoInstruction::Mret,
        MnemonicKind::Pseudo(op) => return pseudo::parse_pseudo(op, cursor),
    };
    Ok(vec![proto])
}

#[cfg(test)]
mod tests {
    use super::{
        parse_line, Directive, Expr, ImmSpec, Line, ParseErrorKind, ProtoInstruction, Reloc, Stmt,
    };
    use crate::mnemonic::{IOp, LoadOp, ROp, UpperOp};
    use slate_core::Gpr;

    fn instruction(text: &str) -> Vec<ProtoInstruction> {
        match parse_line(text, 1).unwrap().stmt {
            Some(Stmt::Instruction(protos)) => protos,
            other => panic!("expected instruction, got {other:?}"),
        }
    }

    #[test]
    fn blank_and_comment_lines_parse_to_nothing() {
        assert_eq!(
            parse_line("   # comment", 3).unwrap(),
            Line {
                number: 3,
                labels: vec![],
                stmt: None
            }
        );
    }

    #[test]
    fn labels_stack_before_a_statement() {
        let line = parse_line("first: second: nop", 1).unwrap();
        assert_eq!(line.labels, vec!["first".to_owned(), "second".to_owned()]);
        assert!(line.stmt.is_some());
    }

    #[test]
    fn r_type_operands_parse_in_order() {
        assert_eq!(
            instruction("add a0, a1, a2"),
            vec![ProtoInstruction::RType {
                op: ROp::Add,
                rd: Gpr::from_u5(10).unwrap(),
                rs1: Gpr::from_u5(11).unwrap(),
                rs2: Gpr::from_u5(12).unwrap(),
            }]
        );
    }

    #[test]
    fn i_type_immediates_accept_expressions() {
        let protos = instruction("addi t0, t0, 3 + 4 - 1");
        let ProtoInstruction::IType { op, imm, .. } = &protos[0] else {
            panic!("expected i-type");
        };
        assert_eq!(*op, IOp::Addi);
        assert_eq!(imm.expr.literal(), Some(6));
    }

    #[test]
    fn load_memory_operands_parse_offset_and_base() {
        let protos = instruction("lw a0, 8(sp)");
        assert_eq!(
            protos,
            vec![ProtoInstruction::Load {
                op: LoadOp::Lw,
                rd: Gpr::A0,
                base: Gpr::SP,
                offset: ImmSpec::plain(Expr::Int(8)),
            }]
        );
    }

    #[test]
    fn load_offset_may_be_omitted() {
        let protos = instruction("lw a0, (sp)");
        let ProtoInstruction::Load { offset, .. } = &protos[0] else {
            panic!("expected load");
        };
        assert_eq!(offset.expr.literal(), Some(0));
    }

    #[test]
    fn lui_accepts_hi_relocation() {
        let protos = instruction("lui a0, %hi(buffer)");
        let ProtoInstruction::Upper { op, imm, .. } = &protos[0] else {
            panic!("expected upper");
        };
        assert_eq!(*op, UpperOp::Lui);
        assert_eq!(imm.reloc, Reloc::Hi);
        assert_eq!(imm.expr, Expr::Sym("buffer".to_owned()));
    }

    #[test]
    fn csr_operands_accept_names_and_numbers() {
        let by_name = instruction("csrrw t0, mscratch, t1");
        let by_number = instruction("csrrw t0, 0x340, t1");
        assert_eq!(by_name, by_number);
    }

    #[test]
    fn jal_with_one_operand_links_through_ra() {
        let protos = instruction("jal handler");
        assert_eq!(
            protos,
            vec![ProtoInstruction::Jal {
                rd: Gpr::RA,
                target: Expr::Sym("handler".to_owned()),
            }]
        );
    }

    #[test]
    fn directives_parse_their_argument_shapes() {
        let line = parse_line(".word 1, 2, 3", 1).unwrap();
        assert!(matches!(
            line.stmt,
            Some(Stmt::Directive(Directive::Word(ref items))) if items.len() == 3
        ));

        let line = parse_line(".equ limit, 10", 1).unwrap();
        assert!(matches!(
            line.stmt,
            Some(Stmt::Directive(Directive::Equ { ref name, .. })) if name == "limit"
        ));
    }

    #[test]
    fn unknown_mnemonics_and_registers_are_classified() {
        let err = parse_line("mul a0, a1, a2", 1).unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::UnknownMnemonic(_)));

        let err = parse_line("add a0, a1, q7", 1).unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::BadRegister(_)));
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        let err = parse_line("nop nop", 1).unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::TrailingTokens));
    }

    #[test]
    fn dot_in_expressions_names_the_location_counter() {
        let line = parse_line(".word . - 4", 1).unwrap();
        let Some(Stmt::Directive(Directive::Word(items))) = line.stmt else {
            panic!("expected .word");
        };
        assert_eq!(
            items[0],
            Expr::Sub(Box::new(Expr::Dot), Box::new(Expr::Int(4)))
        );
    }
}
