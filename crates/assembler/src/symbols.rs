//! Symbol table and pass-1 address assignment.
//!
//! Pass 1 walks parsed lines with a location counter starting at the
//! origin, binds labels, evaluates `.equ` definitions, and fixes the byte
//! size of every statement. Sizes never change in pass 2, so symbol
//! addresses are stable across passes.

use std::collections::BTreeMap;

use crate::errors::Diagnostic;
use crate::parser::{Directive, Line, Stmt};

/// How a symbol was defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// Bound to an address by a label.
    Label,
    /// Defined by `.equ`.
    Equ,
}

/// A defined symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// The symbol's value. Label values are addresses.
    pub value: i64,
    /// Line of the definition.
    pub line: u32,
    /// Definition kind.
    pub kind: SymbolKind,
}

/// Symbol table in name order.
pub type SymbolTable = BTreeMap<String, Symbol>;

/// A statement with its assigned address and fixed size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressedItem {
    /// Address where this statement's bytes begin.
    pub address: u32,
    /// Size in bytes, fixed in pass 1.
    pub size: u32,
    /// 1-based source line.
    pub line: u32,
    /// The statement.
    pub stmt: Stmt,
}

/// Result of pass 1.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Layout {
    /// Addressed statements in source order.
    pub items: Vec<AddressedItem>,
    /// All defined symbols.
    pub symbols: SymbolTable,
    /// One past the last emitted byte.
    pub end: u32,
}

/// Assigns addresses and builds the symbol table.
///
/// Problems (duplicate labels, misaligned data directives, unresolvable
/// `.zero`/`.align`/`.equ` arguments, address overflow) are reported into
/// `diagnostics`; layout continues so later errors still surface.
#[must_use]
#[allow(clippy::too_many_lines, clippy::cast_possible_truncation)]
pub fn lay_out(lines: &[Line], origin: u32, diagnostics: &mut Vec<Diagnostic>) -> Layout {
    let mut symbols = SymbolTable::new();
    let mut items = Vec::new();
    let mut counter = u64::from(origin);

    for line in lines {
        let address = counter as u32;

        for label in &line.labels {
            define(
                &mut symbols,
                label,
                i64::from(address),
                line.number,
                SymbolKind::Label,
                diagnostics,
            );
        }

        let Some(stmt) = &line.stmt else {
            continue;
        };

        let lookup = |name: &str| symbols.get(name).map(|s| s.value);
        let size = match stmt {
            Stmt::Instruction(protos) => 4 * protos.len() as u64,
            Stmt::Directive(directive) => match directive {
                Directive::Byte(values) => values.len() as u64,
                Directive::Half(values) => {
                    if address % 2 != 0 {
                        diagnostics.push(Diagnostic::new(
                            line.number,
                            format!(".half at misaligned address {address:#x}"),
                        ));
                    }
                    2 * values.len() as u64
                }
                Directive::Word(values) => {
                    if address % 4 != 0 {
                        diagnostics.push(Diagnostic::new(
                            line.number,
                            format!(".word at misaligned address {address:#x}"),
                        ));
                    }
                    4 * values.len() as u64
                }
                Directive::Ascii(s) => s.len() as u64,
                Directive::Asciz(s) => s.len() as u64 + 1,
                Directive::Zero(expr) => match expr.eval(&lookup, address) {
                    Ok(count) if count >= 0 => count as u64,
                    Ok(count) => {
                        diagnostics.push(Diagnostic::new(
                            line.number,
                            format!(".zero count must not be negative, got {count}"),
                        ));
                        0
                    }
                    Err(symbol) => {
                        diagnostics.push(undefined(line.number, &symbol));
                        0
                    }
                },
                Directive::Align(expr) => match expr.eval(&lookup, address) {
                    Ok(exponent) if (0..=31).contains(&exponent) => {
                        let alignment = 1_u64 << exponent;
                        alignment - 1 - (counter + alignment - 1) % alignment
                    }
                    Ok(exponent) => {
                        diagnostics.push(Diagnostic::new(
                            line.number,
                            format!(".align exponent out of range: {exponent}"),
                        ));
                        0
                    }
                    Err(symbol) => {
                        diagnostics.push(undefined(line.number, &symbol));
                        0
                    }
                },
                Directive::Equ { name, expr } => {
                    match expr.eval(&lookup, address) {
                        Ok(value) => define(
                            &mut symbols,
                            name,
                            value,
                            line.number,
                            SymbolKind::Equ,
                            diagnostics,
                        ),
                        Err(symbol) => diagnostics.push(undefined(line.number, &symbol)),
                    }
                    0
                }
                Directive::Globl(_) => 0,
            },
        };

        items.push(AddressedItem {
            address,
            size: size as u32,
            line: line.number,
            stmt: stmt.clone(),
        });

        counter += size;
        if counter > 1 << 32 {
            diagnostics.push(Diagnostic::new(
                line.number,
                format!("address {counter:#x} exceeds the 32-bit address space"),
            ));
            break;
        }
    }

    Layout {
        items,
        symbols,
        end: counter as u32,
    }
}

fn define(
    symbols: &mut SymbolTable,
    name: &str,
    value: i64,
    line: u32,
    kind: SymbolKind,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if let Some(existing) = symbols.get(name) {
        diagnostics.push(Diagnostic::new(
            line,
            format!(
                "duplicate symbol '{name}' (first defined at line {})",
                existing.line
            ),
        ));
        return;
    }
    symbols.insert(
        name.to_owned(),
        Symbol { value, line, kind },
    );
}

fn undefined(line: u32, symbol: &str) -> Diagnostic {
    Diagnostic::new(line, format!("undefined symbol '{symbol}'"))
}
