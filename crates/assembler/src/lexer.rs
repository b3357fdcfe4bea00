//! Line tokenizer for assembly source.
//!
//! Comments (`#` or `;`) run to end of line. Indentation is insignificant;
//! the parser works on the flat token list of one line at a time.

/// Relocation functions usable around immediate expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocFn {
    /// `%hi(expr)`: bits 31:12, adjusted for the sign of the low part.
    Hi,
    /// `%lo(expr)`: sign-extended bits 11:0.
    Lo,
    /// `%pcrel_hi(expr)`: PC-relative high part for `auipc`.
    PcrelHi,
    /// `%pcrel_lo(expr)`: PC-relative low part pairing with a preceding
    /// `auipc`.
    PcrelLo,
}

/// A single token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Identifier: label, mnemonic, register, directive, or symbol name.
    Ident(String),
    /// Integer literal, including character literals.
    Int(i64),
    /// String literal with escapes already applied.
    Str(String),
    /// One of `, : ( ) + -`.
    Punct(char),
    /// A `%reloc` function head.
    Reloc(RelocFn),
}

/// Lexical error detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    /// A character that starts no token.
    BadToken(char),
    /// Malformed integer literal.
    BadNumber(String),
    /// String or character literal missing its closing quote.
    UnterminatedLiteral,
    /// Unknown escape sequence inside a string or character literal.
    BadEscape(String),
    /// Character literal that is empty or holds more than one byte.
    BadCharLiteral,
    /// Unknown `%function` name.
    BadReloc(String),
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadToken(c) => write!(f, "unexpected character '{c}'"),
            Self::BadNumber(s) => write!(f, "malformed integer literal '{s}'"),
            Self::UnterminatedLiteral => write!(f, "unterminated string literal"),
            Self::BadEscape(s) => write!(f, "unknown escape sequence '\\{s}'"),
            Self::BadCharLiteral => write!(f, "character literal must hold exactly one byte"),
            Self::BadReloc(s) => write!(f, "unknown relocation function '%{s}'"),
        }
    }
}

impl std::error::Error for LexError {}

const fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || matches!(c, '_' | '.' | '$')
}

const fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '$')
}

/// Tokenizes one source line.
///
/// # Errors
///
/// Returns the first [`LexError`] on the line; the caller records it as a
/// diagnostic and treats the line as blank.
pub fn tokenize(line: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            '#' | ';' => break,
            c if c.is_whitespace() => {
                chars.next();
            }
            ',' | ':' | '(' | ')' | '+' | '-' => {
                chars.next();
                tokens.push(Token::Punct(c));
            }
            '%' => {
                chars.next();
                let name = take_while(&mut chars, is_ident_continue);
                let reloc = match name.as_str() {
                    "hi" => RelocFn::Hi,
                    "lo" => RelocFn::Lo,
                    "pcrel_hi" => RelocFn::PcrelHi,
                    "pcrel_lo" => RelocFn::PcrelLo,
                    _ => return Err(LexError::BadReloc(name)),
                };
                tokens.push(Token::Reloc(reloc));
            }
            '"' => {
                chars.next();
                tokens.push(Token::Str(take_string(&mut chars)?));
            }
            '\'' => {
                chars.next();
                tokens.push(Token::Int(take_char(&mut chars)?));
            }
            c if c.is_ascii_digit() => {
                let text = take_while(&mut chars, |c| {
                    c.is_ascii_alphanumeric() || c == '_'
                });
                tokens.push(Token::Int(parse_int(&text)?));
            }
            c if is_ident_start(c) => {
                let text = take_while(&mut chars, is_ident_continue);
                tokens.push(Token::Ident(text));
            }
            other => return Err(LexError::BadToken(other)),
        }
    }

    Ok(tokens)
}

fn take_while(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    keep: impl Fn(char) -> bool,
) -> String {
    let mut text = String::new();
    while let Some(&c) = chars.peek() {
        if keep(c) {
            text.push(c);
            chars.next();
        } else {
            break;
        }
    }
    text
}

fn parse_int(text: &str) -> Result<i64, LexError> {
    let digits = text.replace('_', "");
    let bad = || LexError::BadNumber(text.to_owned());

    let parsed = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X"))
    {
        i64::from_str_radix(hex, 16)
    } else if let Some(bin) = digits.strip_prefix("0b").or_else(|| digits.strip_prefix("0B")) {
        i64::from_str_radix(bin, 2)
    } else if let Some(oct) = digits.strip_prefix("0o").or_else(|| digits.strip_prefix("0O")) {
        i64::from_str_radix(oct, 8)
    } else if digits.len() > 1 && digits.starts_with('0') {
        i64::from_str_radix(&digits[1..], 8)
    } else {
        digits.parse()
    };

    // Accept magnitudes up to u32 so `0xFFFFFFFF` lexes; expression
    // evaluation range-checks per use site.
    match parsed {
        Ok(value) => Ok(value),
        Err(_) => Err(bad()),
    }
}

fn take_escape(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> Result<char, LexError> {
    let Some(escape) = chars.next() else {
        return Err(LexError::UnterminatedLiteral);
    };
    match escape {
        'n' => Ok('\n'),
        'r' => Ok('\r'),
        't' => Ok('\t'),
        '\\' => Ok('\\'),
        '\'' => Ok('\''),
        '"' => Ok('"'),
        '0' => Ok('\0'),
        'x' => {
            let hi = chars.next().ok_or(LexError::UnterminatedLiteral)?;
            let lo = chars.next().ok_or(LexError::UnterminatedLiteral)?;
            let pair: String = [hi, lo].iter().collect();
            u8::from_str_radix(&pair, 16)
                .map(char::from)
                .map_err(|_| LexError::BadEscape(format!("x{pair}")))
        }
        other => Err(LexError::BadEscape(other.to_string())),
    }
}

fn take_string(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> Result<String, LexError> {
    let mut text = String::new();
    loop {
        match chars.next() {
            None => return Err(LexError::UnterminatedLiteral),
            Some('"') => return Ok(text),
            Some('\\') => {
                let c = take_escape(chars)?;
                // String bytes are emitted verbatim by `.ascii`, so an
                // escape above ASCII cannot be represented faithfully.
                if c as u32 > 0x7F {
                    return Err(LexError::BadEscape(format!("x{:02X}", c as u32)));
                }
                text.push(c);
            }
            Some(c) => text.push(c),
        }
    }
}

fn take_char(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Result<i64, LexError> {
    let value = match chars.next() {
        None | Some('\'') => return Err(LexError::BadCharLiteral),
        Some('\\') => take_escape(chars)?,
        Some(c) => c,
    };
    match chars.next() {
        Some('\'') => Ok(i64::from(value as u32)),
        _ => Err(LexError::BadCharLiteral),
    }
}

#[cfg(test)]
mod tests {
    use super::{tokenize, LexError, RelocFn, Token};

    fn ints(line: &str) -> Vec<i64> {
        tokenize(line)
            .unwrap()
            .into_iter()
            .filter_map(|t| match t {
                Token::Int(v) => Some(v),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn radix_prefixes_and_leading_zero_octal_all_lex() {
        assert_eq!(ints("10 0x1F 0b101 0o17 017 0"), vec![10, 31, 5, 15, 15, 0]);
    }

    #[test]
    fn character_literals_lex_with_escapes() {
        assert_eq!(ints("'A' '\\n' '\\0' '\\x41'"), vec![65, 10, 0, 65]);
    }

    #[test]
    fn string_escapes_are_applied() {
        let tokens = tokenize(r#".ascii "hi\n\x00there\"""#).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Ident(".ascii".to_owned()),
                Token::Str("hi\n\0there\"".to_owned()),
            ]
        );
    }

    #[test]
    fn comments_terminate_the_token_stream() {
        assert_eq!(tokenize("nop # trailing").unwrap().len(), 1);
        assert_eq!(tokenize("nop ; trailing").unwrap().len(), 1);
        assert!(tokenize("# whole-line").unwrap().is_empty());
    }

    #[test]
    fn labels_and_punctuation_split_into_tokens() {
        let tokens = tokenize("loop: addi t0, t0, -1").unwrap();
        assert_eq!(tokens[0], Token::Ident("loop".to_owned()));
        assert_eq!(tokens[1], Token::Punct(':'));
        assert!(tokens.contains(&Token::Punct('-')));
    }

    #[test]
    fn reloc_heads_lex_as_dedicated_tokens() {
        let tokens = tokenize("lui a0, %hi(value)").unwrap();
        assert!(tokens.contains(&Token::Reloc(RelocFn::Hi)));
        let tokens = tokenize("auipc a0, %pcrel_hi(value)").unwrap();
        assert!(tokens.contains(&Token::Reloc(RelocFn::PcrelHi)));
    }

    #[test]
    fn identifiers_may_carry_dots_and_dollar_signs() {
        let tokens = tokenize(".L0$wide").unwrap();
        assert_eq!(tokens, vec![Token::Ident(".L0$wide".to_owned())]);
    }

    #[test]
    fn unterminated_string_is_reported() {
        assert_eq!(
            tokenize(".ascii \"oops"),
            Err(LexError::UnterminatedLiteral)
        );
    }

    #[test]
    fn unknown_reloc_function_is_reported() {
        assert_eq!(
            tokenize("%mid(x)"),
            Err(LexError::BadReloc("mid".to_owned()))
        );
    }

    #[test]
    fn malformed_numbers_are_reported() {
        assert!(matches!(tokenize("0xZZ"), Err(LexError::BadNumber(_))));
        assert!(matches!(tokenize("0b2"), Err(LexError::BadNumber(_))));
    }
}
