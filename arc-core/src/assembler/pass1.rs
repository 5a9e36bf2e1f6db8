//! Pass 1: walks the source once, assigning every label and `.equ` name
//! an address or value, and lays out the address each instruction and
//! label-only line will occupy. It does not encode anything — that's
//! pass 2, which replays the address assignments this pass already
//! computed.

use super::operand;
use crate::error::AsmError;
use crate::expr::{self, EvalMode};
use crate::isa::{synthetic, Mnemonic};
use crate::symbol::SymbolTable;
use crate::token::{tokenize_line, LineToken, Operand};

#[derive(Debug)]
pub struct Statement {
    pub line: u32,
    pub address: u32,
    pub kind: StatementKind,
}

#[derive(Debug)]
pub enum StatementKind {
    Instruction { mnemonic: String, operands: Vec<Operand> },
    /// A label with nothing else on its line. Per the assembler's
    /// layout rule this still occupies a word, initialized to zero.
    ZeroWord,
    /// A line that is a sequence of pure immediates rather than an
    /// instruction — e.g. `x: 42` — emitted as one raw data word per
    /// expression, evaluated the same way an instruction operand is.
    Data(String),
}

#[derive(Debug)]
pub struct Pass1Output {
    pub symbols: SymbolTable,
    pub statements: Vec<Statement>,
    pub start_address: u32,
}

pub fn run(source: &str) -> Result<Pass1Output, AsmError> {
    let mut symbols = SymbolTable::new();
    let mut statements = Vec::new();
    let mut address: u32 = 0;
    let mut start_address: Option<u32> = None;
    let mut block_stack: Vec<u32> = Vec::new();
    let mut discard_warnings = Vec::new();

    for (index, raw_line) in source.lines().enumerate() {
        let line = (index + 1) as u32;
        let tokens = tokenize_line(raw_line);
        if tokens.is_empty() {
            continue;
        }

        let (label, rest) = split_label(&tokens);
        if let Some(name) = label {
            symbols.define(name.to_string(), address as i64);
            if name == "main" {
                start_address = Some(address);
            }
        }

        if rest.is_empty() {
            if label.is_some() {
                if start_address.is_none() {
                    start_address = Some(address);
                }
                statements.push(Statement {
                    line,
                    address,
                    kind: StatementKind::ZeroWord,
                });
                address = advance(address, 4, line)?;
            }
            continue;
        }

        if let LineToken::Directive(name) = &rest[0] {
            match name.as_str() {
                ".org" => {
                    let text = join_words(&rest[1..], line)?;
                    let value = expr::evaluate(&text, &symbols, EvalMode::Strict, line, &mut discard_warnings)?;
                    address = require_word_address(value, line)?;
                }
                ".dwb" => {
                    let text = join_words(&rest[1..], line)?;
                    let count = expr::evaluate(&text, &symbols, EvalMode::Strict, line, &mut discard_warnings)?;
                    if count < 0 {
                        return Err(AsmError::InvalidNumeric { line, text });
                    }
                    let bytes = (count as u64).checked_mul(4).ok_or(AsmError::AddressOutOfRange {
                        line,
                        address: address as i64,
                    })?;
                    address = advance(address, bytes, line)?;
                }
                ".begin" => block_stack.push(line),
                ".end" => {
                    if block_stack.pop().is_none() {
                        return Err(AsmError::UnterminatedBlock { line });
                    }
                }
                ".if" | ".endif" => return Err(AsmError::NotImplemented { line }),
                other => {
                    return Err(AsmError::UnknownMnemonic {
                        line,
                        mnemonic: other.to_string(),
                    })
                }
            }
            continue;
        }

        if rest.len() >= 3 {
            if let (LineToken::Word(name), LineToken::Directive(d)) = (&rest[0], &rest[1]) {
                if d == ".equ" {
                    let text = join_words(&rest[2..], line)?;
                    let value = expr::evaluate(&text, &symbols, EvalMode::Strict, line, &mut discard_warnings)?;
                    symbols.define(name.clone(), value);
                    continue;
                }
            }
        }

        let mnemonic = match &rest[0] {
            LineToken::Word(w) => w.to_ascii_lowercase(),
            LineToken::Directive(d) => {
                return Err(AsmError::UnknownMnemonic {
                    line,
                    mnemonic: d.clone(),
                })
            }
            LineToken::Label(_) => unreachable!("a second label on the line is lexically a word"),
        };

        let is_mnemonic = Mnemonic::lookup(&mnemonic).is_some() || synthetic::is_known(&mnemonic);
        if !is_mnemonic {
            if let Some(texts) = pure_immediate_texts(rest) {
                if start_address.is_none() {
                    start_address = Some(address);
                }
                for text in texts {
                    statements.push(Statement {
                        line,
                        address,
                        kind: StatementKind::Data(text),
                    });
                    address = advance(address, 4, line)?;
                }
                continue;
            }
        }

        let mut operands = Vec::with_capacity(rest.len() - 1);
        let mut raw_texts = Vec::with_capacity(rest.len() - 1);
        for tok in &rest[1..] {
            let text = token_text(tok);
            raw_texts.push(text.to_string());
            match operand::parse(text) {
                Some(op) => operands.push(op),
                None => {
                    return Err(AsmError::InvalidOperands {
                        line,
                        mnemonic,
                        tokens: raw_texts,
                    })
                }
            }
        }

        if start_address.is_none() {
            start_address = Some(address);
        }
        statements.push(Statement {
            line,
            address,
            kind: StatementKind::Instruction { mnemonic, operands },
        });
        address = advance(address, 4, line)?;
    }

    if let Some(&unclosed) = block_stack.first() {
        return Err(AsmError::UnterminatedBlock { line: unclosed });
    }

    Ok(Pass1Output {
        symbols,
        statements,
        start_address: start_address.unwrap_or(0),
    })
}

/// `Some` iff every token on the line is a bare expression — no
/// register, no bracketed memory operand — the shape that lays out as
/// one raw data word per token instead of a single instruction word.
fn pure_immediate_texts(tokens: &[LineToken]) -> Option<Vec<String>> {
    let mut texts = Vec::with_capacity(tokens.len());
    for tok in tokens {
        let text = token_text(tok);
        match operand::parse(text) {
            Some(Operand::Expr(_)) => texts.push(text.to_string()),
            _ => return None,
        }
    }
    Some(texts)
}

fn split_label(tokens: &[LineToken]) -> (Option<&str>, &[LineToken]) {
    match tokens.first() {
        Some(LineToken::Label(name)) => (Some(name.as_str()), &tokens[1..]),
        _ => (None, tokens),
    }
}

fn token_text(tok: &LineToken) -> &str {
    match tok {
        LineToken::Word(w) => w,
        LineToken::Directive(d) => d,
        LineToken::Label(l) => l,
    }
}

/// Directive arguments are written without embedded spaces in this
/// syntax (`.org main+4`, not `.org main + 4`), so each remaining token
/// concatenates directly into one expression.
fn join_words(tokens: &[LineToken], line: u32) -> Result<String, AsmError> {
    if tokens.is_empty() {
        return Err(AsmError::InvalidNumeric {
            line,
            text: String::new(),
        });
    }
    Ok(tokens.iter().map(token_text).collect())
}

fn advance(address: u32, by: u64, line: u32) -> Result<u32, AsmError> {
    let next = address as u64 + by;
    if next > u32::MAX as u64 {
        return Err(AsmError::AddressOutOfRange {
            line,
            address: next as i64,
        });
    }
    Ok(next as u32)
}

fn require_word_address(value: i64, line: u32) -> Result<u32, AsmError> {
    if value < 0 || value > u32::MAX as i64 {
        return Err(AsmError::AddressOutOfRange { line, address: value });
    }
    if value % 4 != 0 {
        return Err(AsmError::AlignmentError {
            line,
            address: value,
            modulus: 4,
        });
    }
    Ok(value as u32)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn assigns_sequential_addresses() {
        let out = run("main: add %r0, 1, %r1\nhalt\n").unwrap();
        assert_eq!(out.symbols.get("main"), Some(0));
        assert_eq!(out.statements.len(), 2);
        assert_eq!(out.statements[1].address, 4);
    }

    #[test]
    fn org_repositions_subsequent_statements() {
        let out = run(".org 2048\nstart: halt\n").unwrap();
        assert_eq!(out.symbols.get("start"), Some(2048));
        assert_eq!(out.start_address, 2048);
    }

    #[test]
    fn label_only_line_reserves_a_word() {
        let out = run("value:\nhalt\n").unwrap();
        assert_eq!(out.symbols.get("value"), Some(0));
        assert_eq!(out.statements[0].address, 0);
        assert_eq!(out.statements[1].address, 4);
    }

    #[test]
    fn equ_defines_a_constant_without_advancing_address() {
        let out = run("LIMIT .equ 10\nhalt\n").unwrap();
        assert_eq!(out.symbols.get("LIMIT"), Some(10));
        assert_eq!(out.statements[0].address, 0);
    }

    #[test]
    fn dwb_reserves_words() {
        let out = run(".dwb 4\nhalt\n").unwrap();
        assert_eq!(out.statements[0].address, 16);
    }

    #[test]
    fn unterminated_begin_is_an_error() {
        let err = run(".begin\nhalt\n").unwrap_err();
        assert_eq!(err, AsmError::UnterminatedBlock { line: 1 });
    }

    #[test]
    fn a_bare_numeric_line_lays_out_as_a_data_word_not_an_instruction() {
        let out = run("x: 42\nmain: halt\n").unwrap();
        assert_eq!(out.symbols.get("x"), Some(0));
        assert_eq!(out.statements[0].address, 0);
        assert!(matches!(&out.statements[0].kind, StatementKind::Data(t) if t == "42"));
        assert_eq!(out.statements[1].address, 4);
    }

    #[test]
    fn main_label_sets_the_start_address_even_when_laid_out_after_other_statements() {
        let out = run(".begin\n.org 2048\nx: 42\nmain: halt\n.end\n").unwrap();
        assert_eq!(out.symbols.get("x"), Some(2048));
        assert_eq!(out.symbols.get("main"), Some(2052));
        assert_eq!(out.start_address, 2052);
    }

    #[test]
    fn without_a_main_label_the_start_address_is_the_first_statement() {
        let out = run(".org 2048\nstart: halt\n").unwrap();
        assert_eq!(out.start_address, 2048);
    }

    #[test]
    fn org_must_be_word_aligned() {
        let err = run(".org 2\n").unwrap_err();
        assert_eq!(
            err,
            AsmError::AlignmentError {
                line: 1,
                address: 2,
                modulus: 4
            }
        );
    }
}
