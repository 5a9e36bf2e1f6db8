//! Parses a single raw operand token's surface syntax into an
//! [`Operand`]. This only recognizes *shape* (register / bracketed
//! memory / bare expression) — whether a given shape is legal for a
//! particular mnemonic is pass 2's job, once the real mnemonic (after
//! synthetic expansion) is known.

use crate::token::{MemoryOperand, Operand};

pub fn parse(raw: &str) -> Option<Operand> {
    if raw.is_empty() {
        return None;
    }
    if raw.eq_ignore_ascii_case("%psr") {
        return Some(Operand::Psr);
    }
    if let Some(inner) = raw.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        return parse_memory(inner).map(Operand::Memory);
    }
    if let Some(n) = parse_register(raw) {
        return Some(Operand::Register(n));
    }
    Some(Operand::Expr(raw.to_string()))
}

fn parse_memory(inner: &str) -> Option<MemoryOperand> {
    if inner.is_empty() {
        return None;
    }
    match parse_register_prefix(inner) {
        Some((reg, "")) => Some(MemoryOperand::Reg(reg)),
        Some((reg, rest)) => {
            let rest = rest.strip_prefix('+')?;
            match parse_register(rest) {
                Some(other) => Some(MemoryOperand::RegPlusReg(reg, other)),
                None => Some(MemoryOperand::RegPlusImm(reg, rest.to_string())),
            }
        }
        None => Some(MemoryOperand::Imm(inner.to_string())),
    }
}

fn parse_register(s: &str) -> Option<u32> {
    match parse_register_prefix(s) {
        Some((n, "")) => Some(n),
        _ => None,
    }
}

/// Parses a leading `%r<digits>` (case-insensitive `r`), or one of the
/// SPARC register-window aliases (`%g0`-`%g7`, `%o0`-`%o7`, `%l0`-`%l7`,
/// `%i0`-`%i7`, `%sp`, `%fp`), and returns the resolved register number
/// plus whatever text follows it.
fn parse_register_prefix(s: &str) -> Option<(u32, &str)> {
    let rest = s.strip_prefix('%')?;
    if let Some(remainder) = rest.strip_prefix("sp").or_else(|| rest.strip_prefix("SP")) {
        return Some((14, remainder));
    }
    if let Some(remainder) = rest.strip_prefix("fp").or_else(|| rest.strip_prefix("FP")) {
        return Some((30, remainder));
    }
    let mut chars = rest.char_indices();
    let (_, first) = chars.next()?;
    let window_base = match first.to_ascii_lowercase() {
        'r' => None,
        'g' => Some(0),
        'o' => Some(8),
        'l' => Some(16),
        'i' => Some(24),
        _ => return None,
    };
    let after_prefix = &rest[first.len_utf8()..];
    let digits_len = after_prefix.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    let (digits, remainder) = after_prefix.split_at(digits_len);
    let offset: u32 = digits.parse().ok()?;
    let max_offset = if window_base.is_some() { 7 } else { 31 };
    if offset > max_offset {
        return None;
    }
    let n = window_base.unwrap_or(0) + offset;
    Some((n, remainder))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_a_register() {
        assert_eq!(parse("%r7"), Some(Operand::Register(7)));
        assert_eq!(parse("%R31"), Some(Operand::Register(31)));
    }

    #[test]
    fn register_number_out_of_range_falls_back_to_expr() {
        assert_eq!(parse("%r32"), Some(Operand::Expr("%r32".to_string())));
    }

    #[test]
    fn parses_register_window_aliases() {
        assert_eq!(parse("%g0"), Some(Operand::Register(0)));
        assert_eq!(parse("%g7"), Some(Operand::Register(7)));
        assert_eq!(parse("%o0"), Some(Operand::Register(8)));
        assert_eq!(parse("%l0"), Some(Operand::Register(16)));
        assert_eq!(parse("%i0"), Some(Operand::Register(24)));
        assert_eq!(parse("%i7"), Some(Operand::Register(31)));
        assert_eq!(parse("%sp"), Some(Operand::Register(14)));
        assert_eq!(parse("%fp"), Some(Operand::Register(30)));
    }

    #[test]
    fn parses_the_psr_pseudo_register() {
        assert_eq!(parse("%psr"), Some(Operand::Psr));
        assert_eq!(parse("%PSR"), Some(Operand::Psr));
    }

    #[test]
    fn parses_bare_expression() {
        assert_eq!(parse("x+4"), Some(Operand::Expr("x+4".to_string())));
        assert_eq!(parse("10"), Some(Operand::Expr("10".to_string())));
    }

    #[test]
    fn parses_memory_register_only() {
        assert_eq!(parse("[%r1]"), Some(Operand::Memory(MemoryOperand::Reg(1))));
    }

    #[test]
    fn parses_memory_reg_plus_reg() {
        assert_eq!(
            parse("[%r1+%r2]"),
            Some(Operand::Memory(MemoryOperand::RegPlusReg(1, 2)))
        );
    }

    #[test]
    fn parses_memory_reg_plus_symbol() {
        assert_eq!(
            parse("[%r1+label]"),
            Some(Operand::Memory(MemoryOperand::RegPlusImm(1, "label".to_string())))
        );
    }

    #[test]
    fn parses_memory_absolute_expression() {
        assert_eq!(
            parse("[buffer+4]"),
            Some(Operand::Memory(MemoryOperand::Imm("buffer+4".to_string())))
        );
    }

    #[test]
    fn empty_brackets_do_not_parse() {
        assert_eq!(parse("[]"), None);
    }
}
