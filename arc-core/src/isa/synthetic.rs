//! Synthetic mnemonics expand to one real instruction via a template with
//! positional markers (`*1`, `*2`, ...). Rather than interpolate strings,
//! [`expand`] rewrites the operand token list directly and hands back the
//! real mnemonic name to re-dispatch through.

use crate::token::Operand;

/// `(real mnemonic, rewritten operands)`, or `None` if `name` isn't a
/// synthetic mnemonic (the caller should then try the real ISA table).
pub fn expand(name: &str, operands: &[Operand]) -> Option<(&'static str, Vec<Operand>)> {
    let r0 = Operand::Register(0);
    match (name, operands) {
        // not*1,*2 -> xnor *1,%r0,*2
        ("not", [a, b]) => Some(("xnor", vec![a.clone(), r0, b.clone()])),
        // neg*1,*2 -> sub %r0,*1,*2
        ("neg", [a, b]) => Some(("sub", vec![r0, a.clone(), b.clone()])),
        // inc*1 -> add *1,1,*1
        ("inc", [a]) => Some(("add", vec![a.clone(), Operand::Immediate(1), a.clone()])),
        // dec*1 -> sub *1,1,*1
        ("dec", [a]) => Some(("sub", vec![a.clone(), Operand::Immediate(1), a.clone()])),
        // clr*1 -> and *1,%r0,*1
        ("clr", [a]) => Some(("and", vec![a.clone(), r0, a.clone()])),
        // cmp*1,*2 -> subcc *1,*2,%r0
        ("cmp", [a, b]) => Some(("subcc", vec![a.clone(), b.clone(), r0])),
        // tst*1 -> orcc %r0,*1,%r0
        ("tst", [a]) => Some(("orcc", vec![r0.clone(), a.clone(), r0])),
        // mov*1,*2 -> or %r0,*1,*2
        ("mov", [a, b]) => Some(("or", vec![r0, a.clone(), b.clone()])),
        // nop -> sethi 0,%r0
        ("nop", []) => Some(("sethi", vec![Operand::Immediate(0), r0])),
        _ => None,
    }
}

/// `true` if `name` is a synthetic mnemonic, regardless of arity — used
/// by pass 1 to tell an instruction line from a line of raw data words
/// before any operands have been parsed.
pub fn is_known(name: &str) -> bool {
    matches!(
        name,
        "not" | "neg" | "inc" | "dec" | "clr" | "cmp" | "tst" | "mov" | "nop"
    )
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn nop_expands_to_sethi_zero() {
        let (mnemonic, ops) = expand("nop", &[]).unwrap();
        assert_eq!(mnemonic, "sethi");
        assert_eq!(ops, vec![Operand::Immediate(0), Operand::Register(0)]);
    }

    #[test]
    fn inc_duplicates_its_one_operand() {
        let (mnemonic, ops) = expand("inc", &[Operand::Register(3)]).unwrap();
        assert_eq!(mnemonic, "add");
        assert_eq!(
            ops,
            vec![
                Operand::Register(3),
                Operand::Immediate(1),
                Operand::Register(3)
            ]
        );
    }

    #[test]
    fn unknown_name_returns_none() {
        assert!(expand("add", &[Operand::Register(1)]).is_none());
    }
}
