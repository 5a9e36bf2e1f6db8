//! Line -> token list. This is lexical only: it recognizes labels,
//! directives, and bracketed memory operands as shapes, but doesn't yet
//! know whether a bare word is a register, an immediate, or a forward
//! symbol reference — that's resolved against the operand grammar for
//! whichever mnemonic is being assembled (see `assembler::operand`).

/// One lexical unit on a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineToken {
    /// A label definition (`main:`); the colon has already been stripped.
    Label(String),
    /// A directive keyword, including its leading dot (`.org`, `.equ`).
    Directive(String),
    /// Anything else: a mnemonic, a register, a bracketed memory operand
    /// (kept as one token, brackets and all, internal whitespace
    /// removed), or an arithmetic expression.
    Word(String),
}

/// A parsed operand, used once a mnemonic's expected shape has
/// disambiguated a [`LineToken::Word`] into something concrete. Built
/// either by evaluating source text against the symbol table, or
/// synthesized directly by [`crate::isa::synthetic::expand`].
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Register(u32),
    Immediate(i64),
    /// Unevaluated source text (a numeric literal, a symbol, or an infix
    /// arithmetic expression) to resolve via the expression evaluator.
    Expr(String),
    Memory(MemoryOperand),
    /// The `%psr` pseudo-register `rd`/`wr` read and write; it never
    /// carries a register number of its own (see `build_psr_form` in
    /// `assembler::pass2`).
    Psr,
}

/// The four memory-operand shapes the ISA accepts, with or without
/// surrounding brackets (brackets are required for loads, optional for
/// stores — see the encoder).
#[derive(Debug, Clone, PartialEq)]
pub enum MemoryOperand {
    Imm(String),
    Reg(u32),
    RegPlusReg(u32, u32),
    RegPlusImm(u32, String),
}

/// Strips a line down to tokens. Comments start with `!` and run to the
/// end of the line.
pub fn tokenize_line(raw: &str) -> Vec<LineToken> {
    let without_comment = strip_comment(raw);
    let mut tokens = Vec::new();
    let mut chars = without_comment.chars().peekable();
    let mut is_first_word = true;

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() || c == ',' {
            chars.next();
            continue;
        }

        if c == '[' {
            tokens.push(LineToken::Word(take_bracketed(&mut chars)));
            is_first_word = false;
            continue;
        }

        let word = take_word(&mut chars);
        tokens.push(classify_word(word, is_first_word));
        is_first_word = false;
    }

    tokens
}

fn strip_comment(line: &str) -> &str {
    match line.find('!') {
        Some(index) => &line[..index],
        None => line,
    }
}

fn take_bracketed(chars: &mut std::iter::Peekable<std::str::Chars>) -> String {
    let mut buf = String::new();
    buf.push(chars.next().expect("caller peeked '['"));
    for ch in chars.by_ref() {
        if ch.is_whitespace() {
            continue;
        }
        buf.push(ch);
        if ch == ']' {
            break;
        }
    }
    buf
}

fn take_word(chars: &mut std::iter::Peekable<std::str::Chars>) -> String {
    let mut buf = String::new();
    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() || ch == ',' {
            break;
        }
        buf.push(ch);
        chars.next();
    }
    buf
}

fn classify_word(word: String, is_first_word: bool) -> LineToken {
    if is_first_word {
        if let Some(name) = word.strip_suffix(':') {
            return LineToken::Label(name.to_string());
        }
    }
    if word.starts_with('.') {
        return LineToken::Directive(word.to_ascii_lowercase());
    }
    LineToken::Word(word)
}
