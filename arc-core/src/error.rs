//! Error taxonomy for the assembler and the executor.
//!
//! The assembler and the executor fail in different ways (the assembler
//! aborts translation and attaches a source line; the executor raises a
//! fault mid-run and leaves CPU state inspectable), so they get distinct
//! enums rather than one grab-bag `Error`.

use thiserror::Error;

/// A hard error raised while translating source text. Carries the
/// 1-based source line so the CLI can point at the offending line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AsmError {
    #[error("line {line}: invalid numeric literal `{text}`")]
    InvalidNumeric { line: u32, text: String },

    #[error("line {line}: invalid operands for `{mnemonic}`: {tokens:?}")]
    InvalidOperands {
        line: u32,
        mnemonic: String,
        tokens: Vec<String>,
    },

    #[error("line {line}: unknown mnemonic `{mnemonic}`")]
    UnknownMnemonic { line: u32, mnemonic: String },

    #[error("line {line}: unknown symbol `{name}`")]
    UnknownSymbol { line: u32, name: String },

    #[error("line {line}: address {address:#x} is not a multiple of {modulus}")]
    AlignmentError {
        line: u32,
        address: i64,
        modulus: u32,
    },

    #[error("line {line}: address {address:#x} is out of the 32-bit address space")]
    AddressOutOfRange { line: u32, address: i64 },

    #[error("line {line}: unterminated `.begin` / `.end` block")]
    UnterminatedBlock { line: u32 },

    #[error("line {line}: division by zero")]
    DivZero { line: u32 },

    #[error("line {line}: `.if` / `.endif` are not implemented")]
    NotImplemented { line: u32 },
}

impl AsmError {
    /// The 1-based source line this error was raised on.
    pub fn line(&self) -> u32 {
        match self {
            AsmError::InvalidNumeric { line, .. }
            | AsmError::InvalidOperands { line, .. }
            | AsmError::UnknownMnemonic { line, .. }
            | AsmError::UnknownSymbol { line, .. }
            | AsmError::AlignmentError { line, .. }
            | AsmError::AddressOutOfRange { line, .. }
            | AsmError::UnterminatedBlock { line }
            | AsmError::DivZero { line }
            | AsmError::NotImplemented { line } => *line,
        }
    }
}

/// A non-fatal condition accumulated during assembly (currently just
/// forward/undefined symbol references resolved to the placeholder `0`
/// during pass 2, per spec: pass-1 address arithmetic must still see a
/// value, so these warn instead of aborting).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub line: u32,
    pub message: String,
}

/// A fault raised by the executor mid-run. Unlike `AsmError` this never
/// aborts the whole program: `Simulator::run` stops the batch, the CPU
/// state remains exactly as it was after the faulting instruction's PC
/// was advanced (see spec: "still advance pc += 4 ... and re-raise").
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    #[error("address {address:#010x} is not a multiple of {modulus}")]
    AlignmentError { address: u32, modulus: u32 },

    #[error("address {address:#010x} is out of range")]
    AddressOutOfRange { address: u64 },

    #[error("invalid operands for instruction word {word:#010x}")]
    InvalidOperands { word: u32 },

    #[error("instruction word {word:#010x} does not match any known opcode")]
    BinaryDecodeError { word: u32 },
}
