//! Static descriptor of every real mnemonic in the ISA: primary op, and
//! one of {sethi, branch condition, call, ALU op3, memory op3 + width +
//! store flag}. Synthetic mnemonics (`mov`, `cmp`, ...) are not in this
//! table — they expand to a real instruction first, see [`synthetic`].

pub mod synthetic;

/// The 16 SPARC-style integer condition codes, shared by every branch
/// mnemonic. The 4-bit encodings below match the real SPARC v8 `icc`
/// field so that a disassembler for real SPARC binaries would agree with
/// this one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Bn,
    Be,
    Ble,
    Bl,
    Bleu,
    Bcs,
    Bneg,
    Bvs,
    Ba,
    Bne,
    Bg,
    Bge,
    Bgu,
    Bcc,
    Bpos,
    Bvc,
}

impl Condition {
    pub fn code(self) -> u32 {
        match self {
            Condition::Bn => 0x0,
            Condition::Be => 0x1,
            Condition::Ble => 0x2,
            Condition::Bl => 0x3,
            Condition::Bleu => 0x4,
            Condition::Bcs => 0x5,
            Condition::Bneg => 0x6,
            Condition::Bvs => 0x7,
            Condition::Ba => 0x8,
            Condition::Bne => 0x9,
            Condition::Bg => 0xA,
            Condition::Bge => 0xB,
            Condition::Bgu => 0xC,
            Condition::Bcc => 0xD,
            Condition::Bpos => 0xE,
            Condition::Bvc => 0xF,
        }
    }

    pub fn from_code(code: u32) -> Option<Condition> {
        Some(match code {
            0x0 => Condition::Bn,
            0x1 => Condition::Be,
            0x2 => Condition::Ble,
            0x3 => Condition::Bl,
            0x4 => Condition::Bleu,
            0x5 => Condition::Bcs,
            0x6 => Condition::Bneg,
            0x7 => Condition::Bvs,
            0x8 => Condition::Ba,
            0x9 => Condition::Bne,
            0xA => Condition::Bg,
            0xB => Condition::Bge,
            0xC => Condition::Bgu,
            0xD => Condition::Bcc,
            0xE => Condition::Bpos,
            0xF => Condition::Bvc,
            _ => return None,
        })
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Condition::Bn => "bn",
            Condition::Be => "be",
            Condition::Ble => "ble",
            Condition::Bl => "bl",
            Condition::Bleu => "bleu",
            Condition::Bcs => "bcs",
            Condition::Bneg => "bneg",
            Condition::Bvs => "bvs",
            Condition::Ba => "ba",
            Condition::Bne => "bne",
            Condition::Bg => "bg",
            Condition::Bge => "bge",
            Condition::Bgu => "bgu",
            Condition::Bcc => "bcc",
            Condition::Bpos => "bpos",
            Condition::Bvc => "bvc",
        }
    }

    fn from_mnemonic(name: &str) -> Option<Condition> {
        Some(match name {
            "bn" => Condition::Bn,
            "be" => Condition::Be,
            "ble" => Condition::Ble,
            "bl" => Condition::Bl,
            "bleu" => Condition::Bleu,
            "bcs" => Condition::Bcs,
            "bneg" => Condition::Bneg,
            "bvs" => Condition::Bvs,
            "ba" => Condition::Ba,
            "bne" => Condition::Bne,
            "bg" => Condition::Bg,
            "bge" => Condition::Bge,
            "bgu" => Condition::Bgu,
            "bcc" => Condition::Bcc,
            "bpos" => Condition::Bpos,
            "bvc" => Condition::Bvc,
            _ => return None,
        })
    }
}

/// The 6-bit `op3` field for every ALU-format instruction (primary op
/// `10`). `*cc` variants set bit 4 of `op3` relative to their non-cc
/// counterpart, matching the real SPARC v8 encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Addcc,
    And,
    Andcc,
    Andn,
    Andncc,
    Or,
    Orcc,
    Orn,
    Orncc,
    Xor,
    Xorcc,
    Xnor,
    Xnorcc,
    Sub,
    Subcc,
    Sll,
    Sra,
    Srl,
    Jmpl,
    Rd,
    Wr,
    Rett,
    Ta,
}

impl AluOp {
    pub fn op3(self) -> u32 {
        match self {
            AluOp::Add => 0x00,
            AluOp::And => 0x01,
            AluOp::Or => 0x02,
            AluOp::Xor => 0x03,
            AluOp::Sub => 0x04,
            AluOp::Andn => 0x05,
            AluOp::Orn => 0x06,
            AluOp::Xnor => 0x07,
            AluOp::Addcc => 0x10,
            AluOp::Andcc => 0x11,
            AluOp::Orcc => 0x12,
            AluOp::Xorcc => 0x13,
            AluOp::Subcc => 0x14,
            AluOp::Andncc => 0x15,
            AluOp::Orncc => 0x16,
            AluOp::Xnorcc => 0x17,
            AluOp::Sll => 0x25,
            AluOp::Srl => 0x26,
            AluOp::Sra => 0x27,
            AluOp::Rd => 0x29,
            AluOp::Wr => 0x31,
            AluOp::Jmpl => 0x38,
            AluOp::Rett => 0x39,
            AluOp::Ta => 0x3A,
        }
    }

    pub fn from_op3(op3: u32) -> Option<AluOp> {
        Some(match op3 {
            0x00 => AluOp::Add,
            0x01 => AluOp::And,
            0x02 => AluOp::Or,
            0x03 => AluOp::Xor,
            0x04 => AluOp::Sub,
            0x05 => AluOp::Andn,
            0x06 => AluOp::Orn,
            0x07 => AluOp::Xnor,
            0x10 => AluOp::Addcc,
            0x11 => AluOp::Andcc,
            0x12 => AluOp::Orcc,
            0x13 => AluOp::Xorcc,
            0x14 => AluOp::Subcc,
            0x15 => AluOp::Andncc,
            0x16 => AluOp::Orncc,
            0x17 => AluOp::Xnorcc,
            0x25 => AluOp::Sll,
            0x26 => AluOp::Srl,
            0x27 => AluOp::Sra,
            0x29 => AluOp::Rd,
            0x31 => AluOp::Wr,
            0x38 => AluOp::Jmpl,
            0x39 => AluOp::Rett,
            0x3A => AluOp::Ta,
            _ => return None,
        })
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            AluOp::Add => "add",
            AluOp::Addcc => "addcc",
            AluOp::And => "and",
            AluOp::Andcc => "andcc",
            AluOp::Andn => "andn",
            AluOp::Andncc => "andncc",
            AluOp::Or => "or",
            AluOp::Orcc => "orcc",
            AluOp::Orn => "orn",
            AluOp::Orncc => "orncc",
            AluOp::Xor => "xor",
            AluOp::Xorcc => "xorcc",
            AluOp::Xnor => "xnor",
            AluOp::Xnorcc => "xnorcc",
            AluOp::Sub => "sub",
            AluOp::Subcc => "subcc",
            AluOp::Sll => "sll",
            AluOp::Sra => "sra",
            AluOp::Srl => "srl",
            AluOp::Jmpl => "jmpl",
            AluOp::Rd => "rd",
            AluOp::Wr => "wr",
            AluOp::Rett => "rett",
            AluOp::Ta => "ta",
        }
    }

    fn from_mnemonic(name: &str) -> Option<AluOp> {
        Some(match name {
            "add" => AluOp::Add,
            "addcc" => AluOp::Addcc,
            "and" => AluOp::And,
            "andcc" => AluOp::Andcc,
            "andn" => AluOp::Andn,
            "andncc" => AluOp::Andncc,
            "or" => AluOp::Or,
            "orcc" => AluOp::Orcc,
            "orn" => AluOp::Orn,
            "orncc" => AluOp::Orncc,
            "xor" => AluOp::Xor,
            "xorcc" => AluOp::Xorcc,
            "xnor" => AluOp::Xnor,
            "xnorcc" => AluOp::Xnorcc,
            "sub" => AluOp::Sub,
            "subcc" => AluOp::Subcc,
            "sll" => AluOp::Sll,
            "sra" => AluOp::Sra,
            "srl" => AluOp::Srl,
            "jmpl" => AluOp::Jmpl,
            "rd" => AluOp::Rd,
            "wr" => AluOp::Wr,
            "rett" => AluOp::Rett,
            "ta" => AluOp::Ta,
            _ => return None,
        })
    }

    /// `true` for the `*cc` variants, which update the condition codes.
    pub fn sets_ccr(self) -> bool {
        matches!(
            self,
            AluOp::Addcc
                | AluOp::Andcc
                | AluOp::Orcc
                | AluOp::Xorcc
                | AluOp::Subcc
                | AluOp::Andncc
                | AluOp::Orncc
                | AluOp::Xnorcc
        )
    }
}

/// Width of a memory access in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    Byte = 1,
    Half = 2,
    Word = 4,
}

impl Width {
    pub fn bytes(self) -> u32 {
        self as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemOp {
    Ld,
    Ldub,
    Lduh,
    Ldsb,
    Ldsh,
    St,
    Stb,
    Sth,
}

impl MemOp {
    /// `op3` values match the real SPARC v8 load/store encodings.
    pub fn op3(self) -> u32 {
        match self {
            MemOp::Ld => 0x00,
            MemOp::Ldub => 0x01,
            MemOp::Lduh => 0x02,
            MemOp::St => 0x04,
            MemOp::Stb => 0x05,
            MemOp::Sth => 0x06,
            MemOp::Ldsb => 0x09,
            MemOp::Ldsh => 0x0A,
        }
    }

    pub fn is_store(self) -> bool {
        matches!(self, MemOp::St | MemOp::Stb | MemOp::Sth)
    }

    pub fn width(self) -> Width {
        match self {
            MemOp::Ld | MemOp::St => Width::Word,
            MemOp::Lduh | MemOp::Ldsh | MemOp::Sth => Width::Half,
            MemOp::Ldub | MemOp::Ldsb | MemOp::Stb => Width::Byte,
        }
    }

    /// `true` if loading this width sign-extends into the 32-bit register.
    pub fn is_signed_load(self) -> bool {
        matches!(self, MemOp::Ld | MemOp::Ldsb | MemOp::Ldsh)
    }

    pub fn from_op3_and_store(op3: u32, is_store: bool) -> Option<MemOp> {
        let candidate = match op3 {
            0x00 => MemOp::Ld,
            0x01 => MemOp::Ldub,
            0x02 => MemOp::Lduh,
            0x04 => MemOp::St,
            0x05 => MemOp::Stb,
            0x06 => MemOp::Sth,
            0x09 => MemOp::Ldsb,
            0x0A => MemOp::Ldsh,
            _ => return None,
        };
        (candidate.is_store() == is_store).then_some(candidate)
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            MemOp::Ld => "ld",
            MemOp::Ldub => "ldub",
            MemOp::Lduh => "lduh",
            MemOp::Ldsb => "ldsb",
            MemOp::Ldsh => "ldsh",
            MemOp::St => "st",
            MemOp::Stb => "stb",
            MemOp::Sth => "sth",
        }
    }

    fn from_mnemonic(name: &str) -> Option<MemOp> {
        Some(match name {
            "ld" => MemOp::Ld,
            "ldub" => MemOp::Ldub,
            "lduh" => MemOp::Lduh,
            "ldsb" => MemOp::Ldsb,
            "ldsh" => MemOp::Ldsh,
            "st" => MemOp::St,
            "stb" => MemOp::Stb,
            "sth" => MemOp::Sth,
            _ => return None,
        })
    }
}

/// Every real (non-synthetic) mnemonic, tagged by which instruction
/// format it encodes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mnemonic {
    Sethi,
    Branch(Condition),
    Call,
    Alu(AluOp),
    Memory(MemOp),
    Halt,
}

impl Mnemonic {
    pub fn lookup(name: &str) -> Option<Mnemonic> {
        if name == "sethi" {
            return Some(Mnemonic::Sethi);
        }
        if name == "call" {
            return Some(Mnemonic::Call);
        }
        if name == "halt" {
            return Some(Mnemonic::Halt);
        }
        if let Some(cond) = Condition::from_mnemonic(name) {
            return Some(Mnemonic::Branch(cond));
        }
        if let Some(op) = AluOp::from_mnemonic(name) {
            return Some(Mnemonic::Alu(op));
        }
        if let Some(op) = MemOp::from_mnemonic(name) {
            return Some(Mnemonic::Memory(op));
        }
        None
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Mnemonic::Sethi => "sethi",
            Mnemonic::Branch(cond) => cond.mnemonic(),
            Mnemonic::Call => "call",
            Mnemonic::Alu(op) => op.mnemonic(),
            Mnemonic::Memory(op) => op.mnemonic(),
            Mnemonic::Halt => "halt",
        }
    }
}

/// The distinguished all-ones halt word; not a valid encoding of any
/// other instruction (primary op `11` would otherwise decode it as a
/// memory op3 of `0x3F`, which this ISA doesn't assign).
pub const HALT_WORD: u32 = 0xFFFF_FFFF;
