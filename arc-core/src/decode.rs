//! Inverse of [`crate::encode::encode`], plus a disassembly formatter
//! (spec.md §4.13's supplemented listing feature).

use crate::error::FaultKind;
use crate::instruction::{AluSrc, Instruction};
use crate::isa::{AluOp, Condition, MemOp, HALT_WORD};
use crate::numeric;

pub fn decode(word: u32) -> Result<Instruction, FaultKind> {
    if word == HALT_WORD {
        return Ok(Instruction::Halt);
    }
    match field(word, 31, 30) {
        0b00 => decode_branch_or_sethi(word),
        0b01 => Ok(Instruction::Call {
            disp30: sign_extend(field(word, 29, 0), 30),
        }),
        0b10 => decode_format3(word, false),
        0b11 => decode_format3(word, true),
        _ => unreachable!("a 2-bit field only has 4 values"),
    }
}

fn decode_branch_or_sethi(word: u32) -> Result<Instruction, FaultKind> {
    match field(word, 24, 22) {
        0b100 => Ok(Instruction::Sethi {
            imm22: field(word, 21, 0),
            rd: field(word, 29, 25),
        }),
        0b010 => {
            let cond = Condition::from_code(field(word, 28, 25))
                .ok_or(FaultKind::BinaryDecodeError { word })?;
            Ok(Instruction::Branch {
                cond,
                disp22: sign_extend(field(word, 21, 0), 22),
            })
        }
        _ => Err(FaultKind::BinaryDecodeError { word }),
    }
}

fn decode_format3(word: u32, is_memory: bool) -> Result<Instruction, FaultKind> {
    let rd = field(word, 29, 25);
    let op3 = field(word, 24, 19);
    let rs1 = field(word, 18, 14);
    let src2 = if field(word, 13, 13) == 1 {
        AluSrc::Imm(sign_extend(field(word, 12, 0), 13))
    } else {
        AluSrc::Reg(field(word, 4, 0))
    };
    if is_memory {
        let op = MemOp::from_op3_and_store(op3, true)
            .or_else(|| MemOp::from_op3_and_store(op3, false))
            .ok_or(FaultKind::BinaryDecodeError { word })?;
        Ok(Instruction::Memory { op, rd, rs1, offset: src2 })
    } else {
        let op = AluOp::from_op3(op3).ok_or(FaultKind::BinaryDecodeError { word })?;
        Ok(Instruction::Alu { op, rd, rs1, src2 })
    }
}

fn field(word: u32, hi: u32, lo: u32) -> u32 {
    let width = hi - lo + 1;
    let mask = if width == 32 { u32::MAX } else { (1u32 << width) - 1 };
    (word >> lo) & mask
}

fn sign_extend(value: u32, bits: u32) -> i32 {
    numeric::sign_extend(value as u64, bits) as i32
}

/// Renders a single decoded instruction the way the assembler's own
/// syntax would write it back, for `arc-cli`'s `--disassemble` listing.
pub fn disassemble(word: u32) -> String {
    match decode(word) {
        Err(_) => format!(".word 0x{word:08x}"),
        Ok(Instruction::Halt) => "halt".to_string(),
        Ok(Instruction::Sethi { imm22, rd }) => format!("sethi 0x{imm22:x}, %r{rd}"),
        Ok(Instruction::Branch { cond, disp22 }) => format!("{} {disp22}", cond.mnemonic()),
        Ok(Instruction::Call { disp30 }) => format!("call {disp30}"),
        Ok(Instruction::Alu { op: AluOp::Rd, rd, .. }) => format!("rd %psr, %r{rd}"),
        Ok(Instruction::Alu { op: AluOp::Wr, rs1, src2, .. }) => {
            format!("wr %r{rs1}, {}, %psr", src_text(src2))
        }
        Ok(Instruction::Alu { op: op @ (AluOp::Ta | AluOp::Rett), rs1, src2, .. }) => {
            format!("{} %r{rs1}, {}", op.mnemonic(), src_text(src2))
        }
        Ok(Instruction::Alu { op, rd, rs1, src2 }) => {
            format!("{} %r{rs1}, {}, %r{rd}", op.mnemonic(), src_text(src2))
        }
        Ok(Instruction::Memory { op, rd, rs1, offset }) => {
            if op.is_store() {
                format!("{} %r{rd}, [%r{rs1}+{}]", op.mnemonic(), src_text(offset))
            } else {
                format!("{} [%r{rs1}+{}], %r{rd}", op.mnemonic(), src_text(offset))
            }
        }
    }
}

fn src_text(src: AluSrc) -> String {
    match src {
        AluSrc::Reg(n) => format!("%r{n}"),
        AluSrc::Imm(n) => n.to_string(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unassigned_word_is_a_decode_error() {
        // op=11 (memory format), op3=0x3F is not assigned to any MemOp.
        let word = (0b11u32 << 30) | (0x3F << 19);
        assert_eq!(decode(word).unwrap_err(), FaultKind::BinaryDecodeError { word });
    }

    #[test]
    fn disassembles_halt() {
        assert_eq!(disassemble(HALT_WORD), "halt");
    }

    #[test]
    fn disassembles_an_immediate_add() {
        let word = crate::encode::encode(&Instruction::Alu {
            op: AluOp::Add,
            rd: 1,
            rs1: 0,
            src2: AluSrc::Imm(5),
        });
        assert_eq!(disassemble(word), "add %r0, 5, %r1");
    }

    #[test]
    fn disassembles_a_store_with_the_register_operand_first() {
        let word = crate::encode::encode(&Instruction::Memory {
            op: MemOp::St,
            rd: 2,
            rs1: 1,
            offset: AluSrc::Imm(4),
        });
        assert_eq!(disassemble(word), "st %r2, [%r1+4]");
    }

    #[test]
    fn disassembled_store_text_reassembles_to_the_same_word() {
        let word = crate::encode::encode(&Instruction::Memory {
            op: MemOp::St,
            rd: 2,
            rs1: 1,
            offset: AluSrc::Imm(4),
        });
        let line = disassemble(word);
        let program = crate::assembler::assemble(&format!("{line}\nhalt\n")).unwrap();
        assert_eq!(program.memory.read(0, 4).unwrap(), word);
    }

    #[test]
    fn disassembles_rd_and_wr_with_the_psr_pseudo_register() {
        let rd_word = crate::encode::encode(&Instruction::Alu {
            op: AluOp::Rd,
            rd: 3,
            rs1: 0,
            src2: AluSrc::Imm(0),
        });
        assert_eq!(disassemble(rd_word), "rd %psr, %r3");

        let wr_word = crate::encode::encode(&Instruction::Alu {
            op: AluOp::Wr,
            rd: 0,
            rs1: 1,
            src2: AluSrc::Imm(5),
        });
        assert_eq!(disassemble(wr_word), "wr %r1, 5, %psr");
    }

    #[test]
    fn disassembled_rd_and_wr_reassemble_to_the_same_word() {
        for word in [
            crate::encode::encode(&Instruction::Alu {
                op: AluOp::Rd,
                rd: 7,
                rs1: 0,
                src2: AluSrc::Imm(0),
            }),
            crate::encode::encode(&Instruction::Alu {
                op: AluOp::Wr,
                rd: 0,
                rs1: 2,
                src2: AluSrc::Imm(-1),
            }),
        ] {
            let line = disassemble(word);
            let program = crate::assembler::assemble(&format!("{line}\nhalt\n")).unwrap();
            assert_eq!(program.memory.read(0, 4).unwrap(), word);
        }
    }
}
