//! Pass 2: replays pass 1's statements, resolving every operand to a
//! concrete [`Instruction`] and encoding it into memory. Symbols are
//! now fully populated, so this is where forward references actually
//! resolve (in [`EvalMode::Lenient`] — an undefined symbol here is a
//! warning, not a hard error, since pass 1 already validated every
//! *defined* label and `.equ`).

use super::pass1::{Pass1Output, Statement, StatementKind};
use crate::encode;
use crate::error::{AsmError, Warning};
use crate::expr::{self, EvalMode};
use crate::instruction::{AluSrc, Instruction};
use crate::isa::{AluOp, MemOp, Mnemonic};
use crate::isa::synthetic;
use crate::memory::Memory;
use crate::symbol::SymbolTable;
use crate::token::{MemoryOperand, Operand};

const IMM13_MIN: i64 = -(1 << 12);
const IMM13_MAX: i64 = (1 << 12) - 1;
const IMM22_MAX: i64 = (1 << 22) - 1;
const DISP22_MIN: i64 = -(1 << 21);
const DISP22_MAX: i64 = (1 << 21) - 1;
const DISP30_MIN: i64 = -(1 << 29);
const DISP30_MAX: i64 = (1 << 29) - 1;

pub fn run(pass1: Pass1Output) -> Result<(Memory, Vec<(u32, u32)>, Vec<Warning>), AsmError> {
    let mut memory = Memory::new();
    let mut listing = Vec::with_capacity(pass1.statements.len());
    let mut warnings = Vec::new();

    for statement in &pass1.statements {
        let word = match &statement.kind {
            StatementKind::ZeroWord => 0,
            StatementKind::Data(text) => {
                eval_lenient(text, &pass1.symbols, statement.line, &mut warnings)? as u32
            }
            StatementKind::Instruction { mnemonic, operands } => {
                let instr = build(mnemonic, operands, statement, &pass1.symbols, &mut warnings)?;
                encode::encode(&instr)
            }
        };
        memory
            .write(statement.address, word, 4)
            .expect("statement addresses are always word-aligned");
        listing.push((statement.address, word));
    }

    Ok((memory, listing, warnings))
}

fn build(
    mnemonic: &str,
    operands: &[Operand],
    statement: &Statement,
    symbols: &SymbolTable,
    warnings: &mut Vec<Warning>,
) -> Result<Instruction, AsmError> {
    let line = statement.line;
    let (real, resolved_operands) = resolve_real(mnemonic, operands).ok_or_else(|| AsmError::UnknownMnemonic {
        line,
        mnemonic: mnemonic.to_string(),
    })?;

    // Shape mismatches (wrong operand count, a register where an
    // expression was required, an out-of-range immediate) all report as
    // the same `InvalidOperands`; only `evaluate`'s own errors (notably
    // `DivZero`) are distinct and propagate as themselves via `?`.
    let invalid = || AsmError::InvalidOperands {
        line,
        mnemonic: real.mnemonic().to_string(),
        tokens: resolved_operands.iter().map(display_operand).collect(),
    };

    match real {
        Mnemonic::Halt => {
            if !resolved_operands.is_empty() {
                return Err(invalid());
            }
            Ok(Instruction::Halt)
        }
        Mnemonic::Sethi => {
            let [value_op, rd_op] = take2(&resolved_operands).ok_or_else(invalid)?;
            let rd = reg_of(rd_op).ok_or_else(invalid)?;
            let value = value_of(value_op, symbols, line, warnings)?.ok_or_else(invalid)?;
            if !(0..=IMM22_MAX).contains(&value) {
                return Err(invalid());
            }
            Ok(Instruction::Sethi { imm22: value as u32, rd })
        }
        Mnemonic::Branch(cond) => {
            let [target_op] = take1(&resolved_operands).ok_or_else(invalid)?;
            let target = value_of(target_op, symbols, line, warnings)?.ok_or_else(invalid)?;
            let disp_words = (target - statement.address as i64) / 4;
            if !(DISP22_MIN..=DISP22_MAX).contains(&disp_words) {
                return Err(invalid());
            }
            Ok(Instruction::Branch { cond, disp22: disp_words as i32 })
        }
        Mnemonic::Call => {
            let [target_op] = take1(&resolved_operands).ok_or_else(invalid)?;
            let target = value_of(target_op, symbols, line, warnings)?.ok_or_else(invalid)?;
            let disp_words = (target - statement.address as i64) / 4;
            if !(DISP30_MIN..=DISP30_MAX).contains(&disp_words) {
                return Err(invalid());
            }
            Ok(Instruction::Call { disp30: disp_words as i32 })
        }
        Mnemonic::Alu(AluOp::Rd) => {
            // `rd %psr, %rD` — reads the trap base register; rs1 is
            // implicitly %r0.
            let [psr_op, rd_op] = take2(&resolved_operands).ok_or_else(invalid)?;
            if !matches!(psr_op, Operand::Psr) {
                return Err(invalid());
            }
            let rd = reg_of(rd_op).ok_or_else(invalid)?;
            Ok(Instruction::Alu { op: AluOp::Rd, rd, rs1: 0, src2: AluSrc::Imm(0) })
        }
        Mnemonic::Alu(AluOp::Wr) => {
            // `wr %rs1, (rs2|imm), %psr` — the destination is the
            // pseudo-register %psr, not a numbered register, so rd is
            // implicitly %r0.
            let [rs1_op, src2_op, psr_op] = take3(&resolved_operands).ok_or_else(invalid)?;
            if !matches!(psr_op, Operand::Psr) {
                return Err(invalid());
            }
            let rs1 = reg_of(rs1_op).ok_or_else(invalid)?;
            let src2 = alu_src(src2_op, symbols, line, warnings)?.ok_or_else(invalid)?;
            Ok(Instruction::Alu { op: AluOp::Wr, rd: 0, rs1, src2 })
        }
        Mnemonic::Alu(op @ (AluOp::Ta | AluOp::Rett)) => {
            // `ta`/`rett` take one or two operands (rs1, and an optional
            // rs2-or-immediate); rd is always implicitly %r0.
            let (rs1_op, src2) = match resolved_operands.as_slice() {
                [rs1_op] => (rs1_op, AluSrc::Imm(0)),
                [rs1_op, src2_op] => {
                    let src2 = alu_src(src2_op, symbols, line, warnings)?.ok_or_else(invalid)?;
                    (rs1_op, src2)
                }
                _ => return Err(invalid()),
            };
            let rs1 = reg_of(rs1_op).ok_or_else(invalid)?;
            Ok(Instruction::Alu { op, rd: 0, rs1, src2 })
        }
        Mnemonic::Alu(op) => {
            let [rs1_op, src2_op, rd_op] = take3(&resolved_operands).ok_or_else(invalid)?;
            let rs1 = reg_of(rs1_op).ok_or_else(invalid)?;
            let rd = reg_of(rd_op).ok_or_else(invalid)?;
            let src2 = alu_src(src2_op, symbols, line, warnings)?.ok_or_else(invalid)?;
            Ok(Instruction::Alu { op, rd, rs1, src2 })
        }
        Mnemonic::Memory(op) => {
            let instr = build_memory(op, &resolved_operands, symbols, line, warnings)?;
            instr.ok_or_else(invalid)
        }
    }
}

fn build_memory(
    op: MemOp,
    operands: &[Operand],
    symbols: &SymbolTable,
    line: u32,
    warnings: &mut Vec<Warning>,
) -> Result<Option<Instruction>, AsmError> {
    let Some([first, second]) = take2(operands) else {
        return Ok(None);
    };
    // Loads read into a register from memory; stores write a register's
    // value into memory. Either way one operand is the register, the
    // other the memory operand — which is which depends on direction.
    let (reg_op, mem_op) = if op.is_store() { (first, second) } else { (second, first) };
    let Some(rd) = reg_of(reg_op) else {
        return Ok(None);
    };
    let memory_operand = match mem_op {
        Operand::Memory(m) => m,
        _ => return Ok(None),
    };
    let (rs1, offset) = match memory_operand {
        MemoryOperand::Reg(r) => (*r, AluSrc::Imm(0)),
        MemoryOperand::RegPlusReg(r1, r2) => (*r1, AluSrc::Reg(*r2)),
        MemoryOperand::RegPlusImm(r, text) => {
            let value = eval_lenient(text, symbols, line, warnings)?;
            match imm13(value) {
                Some(offset) => (*r, offset),
                None => return Ok(None),
            }
        }
        MemoryOperand::Imm(text) => {
            let value = eval_lenient(text, symbols, line, warnings)?;
            match imm13(value) {
                Some(offset) => (0, offset),
                None => return Ok(None),
            }
        }
    };
    Ok(Some(Instruction::Memory { op, rd, rs1, offset }))
}

fn resolve_real(mnemonic: &str, operands: &[Operand]) -> Option<(Mnemonic, Vec<Operand>)> {
    if let Some((name, expanded)) = synthetic::expand(mnemonic, operands) {
        return Mnemonic::lookup(name).map(|m| (m, expanded));
    }
    Mnemonic::lookup(mnemonic).map(|m| (m, operands.to_vec()))
}

/// `Ok(None)` means the operand's shape doesn't carry a value at all
/// (e.g. a register where a literal/symbol was expected) — a shape
/// error for the caller to report. `Err` is a genuine evaluation error
/// (`DivZero`) that should propagate as itself.
fn value_of(
    op: &Operand,
    symbols: &SymbolTable,
    line: u32,
    warnings: &mut Vec<Warning>,
) -> Result<Option<i64>, AsmError> {
    match op {
        Operand::Immediate(n) => Ok(Some(*n)),
        Operand::Expr(text) => eval_lenient(text, symbols, line, warnings).map(Some),
        _ => Ok(None),
    }
}

fn alu_src(
    op: &Operand,
    symbols: &SymbolTable,
    line: u32,
    warnings: &mut Vec<Warning>,
) -> Result<Option<AluSrc>, AsmError> {
    match op {
        Operand::Register(n) => Ok(Some(AluSrc::Reg(*n))),
        _ => match value_of(op, symbols, line, warnings)? {
            Some(value) => Ok(imm13(value)),
            None => Ok(None),
        },
    }
}

fn imm13(value: i64) -> Option<AluSrc> {
    if !(IMM13_MIN..=IMM13_MAX).contains(&value) {
        return None;
    }
    Some(AluSrc::Imm(value as i32))
}

fn eval_lenient(text: &str, symbols: &SymbolTable, line: u32, warnings: &mut Vec<Warning>) -> Result<i64, AsmError> {
    expr::evaluate(text, symbols, EvalMode::Lenient, line, warnings)
}

fn reg_of(op: &Operand) -> Option<u32> {
    match op {
        Operand::Register(n) => Some(*n),
        _ => None,
    }
}

fn take1(ops: &[Operand]) -> Option<[&Operand; 1]> {
    match ops {
        [a] => Some([a]),
        _ => None,
    }
}

fn take2(ops: &[Operand]) -> Option<[&Operand; 2]> {
    match ops {
        [a, b] => Some([a, b]),
        _ => None,
    }
}

fn take3(ops: &[Operand]) -> Option<[&Operand; 3]> {
    match ops {
        [a, b, c] => Some([a, b, c]),
        _ => None,
    }
}

fn display_operand(op: &Operand) -> String {
    match op {
        Operand::Register(n) => format!("%r{n}"),
        Operand::Immediate(n) => n.to_string(),
        Operand::Expr(text) => text.clone(),
        Operand::Memory(MemoryOperand::Reg(r)) => format!("[%r{r}]"),
        Operand::Memory(MemoryOperand::RegPlusReg(r1, r2)) => format!("[%r{r1}+%r{r2}]"),
        Operand::Memory(MemoryOperand::RegPlusImm(r, text)) => format!("[%r{r}+{text}]"),
        Operand::Memory(MemoryOperand::Imm(text)) => format!("[{text}]"),
        Operand::Psr => "%psr".to_string(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::assembler::pass1;

    fn assemble(source: &str) -> (Memory, Vec<Warning>) {
        let pass1 = pass1::run(source).unwrap();
        let (memory, _listing, warnings) = run(pass1).unwrap();
        (memory, warnings)
    }

    #[test]
    fn halt_encodes_to_all_ones() {
        let (memory, _) = assemble("halt\n");
        assert_eq!(memory.read(0, 4).unwrap(), 0xFFFF_FFFF);
    }

    #[test]
    fn immediate_add_encodes() {
        let (memory, _) = assemble("add %r0, 5, %r1\n");
        let instr = crate::decode::decode(memory.read(0, 4).unwrap()).unwrap();
        assert_eq!(
            instr,
            Instruction::Alu {
                op: AluOp::Add,
                rd: 1,
                rs1: 0,
                src2: AluSrc::Imm(5),
            }
        );
    }

    #[test]
    fn forward_branch_resolves_to_a_positive_displacement() {
        let (memory, warnings) = assemble("be target\nhalt\ntarget: halt\n");
        assert!(warnings.is_empty());
        let instr = crate::decode::decode(memory.read(0, 4).unwrap()).unwrap();
        assert_eq!(
            instr,
            Instruction::Branch {
                cond: crate::isa::Condition::Be,
                disp22: 2,
            }
        );
    }

    #[test]
    fn undefined_symbol_in_pass_two_warns_and_assumes_zero() {
        let (_, warnings) = assemble("add %r0, missing, %r1\n");
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn a_bare_numeric_line_is_written_as_a_raw_data_word() {
        let (memory, warnings) = assemble("x: 42\nld [x], %r1\nhalt\n");
        assert!(warnings.is_empty());
        assert_eq!(memory.read(0, 4).unwrap(), 42);
    }

    #[test]
    fn store_then_load_round_trip_through_memory() {
        let (memory, _) = assemble("st %r1, [%r2+4]\nld [%r2+4], %r3\nhalt\n");
        let store = crate::decode::decode(memory.read(0, 4).unwrap()).unwrap();
        let load = crate::decode::decode(memory.read(4, 4).unwrap()).unwrap();
        assert_eq!(
            store,
            Instruction::Memory {
                op: MemOp::St,
                rd: 1,
                rs1: 2,
                offset: AluSrc::Imm(4)
            }
        );
        assert_eq!(
            load,
            Instruction::Memory {
                op: MemOp::Ld,
                rd: 3,
                rs1: 2,
                offset: AluSrc::Imm(4)
            }
        );
    }

    #[test]
    fn rd_psr_reads_into_a_register_with_rs1_implicitly_zero() {
        let (memory, _) = assemble("rd %psr, %r5\nhalt\n");
        let instr = crate::decode::decode(memory.read(0, 4).unwrap()).unwrap();
        assert_eq!(
            instr,
            Instruction::Alu { op: AluOp::Rd, rd: 5, rs1: 0, src2: AluSrc::Imm(0) }
        );
    }

    #[test]
    fn wr_psr_writes_into_the_trap_base_register_with_rd_implicitly_zero() {
        let (memory, _) = assemble("wr %r1, 0xF0, %psr\nhalt\n");
        let instr = crate::decode::decode(memory.read(0, 4).unwrap()).unwrap();
        assert_eq!(
            instr,
            Instruction::Alu { op: AluOp::Wr, rd: 0, rs1: 1, src2: AluSrc::Imm(0xF0) }
        );
    }

    #[test]
    fn ta_accepts_one_or_two_operands() {
        let (memory, _) = assemble("ta %r1\nta %r1, 2\nhalt\n");
        assert_eq!(
            crate::decode::decode(memory.read(0, 4).unwrap()).unwrap(),
            Instruction::Alu { op: AluOp::Ta, rd: 0, rs1: 1, src2: AluSrc::Imm(0) }
        );
        assert_eq!(
            crate::decode::decode(memory.read(4, 4).unwrap()).unwrap(),
            Instruction::Alu { op: AluOp::Ta, rd: 0, rs1: 1, src2: AluSrc::Imm(2) }
        );
    }

    #[test]
    fn rd_without_the_psr_operand_is_rejected() {
        let err = pass1::run("rd %r1, %r5\nhalt\n")
            .and_then(|p1| run(p1).map(|_| ()))
            .unwrap_err();
        assert!(matches!(err, AsmError::InvalidOperands { .. }));
    }

    #[test]
    fn register_window_aliases_assemble_to_the_same_word_as_the_plain_register() {
        let (aliased, _) = assemble("add %g0, 5, %o0\nhalt\n");
        let (plain, _) = assemble("add %r0, 5, %r8\nhalt\n");
        assert_eq!(aliased.read(0, 4).unwrap(), plain.read(0, 4).unwrap());
    }
}
