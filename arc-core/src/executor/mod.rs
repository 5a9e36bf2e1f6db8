//! Single-instruction execution. [`step`] fetches the word at `pc`,
//! decodes it, and dispatches to the per-format module. Faults still
//! advance `pc` by 4 before returning — the caller sees consistent CPU
//! state either way, per the executor's fault contract.

mod alu;
mod branch;
mod mem_ops;
mod special;

use crate::cpu::Cpu;
use crate::decode;
use crate::devices::Devices;
use crate::error::FaultKind;
use crate::instruction::Instruction;
use crate::memory::Memory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    Halted,
}

pub fn step(cpu: &mut Cpu, memory: &mut Memory, devices: &mut Devices) -> Result<StepOutcome, FaultKind> {
    devices.tick();
    let pc = cpu.pc();
    let outcome = run_one(cpu, memory, devices, pc);
    match outcome {
        Ok(StepOutcome::Halted) => Ok(StepOutcome::Halted),
        Ok(StepOutcome::Continue) => Ok(StepOutcome::Continue),
        Err(fault) => {
            cpu.set_pc(pc.wrapping_add(4));
            Err(fault)
        }
    }
}

fn run_one(cpu: &mut Cpu, memory: &mut Memory, devices: &mut Devices, pc: u32) -> Result<StepOutcome, FaultKind> {
    let word = bus_read(memory, devices, pc, 4)?;
    if word == 0 {
        // Uninitialised memory reads as zero; treat it as a harmless nop
        // rather than a decode failure, distinct from the `sethi 0, %r0`
        // encoding that the `nop` synthetic actually expands to.
        cpu.set_pc(pc.wrapping_add(4));
        return Ok(StepOutcome::Continue);
    }
    let instr = decode::decode(word)?;
    if let Instruction::Halt = instr {
        return Ok(StepOutcome::Halted);
    }
    let next_pc = match instr {
        Instruction::Halt => unreachable!("handled above"),
        Instruction::Sethi { imm22, rd } => {
            special::sethi(cpu, imm22, rd);
            pc.wrapping_add(4)
        }
        Instruction::Branch { cond, disp22 } => branch::execute(cpu, pc, cond, disp22),
        Instruction::Call { disp30 } => special::call(cpu, pc, disp30),
        Instruction::Alu { op, rd, rs1, src2 } => alu::execute(cpu, pc, op, rd, rs1, src2)?,
        Instruction::Memory { op, rd, rs1, offset } => {
            mem_ops::execute(cpu, memory, devices, pc, op, rd, rs1, offset)?
        }
    };
    cpu.set_pc(next_pc);
    Ok(StepOutcome::Continue)
}

/// Memory-mapped device registers shadow ordinary memory at their fixed
/// addresses; everything else goes straight to `Memory`.
fn bus_read(memory: &Memory, devices: &mut Devices, addr: u32, size: u32) -> Result<u32, FaultKind> {
    if devices.is_mapped(addr) {
        return Ok(devices.read(addr).expect("is_mapped implies read succeeds"));
    }
    memory.read(addr, size)
}

fn bus_write(memory: &mut Memory, devices: &mut Devices, addr: u32, value: u32, size: u32) -> Result<(), FaultKind> {
    if devices.write(addr, value) {
        return Ok(());
    }
    memory.write(addr, value, size)
}
