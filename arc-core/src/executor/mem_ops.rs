//! Load/store instructions. Effective address is `rs1 + offset`; stores
//! read `rd` as the source register, loads write it as the destination.

use crate::cpu::Cpu;
use crate::devices::Devices;
use crate::error::FaultKind;
use crate::instruction::AluSrc;
use crate::isa::MemOp;
use crate::memory::Memory;
use crate::numeric;

#[allow(clippy::too_many_arguments)]
pub fn execute(
    cpu: &mut Cpu,
    memory: &mut Memory,
    devices: &mut Devices,
    pc: u32,
    op: MemOp,
    rd: u32,
    rs1: u32,
    offset: AluSrc,
) -> Result<u32, FaultKind> {
    let offset_value = match offset {
        AluSrc::Reg(n) => cpu.reg(n),
        AluSrc::Imm(v) => v as u32,
    };
    let addr = cpu.reg(rs1).wrapping_add(offset_value);
    let width = op.width().bytes();

    if op.is_store() {
        super::bus_write(memory, devices, addr, cpu.reg(rd), width)?;
    } else {
        let raw = super::bus_read(memory, devices, addr, width)?;
        let value = if op.is_signed_load() {
            numeric::sign_extend(raw as u64, width * 8) as u32
        } else {
            raw
        };
        cpu.set_reg(rd, value);
    }
    Ok(pc.wrapping_add(4))
}
