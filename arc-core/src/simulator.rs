//! The harness a host (`arc-cli`, or any other frontend) drives: owns
//! the CPU, memory, and devices, and exposes breakpoints plus
//! step/run/load. Single-threaded cooperative — `run` yields control
//! to its caller after each batch so the host can deliver keystrokes
//! or a stop request between batches.

use std::collections::HashSet;

use tracing::trace;

use crate::assembler::AssembledProgram;
use crate::cpu::{ConditionCodes, Cpu};
use crate::devices::Devices;
use crate::error::{AsmError, FaultKind};
use crate::executor::{self, StepOutcome};
use crate::memory::Memory;

/// Instructions executed per `run` batch before yielding to the host,
/// so long-running programs stay responsive to stop requests.
const BATCH_SIZE: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Halted,
    BreakpointHit(u32),
    Fault(FaultKind),
    Stopped,
}

pub struct Simulator {
    pub cpu: Cpu,
    pub memory: Memory,
    pub devices: Devices,
    breakpoints: HashSet<u32>,
}

impl Simulator {
    pub fn new() -> Simulator {
        Simulator {
            cpu: Cpu::new(),
            memory: Memory::new(),
            devices: Devices::new(),
            breakpoints: HashSet::new(),
        }
    }

    pub fn add_breakpoint(&mut self, addr: u32) {
        self.breakpoints.insert(addr);
    }

    pub fn remove_breakpoint(&mut self, addr: u32) {
        self.breakpoints.remove(&addr);
    }

    pub fn clear_breakpoints(&mut self) {
        self.breakpoints.clear();
    }

    pub fn has_breakpoint(&self, addr: u32) -> bool {
        self.breakpoints.contains(&addr)
    }

    pub fn step(&mut self) -> Result<StepOutcome, FaultKind> {
        executor::step(&mut self.cpu, &mut self.memory, &mut self.devices)
    }

    /// Runs in batches of [`BATCH_SIZE`], checking breakpoints before
    /// every instruction except the first of a batch (so resuming from
    /// a stop doesn't immediately re-trigger it). `should_stop` is
    /// polled once between batches.
    pub fn run(&mut self, mut should_stop: impl FnMut() -> bool) -> RunOutcome {
        loop {
            for i in 0..BATCH_SIZE {
                if i > 0 && self.breakpoints.contains(&self.cpu.pc()) {
                    return RunOutcome::BreakpointHit(self.cpu.pc());
                }
                match self.step() {
                    Ok(StepOutcome::Continue) => {}
                    Ok(StepOutcome::Halted) => {
                        trace!(pc = self.cpu.pc(), "halted");
                        return RunOutcome::Halted;
                    }
                    Err(fault) => return RunOutcome::Fault(fault),
                }
            }
            if should_stop() {
                return RunOutcome::Stopped;
            }
        }
    }

    pub fn on_console_write(&mut self, callback: impl FnMut(u8) + 'static) {
        self.devices.on_console_write(callback);
    }

    pub fn deliver_keystroke(&mut self, byte: u8) {
        self.devices.deliver_keystroke(byte);
    }

    /// Loads a freshly assembled program: replaces memory wholesale and
    /// parks the PC at its entry point.
    pub fn load_program(&mut self, program: AssembledProgram) {
        self.memory = program.memory;
        self.cpu.set_pc(program.start_address);
    }

    /// Loads a machine-code listing in the text form spec.md §6 defines:
    /// a header line giving the starting PC in hex, then `ADDR\tWORD`
    /// hex pairs, one per line.
    pub fn load_image(&mut self, listing: &str) -> Result<u32, AsmError> {
        let mut lines = listing.lines().enumerate();
        let (_, header) = lines.next().ok_or(AsmError::InvalidNumeric {
            line: 1,
            text: String::new(),
        })?;
        let start = parse_hex_word(header.trim(), 1)?;
        for (index, line) in lines {
            let line_no = index as u32 + 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut columns = line.splitn(2, '\t');
            let addr_text = columns.next().unwrap_or("");
            let word_text = columns.next().ok_or(AsmError::InvalidNumeric {
                line: line_no,
                text: line.to_string(),
            })?;
            let addr = parse_hex_word(addr_text, line_no)?;
            let word = parse_hex_word(word_text, line_no)?;
            self.memory
                .write(addr, word, 4)
                .map_err(|_| AsmError::AddressOutOfRange { line: line_no, address: addr as i64 })?;
        }
        self.cpu.set_pc(start);
        Ok(start)
    }

    pub fn read_register(&self, index: u32) -> u32 {
        self.cpu.reg(index)
    }

    pub fn write_register(&mut self, index: u32, value: u32) {
        self.cpu.set_reg(index, value);
    }

    pub fn read_pc(&self) -> u32 {
        self.cpu.pc()
    }

    pub fn write_pc(&mut self, value: u32) {
        self.cpu.set_pc(value);
    }

    /// Packs N/Z/V/C into bits 3/2/1/0 of a 4-bit mask.
    pub fn read_ccr(&self) -> u32 {
        let ccr = self.cpu.ccr;
        (ccr.n as u32) << 3 | (ccr.z as u32) << 2 | (ccr.v as u32) << 1 | (ccr.c as u32)
    }

    pub fn write_ccr(&mut self, mask: u32) {
        self.cpu.ccr = ConditionCodes {
            n: mask & 0b1000 != 0,
            z: mask & 0b0100 != 0,
            v: mask & 0b0010 != 0,
            c: mask & 0b0001 != 0,
        };
    }

    pub fn read_memory(&self, addr: u32, size: u32) -> Result<u32, FaultKind> {
        self.memory.read(addr, size)
    }

    pub fn write_memory(&mut self, addr: u32, value: u32, size: u32) -> Result<(), FaultKind> {
        self.memory.write(addr, value, size)
    }

    pub fn reset(&mut self) {
        self.cpu.reset();
        self.memory.clear();
        self.devices.reset();
    }
}

impl Default for Simulator {
    fn default() -> Simulator {
        Simulator::new()
    }
}

fn parse_hex_word(text: &str, line: u32) -> Result<u32, AsmError> {
    u32::from_str_radix(text, 16).map_err(|_| AsmError::InvalidNumeric {
        line,
        text: text.to_string(),
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn breakpoint_membership_toggles() {
        let mut sim = Simulator::new();
        assert!(!sim.has_breakpoint(0x100));
        sim.add_breakpoint(0x100);
        assert!(sim.has_breakpoint(0x100));
        sim.remove_breakpoint(0x100);
        assert!(!sim.has_breakpoint(0x100));
    }

    #[test]
    fn run_halts_on_the_halt_word() {
        let program = crate::assembler::assemble("halt\n").unwrap();
        let mut sim = Simulator::new();
        sim.load_program(program);
        assert_eq!(sim.run(|| false), RunOutcome::Halted);
    }

    #[test]
    fn run_stops_at_a_breakpoint_but_not_on_the_first_instruction_of_the_batch() {
        let program = crate::assembler::assemble("add %r0, 1, %r1\nadd %r0, 2, %r2\nhalt\n").unwrap();
        let mut sim = Simulator::new();
        sim.load_program(program);
        sim.add_breakpoint(0);
        // Starting exactly on a breakpoint must not stop immediately.
        assert_eq!(sim.run(|| false), RunOutcome::Halted);
    }

    #[test]
    fn run_stops_at_a_breakpoint_hit_mid_batch() {
        let program = crate::assembler::assemble("add %r0, 1, %r1\nadd %r0, 2, %r2\nhalt\n").unwrap();
        let mut sim = Simulator::new();
        sim.load_program(program);
        sim.add_breakpoint(4);
        assert_eq!(sim.run(|| false), RunOutcome::BreakpointHit(4));
        assert_eq!(sim.read_register(1), 1);
        assert_eq!(sim.read_register(2), 0);
    }

    #[test]
    fn load_image_parses_the_listing_format() {
        let listing = "00001000\n00001000\t84102005\n00001004\tffffffff\n";
        let mut sim = Simulator::new();
        let start = sim.load_image(listing).unwrap();
        assert_eq!(start, 0x1000);
        assert_eq!(sim.read_pc(), 0x1000);
        assert_eq!(sim.read_memory(0x1004, 4).unwrap(), 0xFFFF_FFFF);
    }

    #[test]
    fn ccr_mask_round_trips() {
        let mut sim = Simulator::new();
        sim.write_ccr(0b1010);
        assert!(sim.cpu.ccr.n);
        assert!(!sim.cpu.ccr.z);
        assert!(sim.cpu.ccr.v);
        assert!(!sim.cpu.ccr.c);
        assert_eq!(sim.read_ccr(), 0b1010);
    }
}
