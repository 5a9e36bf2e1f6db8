//! Terminal host for the ARC-8 assembler and simulator: assembles a
//! source file, loads it into a [`Simulator`], and runs it to
//! completion (or single-steps it), wiring the simulated console to
//! stdout and stdin to the simulated keyboard.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use clap::Parser;
use colored::Colorize;

use arc_core::assembler::AssembledProgram;
use arc_core::decode;
use arc_core::executor::StepOutcome;
use arc_core::simulator::{RunOutcome, Simulator};

#[derive(Parser)]
#[command(name = "arc", about = "Assembler and simulator for the ARC-8 instructional ISA")]
struct Cli {
    /// Assembly source file to load.
    source: PathBuf,

    /// Address to stop at (decimal or 0x-prefixed hex). May be repeated.
    #[arg(short = 'b', long = "break", value_name = "ADDR")]
    breakpoints: Vec<String>,

    /// Print pc and every nonzero register after each instruction
    /// instead of running silently to completion.
    #[arg(long)]
    step: bool,

    /// Print the disassembly and symbol table instead of running.
    #[arg(long)]
    disassemble: bool,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let source = fs::read_to_string(&cli.source).unwrap_or_else(|err| {
        fail(&format!("failed to read {}: {err}", cli.source.display()))
    });

    let program = arc_core::assembler::assemble(&source).unwrap_or_else(|err| fail(&err.to_string()));
    for warning in &program.warnings {
        eprintln!("{}", format!("line {}: {}", warning.line, warning.message).yellow());
    }

    if cli.disassemble {
        print_disassembly(&program);
        return;
    }

    let mut breakpoints = Vec::with_capacity(cli.breakpoints.len());
    for text in &cli.breakpoints {
        breakpoints.push(parse_addr(text).unwrap_or_else(|message| {
            fail(&format!("invalid breakpoint `{text}`: {message}"))
        }));
    }

    let mut sim = Simulator::new();
    sim.load_program(program);
    for addr in breakpoints {
        sim.add_breakpoint(addr);
    }
    sim.on_console_write(|byte| {
        print!("{}", byte as char);
        let _ = io::stdout().flush();
    });

    let keystrokes = spawn_keyboard_reader();

    match run_to_completion(&mut sim, &keystrokes, cli.step) {
        RunOutcome::Halted => println!("{}", "halted".green()),
        RunOutcome::BreakpointHit(addr) => {
            println!("{}", format!("breakpoint hit at {addr:#010x}").cyan());
        }
        RunOutcome::Fault(fault) => {
            eprintln!("{}", format!("fault: {fault}").red());
            process::exit(1);
        }
        RunOutcome::Stopped => unreachable!("the cli's stop closure never requests a stop"),
    }
}

/// Drives the simulator one instruction at a time so a pending
/// keystroke can be delivered before every step — `Simulator::run`'s
/// batching would otherwise only yield control between batches.
fn run_to_completion(sim: &mut Simulator, keystrokes: &Receiver<u8>, trace: bool) -> RunOutcome {
    let mut first = true;
    loop {
        if let Ok(byte) = keystrokes.try_recv() {
            sim.deliver_keystroke(byte);
        }
        if !first && sim.has_breakpoint(sim.read_pc()) {
            return RunOutcome::BreakpointHit(sim.read_pc());
        }
        first = false;
        match sim.step() {
            Ok(StepOutcome::Continue) => {
                if trace {
                    print_trace(sim);
                }
            }
            Ok(StepOutcome::Halted) => return RunOutcome::Halted,
            Err(fault) => return RunOutcome::Fault(fault),
        }
    }
}

fn print_disassembly(program: &AssembledProgram) {
    for (addr, word) in &program.words {
        println!("{addr:08x}\t{}", decode::disassemble(*word));
    }
    if !program.symbols.is_empty() {
        println!();
        print!("{}", program.symbols);
    }
}

fn print_trace(sim: &Simulator) {
    print!("pc={:#010x}", sim.read_pc());
    for n in 0..32 {
        let value = sim.read_register(n);
        if value != 0 {
            print!(" r{n}={value:#010x}");
        }
    }
    println!();
}

/// Reads stdin one byte at a time on a background thread and forwards
/// each byte to the returned channel. Line-buffered like any other
/// stdin read — a program waiting on the keyboard sees bytes only once
/// a line is submitted.
fn spawn_keyboard_reader() -> Receiver<u8> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut stdin = io::stdin();
        let mut byte = [0u8; 1];
        loop {
            match stdin.read(&mut byte) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    if tx.send(byte[0]).is_err() {
                        break;
                    }
                }
            }
        }
    });
    rx
}

fn parse_addr(text: &str) -> Result<u32, String> {
    let trimmed = text.trim();
    match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).map_err(|e| e.to_string()),
        None => trimmed.parse::<u32>().map_err(|e| e.to_string()),
    }
}

fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn fail(message: &str) -> ! {
    eprintln!("{}", message.red());
    process::exit(1);
}
