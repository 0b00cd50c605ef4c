//! Monitor commands. Memory and PC commands go through the processor hold
//! so they see the machine exactly as the core does.

use std::fmt::Write as _;
use std::str::FromStr;

use gs45_core::core::machine::Machine;
use gs45_core::cpu::Gs4510State;
use gs45_core::cpu::gs4510::DebugCommand;
use gs45_core::memory::AccessCategory;
use log::debug;
use thiserror::Error;

/// Ticks allowed for the core to answer a handshake or retire a step.
const HANDSHAKE_LIMIT: u64 = 10_000;
const DEFAULT_DUMP_LEN: u32 = 16;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command {0:?} (r m w g t s c x q)")]
    Unknown(String),
    #[error("missing {0}")]
    MissingArgument(&'static str),
    #[error("bad number {0:?}")]
    BadNumber(String),
    #[error("expected on or off, got {0:?}")]
    BadToggle(String),
    #[error("core did not respond within {0} cycles")]
    Timeout(u64),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Registers,
    Memory { address: u32, len: u32 },
    Write { address: u32, bytes: Vec<u8> },
    Go(u16),
    Trace(bool),
    Step(u32),
    Continue(u64),
    Counters,
    Quit,
}

/// Addresses and data are hex, with an optional `$` or `0x` prefix.
fn parse_hex(word: &str) -> Result<u32, CommandError> {
    let digits = word
        .strip_prefix('$')
        .or_else(|| word.strip_prefix("0x"))
        .unwrap_or(word);
    u32::from_str_radix(digits, 16).map_err(|_| CommandError::BadNumber(word.to_string()))
}

fn parse_byte(word: &str) -> Result<u8, CommandError> {
    let value = parse_hex(word)?;
    u8::try_from(value).map_err(|_| CommandError::BadNumber(word.to_string()))
}

/// Counts are decimal.
fn parse_count<T: FromStr>(word: &str) -> Result<T, CommandError> {
    word.parse()
        .map_err(|_| CommandError::BadNumber(word.to_string()))
}

fn required<'a>(
    words: &mut impl Iterator<Item = &'a str>,
    what: &'static str,
) -> Result<&'a str, CommandError> {
    words.next().ok_or(CommandError::MissingArgument(what))
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Err(CommandError::Empty);
        };

        let command = match name {
            "r" => Command::Registers,
            "m" => {
                let address = parse_hex(required(&mut words, "address")?)?;
                let len = match words.next() {
                    Some(word) => parse_count(word)?,
                    None => DEFAULT_DUMP_LEN,
                };
                Command::Memory { address, len }
            }
            "w" => {
                let address = parse_hex(required(&mut words, "address")?)?;
                let bytes = words.map(parse_byte).collect::<Result<Vec<_>, _>>()?;
                if bytes.is_empty() {
                    return Err(CommandError::MissingArgument("bytes"));
                }
                Command::Write { address, bytes }
            }
            "g" => {
                let word = required(&mut words, "address")?;
                let pc = u16::try_from(parse_hex(word)?)
                    .map_err(|_| CommandError::BadNumber(word.to_string()))?;
                Command::Go(pc)
            }
            "t" => match required(&mut words, "on or off")? {
                "on" => Command::Trace(true),
                "off" => Command::Trace(false),
                other => return Err(CommandError::BadToggle(other.to_string())),
            },
            "s" => match words.next() {
                Some(word) => Command::Step(parse_count(word)?),
                None => Command::Step(1),
            },
            "c" => Command::Continue(parse_count(required(&mut words, "cycle count")?)?),
            "x" => Command::Counters,
            "q" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

// ---- Hold handshake ----

fn acquire(machine: &mut dyn Machine) -> Result<(), CommandError> {
    machine.debug_port().request_attention();
    for _ in 0..HANDSHAKE_LIMIT {
        if machine.debug_port().is_granted() {
            return Ok(());
        }
        machine.run_cycles(1);
    }
    machine.debug_port().release();
    Err(CommandError::Timeout(HANDSHAKE_LIMIT))
}

/// Submit one command and tick until the core has served it.
fn serve(machine: &mut dyn Machine, command: DebugCommand) -> Result<Option<u8>, CommandError> {
    machine.debug_port().submit(command);
    for _ in 0..HANDSHAKE_LIMIT {
        machine.run_cycles(1);
        if machine.debug_port().is_idle() {
            return Ok(machine.debug_port().take_response());
        }
    }
    Err(CommandError::Timeout(HANDSHAKE_LIMIT))
}

fn serve_all(
    machine: &mut dyn Machine,
    commands: impl IntoIterator<Item = DebugCommand>,
) -> Result<Vec<u8>, CommandError> {
    acquire(machine)?;
    let mut responses = Vec::new();
    for command in commands {
        match serve(machine, command) {
            Ok(Some(data)) => responses.push(data),
            Ok(None) => {}
            Err(e) => {
                machine.debug_port().release();
                return Err(e);
            }
        }
    }
    machine.debug_port().release();
    Ok(responses)
}

// ---- Formatting ----

pub fn format_registers(s: &Gs4510State) -> String {
    let flags: String = "NVEBDIZC"
        .chars()
        .enumerate()
        .map(|(i, c)| if s.p & (0x80 >> i) != 0 { c } else { '.' })
        .collect();
    format!(
        "PC={:04X} A={:02X} X={:02X} Y={:02X} Z={:02X} B={:02X} SP={:04X} P={:02X} {}{}{}",
        s.pc,
        s.a,
        s.x,
        s.y,
        s.z,
        s.b,
        s.sp,
        s.p,
        flags,
        if s.map_inhibit { " map" } else { "" },
        if s.held { " held" } else { "" },
    )
}

fn format_dump(address: u32, data: &[u8]) -> String {
    let mut out = String::new();
    for (row, chunk) in data.chunks(16).enumerate() {
        let _ = write!(out, "{:07X}:", address.wrapping_add(row as u32 * 16));
        for byte in chunk {
            let _ = write!(out, " {byte:02X}");
        }
        out.push('\n');
    }
    out
}

fn format_counters(machine: &dyn Machine) -> String {
    let arbiter = machine.arbiter();
    let counters = arbiter.counters();
    let mut out = String::new();
    for category in AccessCategory::ALL {
        let _ = writeln!(
            out,
            "{:<9} reads {:>10}  writes {:>10}",
            format!("{category:?}"),
            counters.reads(category),
            counters.writes(category)
        );
    }
    let _ = write!(
        out,
        "last ${:07X}  slow latency {}  shadow bank {}",
        arbiter.last_address(),
        arbiter.slow_latency(),
        arbiter.shadow_bank()
    );
    out
}

// ---- Execution ----

fn step(machine: &mut dyn Machine, count: u32) -> Result<(), CommandError> {
    for _ in 0..count {
        if machine.debug_port().trace() {
            machine.debug_port().step();
        }
        let mut retired = 0;
        for _ in 0..HANDSHAKE_LIMIT {
            retired += machine.run_cycles(1);
            if retired > 0 {
                break;
            }
        }
        if retired == 0 {
            return Err(CommandError::Timeout(HANDSHAKE_LIMIT));
        }
    }
    Ok(())
}

/// Run one command and return the text to show. `Quit` is the caller's
/// business and produces no output.
pub fn execute(machine: &mut dyn Machine, command: &Command) -> Result<String, CommandError> {
    debug!("monitor: {command:?}");
    match command {
        Command::Registers => Ok(format_registers(&machine.cpu_state())),
        Command::Memory { address, len } => {
            let reads = (0..*len).map(|i| DebugCommand::Read {
                address: address.wrapping_add(i),
            });
            let data = serve_all(machine, reads)?;
            Ok(format_dump(*address, &data).trim_end().to_string())
        }
        Command::Write { address, bytes } => {
            let writes = bytes.iter().enumerate().map(|(i, &data)| DebugCommand::Write {
                address: address.wrapping_add(i as u32),
                data,
            });
            serve_all(machine, writes)?;
            Ok(format!("wrote {} bytes at ${:07X}", bytes.len(), address))
        }
        Command::Go(pc) => {
            serve_all(machine, [DebugCommand::SetPc { address: *pc }])?;
            Ok(format!("PC=${pc:04X}"))
        }
        Command::Trace(on) => {
            machine.debug_port().set_trace(*on);
            Ok(format!("trace {}", if *on { "on" } else { "off" }))
        }
        Command::Step(count) => {
            step(machine, *count)?;
            Ok(format_registers(&machine.cpu_state()))
        }
        Command::Continue(cycles) => {
            let retired = machine.run_cycles(*cycles);
            Ok(format!("{cycles} cycles, {retired} instructions"))
        }
        Command::Counters => Ok(format_counters(machine)),
        Command::Quit => Ok(String::new()),
    }
}
