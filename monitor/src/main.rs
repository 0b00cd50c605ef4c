use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use gs45_core::core::machine::Machine;
use gs45_machines::registry;
use gs45_machines::rom_loader::RomLoadError;
use log::info;
use thiserror::Error;

mod config;
mod console;
mod rom_path;

use config::{ConfigError, MonitorConfig};
use console::{Command, CommandError};

#[derive(Parser, Debug)]
#[command(name = "gs45mon", about = "Debug monitor for the GS4510 emulation core")]
struct Cli {
    /// Machine to build (see --list).
    #[arg(required_unless_present = "list")]
    machine: Option<String>,

    /// ROM archive, ROM directory or a single image file.
    #[arg(required_unless_present = "list")]
    rom_path: Option<PathBuf>,

    /// Configuration file (defaults to <config dir>/gs45/monitor.toml).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Run this many cycles before taking commands.
    #[arg(long, value_name = "N")]
    cycles: Option<u64>,

    /// Start in trace mode, holding before every instruction.
    #[arg(long)]
    trace: bool,

    /// Read commands from FILE instead of stdin.
    #[arg(long, value_name = "FILE")]
    script: Option<PathBuf>,

    /// List the registered machines and exit.
    #[arg(long)]
    list: bool,
}

#[derive(Debug, Error)]
enum MonitorError {
    #[error("unknown machine {name:?} (available: {available})")]
    UnknownMachine { name: String, available: String },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("loading ROMs: {0}")]
    Rom(#[from] RomLoadError),
    #[error("script line {line}: {source}")]
    Script { line: usize, source: CommandError },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.list {
        for entry in registry::all() {
            println!("{:<8} {:<8} {}", entry.name, entry.rom_name, entry.description);
        }
        return ExitCode::SUCCESS;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("gs45mon: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), MonitorError> {
    let config = MonitorConfig::resolve(cli.config.as_deref())?;
    let level = config.log_level.as_deref().unwrap_or("warn");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let name = cli.machine.as_deref().unwrap_or_default();
    let entry = registry::find(name).ok_or_else(|| MonitorError::UnknownMachine {
        name: name.to_string(),
        available: registry::all()
            .iter()
            .map(|e| e.name)
            .collect::<Vec<_>>()
            .join(", "),
    })?;

    let rom_path = cli.rom_path.clone().unwrap_or_default();
    let rom_set = rom_path::load_rom_set(entry.rom_name, &rom_path)?;
    let mut machine = (entry.create)(&rom_set)?;
    config.boot(machine.as_mut())?;
    info!("{} ready", machine.name());

    if cli.trace {
        machine.debug_port().set_trace(true);
    }
    if let Some(cycles) = cli.cycles {
        machine.run_cycles(cycles);
    }

    match &cli.script {
        Some(path) => run_script(machine.as_mut(), path),
        None => run_interactive(machine.as_mut()),
    }
}

/// Blank lines and `#` comments are skipped. The first failing command
/// stops the script.
fn run_script(machine: &mut dyn Machine, path: &Path) -> Result<(), MonitorError> {
    let text = std::fs::read_to_string(path)?;
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let result = line
            .parse::<Command>()
            .and_then(|command| match command {
                Command::Quit => Ok(None),
                command => console::execute(machine, &command).map(Some),
            })
            .map_err(|source| MonitorError::Script {
                line: index + 1,
                source,
            })?;
        match result {
            Some(output) => println!("{output}"),
            None => break,
        }
    }
    Ok(())
}

fn run_interactive(machine: &mut dyn Machine) -> Result<(), MonitorError> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    print!("> ");
    stdout.flush()?;
    for line in stdin.lock().lines() {
        let line = line?;
        if !line.trim().is_empty() {
            match line.parse::<Command>() {
                Ok(Command::Quit) => break,
                Ok(command) => match console::execute(machine, &command) {
                    Ok(output) => println!("{output}"),
                    Err(e) => eprintln!("error: {e}"),
                },
                Err(e) => eprintln!("error: {e}"),
            }
        }
        print!("> ");
        stdout.flush()?;
    }
    Ok(())
}
