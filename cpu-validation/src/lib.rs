//! Single-step validation vectors for the GS4510 core.
//!
//! A vector records the register file and every touched byte before and
//! after one instruction, plus the per-tick bus activity. The CPU runs with
//! an identity memory view (no MAP blocks, CPU port showing RAM) so CPU
//! addresses and shadow-store indexes coincide.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use gs45_core::core::{Bus, BusMaster, Store};
use gs45_core::cpu::Gs4510;
use gs45_core::memory::{AccessCategory, MmuState};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// --- TracingBus: flat 64KB shadow store with tick-by-tick recording ---

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusOp {
    Read,
    Write,
    Internal,
}

impl BusOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BusOp::Read => "read",
            BusOp::Write => "write",
            BusOp::Internal => "internal",
        }
    }
}

#[derive(Clone, Debug)]
pub struct BusCycle {
    pub addr: u16,
    pub data: u8,
    pub op: BusOp,
}

pub struct TracingBus {
    pub memory: Vec<u8>,
    pub cycles: Vec<BusCycle>,
    /// Accesses that left the 64KB window (slow store, I/O).
    pub foreign: usize,
}

impl TracingBus {
    pub fn new() -> Self {
        Self {
            memory: vec![0; 0x10000],
            cycles: Vec::new(),
            foreign: 0,
        }
    }

    pub fn load(&mut self, addr: u16, data: &[u8]) {
        let start = addr as usize;
        self.memory[start..start + data.len()].copy_from_slice(data);
    }
}

impl Default for TracingBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for TracingBus {
    fn read(&mut self, _master: BusMaster, store: Store, index: u32) -> u8 {
        if store != Store::Shadow || index > 0xFFFF {
            self.foreign += 1;
            return 0xFF;
        }
        let data = self.memory[index as usize];
        self.cycles.push(BusCycle {
            addr: index as u16,
            data,
            op: BusOp::Read,
        });
        data
    }

    fn write(&mut self, _master: BusMaster, store: Store, index: u32, data: u8) {
        if store != Store::Shadow || index > 0xFFFF {
            self.foreign += 1;
            return;
        }
        self.memory[index as usize] = data;
        self.cycles.push(BusCycle {
            addr: index as u16,
            data,
            op: BusOp::Write,
        });
    }
}

// --- JSON vector types ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gs4510TestCase {
    pub name: String,
    pub initial: Gs4510CpuState,
    #[serde(rename = "final")]
    pub final_state: Gs4510CpuState,
    pub cycles: Vec<(u16, u8, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gs4510CpuState {
    pub pc: u16,
    pub sp: u16,
    pub a: u8,
    pub b: u8,
    pub x: u8,
    pub y: u8,
    pub z: u8,
    pub p: u8,
    pub ram: Vec<(u16, u8)>,
}

impl Gs4510CpuState {
    pub fn capture(cpu: &Gs4510) -> Self {
        let r = &cpu.core.regs;
        Self {
            pc: r.pc,
            sp: r.sp(),
            a: r.a,
            b: r.b,
            x: r.x,
            y: r.y,
            z: r.z,
            p: r.p,
            ram: Vec::new(),
        }
    }
}

/// A core with the identity memory view, loaded with `state`'s registers.
pub fn validation_cpu(state: &Gs4510CpuState) -> Gs4510 {
    let mut cpu = Gs4510::new();
    cpu.core.mmu = MmuState::default();
    cpu.arbiter.port.write(1, 0x30); // LORAM/HIRAM/CHAREN clear: RAM everywhere
    cpu.arbiter.set_slow_latency(0);
    let r = &mut cpu.core.regs;
    r.pc = state.pc;
    r.set_sp(state.sp);
    r.a = state.a;
    r.b = state.b;
    r.x = state.x;
    r.y = state.y;
    r.z = state.z;
    r.p = state.p;
    cpu
}

/// Run until one instruction retires, recording one entry per tick.
/// `None` if nothing retired within `max_ticks`.
pub fn step_traced(
    cpu: &mut Gs4510,
    bus: &mut TracingBus,
    max_ticks: usize,
) -> Option<Vec<(u16, u8, BusOp)>> {
    let mut trace = Vec::new();
    for _ in 0..max_ticks {
        let before = bus.cycles.len();
        let retired = cpu.execute_cycle(bus);
        if bus.cycles.len() > before {
            trace.extend(bus.cycles[before..].iter().map(|c| (c.addr, c.data, c.op)));
        } else {
            trace.push((0xFFFF, 0, BusOp::Internal));
        }
        if retired {
            return Some(trace);
        }
    }
    None
}

/// True when the instruction touched the on-chip CPU port, which the
/// tracing bus cannot see.
pub fn touched_cpu_port(cpu: &Gs4510) -> bool {
    let counters = cpu.arbiter.counters();
    counters.reads(AccessCategory::CpuPort) + counters.writes(AccessCategory::CpuPort) > 0
}

// --- Vector files ---

#[derive(Debug, Error)]
pub enum VectorError {
    #[error("reading {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("parsing {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

/// Load a `.json` or `.json.gz` vector file.
pub fn load_vectors(path: &Path) -> Result<Vec<Gs4510TestCase>, VectorError> {
    let display = path.display().to_string();
    let io_err = |source| VectorError::Io {
        path: display.clone(),
        source,
    };
    let file = File::open(path).map_err(io_err)?;
    let mut reader: Box<dyn Read> = if path.extension().is_some_and(|e| e == "gz") {
        Box::new(GzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    let mut text = String::new();
    reader.read_to_string(&mut text).map_err(io_err)?;
    serde_json::from_str(&text).map_err(|source| VectorError::Json {
        path: display.clone(),
        source,
    })
}

/// Vector files in `dir`, sorted by name. Empty when `dir` does not exist.
pub fn vector_files(dir: &Path) -> Vec<std::path::PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<_> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            let name = path.to_string_lossy();
            name.ends_with(".json") || name.ends_with(".json.gz")
        })
        .collect();
    files.sort();
    files
}
