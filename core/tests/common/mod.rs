#![allow(dead_code)]

use std::collections::HashMap;

use gs45_core::core::{Bus, BusMaster, InterruptState, MmioTarget, Store};
use gs45_core::cpu::Gs4510;

pub const SHADOW_SIZE: usize = 0x2_0000;
pub const SLOW_SIZE: usize = 0x80_0000;

/// Test backing stores: 128KB shadow, 8MB slow store and a sparse I/O space.
pub struct TestBus {
    pub shadow: Vec<u8>,
    pub slow: Vec<u8>,
    pub io: HashMap<u32, u8>,
    /// Every I/O strobe seen, in order: (target, offset, is_write).
    pub io_log: Vec<(MmioTarget, u32, bool)>,
    /// (master, store, index) of every store read.
    pub reads: Vec<(BusMaster, Store, u32)>,
    pub irq: bool,
    pub nmi: bool,
}

impl TestBus {
    pub fn new() -> Self {
        Self {
            shadow: vec![0; SHADOW_SIZE],
            slow: vec![0; SLOW_SIZE],
            io: HashMap::new(),
            io_log: Vec::new(),
            reads: Vec::new(),
            irq: false,
            nmi: false,
        }
    }

    /// Load into the shadow store. Bank-0 CPU addresses outside `$Dxxx` and
    /// the ROM windows resolve to the same index.
    pub fn load(&mut self, addr: u16, data: &[u8]) {
        let start = addr as usize;
        self.shadow[start..start + data.len()].copy_from_slice(data);
    }

    /// Write straight into whichever store backs `phys`.
    pub fn write_phys(&mut self, phys: u32, data: u8) {
        match phys {
            0..=0x1_FFFF => self.shadow[phys as usize] = data,
            0x2_0000..=0xF_FFFF => self.slow[phys as usize] = data,
            p if p >> 24 == 0x8 => self.slow[(p & 0x7F_FFFF) as usize] = data,
            _ => panic!("no backing store at {phys:07X}"),
        }
    }

    pub fn read_phys(&self, phys: u32) -> u8 {
        match phys {
            0..=0x1_FFFF => self.shadow[phys as usize],
            0x2_0000..=0xF_FFFF => self.slow[phys as usize],
            p if p >> 24 == 0x8 => self.slow[(p & 0x7F_FFFF) as usize],
            _ => panic!("no backing store at {phys:07X}"),
        }
    }

    /// Vectors live in the power-on `$E000` mapping at `$003E000`.
    pub fn set_vector(&mut self, vector: u16, target: u16) {
        let phys = 0x3_0000 | vector as u32;
        self.write_phys(phys, target as u8);
        self.write_phys(phys + 1, (target >> 8) as u8);
    }
}

impl Bus for TestBus {
    fn read(&mut self, master: BusMaster, store: Store, index: u32) -> u8 {
        self.reads.push((master, store, index));
        match store {
            Store::Shadow => self.shadow[index as usize],
            Store::Slow => self.slow[index as usize],
        }
    }

    fn write(&mut self, _master: BusMaster, store: Store, index: u32, data: u8) {
        match store {
            Store::Shadow => self.shadow[index as usize] = data,
            Store::Slow => self.slow[index as usize] = data,
        }
    }

    fn io_read(&mut self, _master: BusMaster, target: MmioTarget, addr: u32) -> u8 {
        self.io_log.push((target, addr, false));
        self.io.get(&addr).copied().unwrap_or(0xFF)
    }

    fn io_write(&mut self, _master: BusMaster, target: MmioTarget, addr: u32, data: u8) {
        self.io_log.push((target, addr, true));
        self.io.insert(addr, data);
    }

    fn check_interrupts(&self, _target: BusMaster) -> InterruptState {
        InterruptState {
            nmi: self.nmi,
            irq: self.irq,
        }
    }
}

/// A core about to fetch at `pc`, with slow-store wait-states disabled.
pub fn cpu_at(pc: u16) -> Gs4510 {
    let mut cpu = Gs4510::new();
    cpu.core.regs.pc = pc;
    cpu.arbiter.set_slow_latency(0);
    cpu
}

/// Tick the CPU for `n` master-clock ticks.
pub fn tick(cpu: &mut Gs4510, bus: &mut TestBus, n: usize) {
    for _ in 0..n {
        cpu.execute_cycle(bus);
    }
}

/// Tick until an instruction retires. Returns the ticks it took.
pub fn run_instruction(cpu: &mut Gs4510, bus: &mut TestBus) -> usize {
    for ticks in 1..=10_000 {
        if cpu.execute_cycle(bus) {
            return ticks;
        }
    }
    panic!("no instruction retired in 10000 ticks");
}

pub fn run_instructions(cpu: &mut Gs4510, bus: &mut TestBus, n: usize) {
    for _ in 0..n {
        run_instruction(cpu, bus);
    }
}
