//! Headless C65/MEGA65 system: the backing stores behind a GS4510 core.
//!
//! Memory layout seen by the arbiter:
//!
//! | Store         | Size  | Notes                                   |
//! |---------------|-------|-----------------------------------------|
//! | Shadow        | 128KB | chip RAM, zero wait-states              |
//! | Slow          | 8MB   | ROM image at `$0020000`, attic RAM      |
//! | Colour RAM    | 32KB  | `$FF80000`, first 1KB also at `$D800`   |
//! | Sector buffer | 512B  | `$D6E00-$D6FFF`                         |
//! | Video regs    | 256B  | `$D000-$D0FF` of the active personality |
//! | Generic I/O   | any   | sparse, reads `$FF` when never written  |

use std::collections::HashMap;

use gs45_core::core::machine::Machine;
use gs45_core::core::{Bus, BusMaster, InterruptState, MmioTarget, Store};
use gs45_core::cpu::gs4510::{ConfigInputs, DebugPort};
use gs45_core::cpu::{Cpu, CpuStateTrait, Gs4510, Gs4510State};
use gs45_core::memory::arbiter::UNMAPPED_BYTE;
use gs45_core::memory::{IoPersonality, MemoryArbiter, Region};
use log::info;

use crate::registry::MachineEntry;
use crate::rom_loader::{RomEntry, RomLoadError, RomRegion, RomSet};

pub const SHADOW_SIZE: usize = 0x2_0000;
pub const SLOW_SIZE: usize = 0x80_0000;
pub const COLOUR_RAM_SIZE: usize = 0x8000;
pub const SECTOR_BUFFER_SIZE: usize = 0x200;

/// Physical base and size of the ROM image in the slow store.
pub const ROM_BASE: u32 = 0x002_0000;
pub const ROM_SIZE: usize = 0x2_0000;

pub static MEGA65_ROM: RomRegion = RomRegion {
    size: ROM_SIZE,
    entries: &[RomEntry {
        name: "mega65.rom",
        size: ROM_SIZE,
        offset: 0,
        crc32: None,
    }],
};

pub static C65_ROM: RomRegion = RomRegion {
    size: ROM_SIZE,
    entries: &[RomEntry {
        name: "c65.rom",
        size: ROM_SIZE,
        offset: 0,
        crc32: None,
    }],
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Model {
    Mega65,
    C65,
}

impl Model {
    pub fn name(self) -> &'static str {
        match self {
            Model::Mega65 => "mega65",
            Model::C65 => "c65",
        }
    }

    pub fn io_personality(self) -> IoPersonality {
        match self {
            Model::Mega65 => IoPersonality::Mega65,
            Model::C65 => IoPersonality::C65,
        }
    }

    pub fn rom_region(self) -> &'static RomRegion {
        match self {
            Model::Mega65 => &MEGA65_ROM,
            Model::C65 => &C65_ROM,
        }
    }
}

// ---------------------------------------------------------------------------
// Backing stores
// ---------------------------------------------------------------------------

pub struct Mega65Memory {
    pub shadow: Vec<u8>,
    pub slow: Vec<u8>,
    pub colour_ram: Vec<u8>,
    pub sector_buffer: [u8; SECTOR_BUFFER_SIZE],
    pub video: [u8; 0x100],
    io: HashMap<u32, u8>,
    pub irq: bool,
    pub nmi: bool,
}

impl Mega65Memory {
    pub fn new() -> Self {
        Self {
            shadow: vec![0; SHADOW_SIZE],
            slow: vec![0; SLOW_SIZE],
            colour_ram: vec![0; COLOUR_RAM_SIZE],
            sector_buffer: [0; SECTOR_BUFFER_SIZE],
            video: [0; 0x100],
            io: HashMap::new(),
            irq: false,
            nmi: false,
        }
    }

    /// I/O read with no strobe side effects.
    pub fn io_peek(&self, target: MmioTarget, addr: u32) -> u8 {
        match target {
            MmioTarget::ColourRam => self.colour_ram[colour_index(addr)],
            MmioTarget::SectorBuffer => self.sector_buffer[addr as usize & (SECTOR_BUFFER_SIZE - 1)],
            MmioTarget::Video => self.video[addr as usize & 0xFF],
            MmioTarget::Generic => self.io.get(&addr).copied().unwrap_or(UNMAPPED_BYTE),
        }
    }
}

impl Default for Mega65Memory {
    fn default() -> Self {
        Self::new()
    }
}

/// `$FF80000` exposes all of colour RAM; the `$D800` window the first 1KB.
fn colour_index(addr: u32) -> usize {
    if addr >= 0x8_0000 {
        addr as usize & (COLOUR_RAM_SIZE - 1)
    } else {
        addr as usize & 0x3FF
    }
}

impl Bus for Mega65Memory {
    fn read(&mut self, _master: BusMaster, store: Store, index: u32) -> u8 {
        match store {
            Store::Shadow => self.shadow[index as usize & (SHADOW_SIZE - 1)],
            Store::Slow => self.slow[index as usize & (SLOW_SIZE - 1)],
        }
    }

    fn write(&mut self, _master: BusMaster, store: Store, index: u32, data: u8) {
        match store {
            Store::Shadow => self.shadow[index as usize & (SHADOW_SIZE - 1)] = data,
            Store::Slow => self.slow[index as usize & (SLOW_SIZE - 1)] = data,
        }
    }

    fn io_read(&mut self, _master: BusMaster, target: MmioTarget, addr: u32) -> u8 {
        self.io_peek(target, addr)
    }

    fn io_write(&mut self, _master: BusMaster, target: MmioTarget, addr: u32, data: u8) {
        match target {
            MmioTarget::ColourRam => self.colour_ram[colour_index(addr)] = data,
            MmioTarget::SectorBuffer => {
                self.sector_buffer[addr as usize & (SECTOR_BUFFER_SIZE - 1)] = data;
            }
            MmioTarget::Video => self.video[addr as usize & 0xFF] = data,
            MmioTarget::Generic => {
                self.io.insert(addr, data);
            }
        }
    }

    fn check_interrupts(&self, _target: BusMaster) -> InterruptState {
        InterruptState {
            nmi: self.nmi,
            irq: self.irq,
        }
    }
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

pub struct Mega65System {
    pub cpu: Gs4510,
    pub memory: Mega65Memory,
    model: Model,
}

impl Mega65System {
    pub fn new(model: Model) -> Self {
        let mut cpu = Gs4510::new();
        cpu.arbiter.set_io_personality(model.io_personality());
        Self {
            cpu,
            memory: Mega65Memory::new(),
            model,
        }
    }

    pub fn model(&self) -> Model {
        self.model
    }

    /// Copy a ROM image into the slow store at [`ROM_BASE`].
    pub fn load_rom(&mut self, image: &[u8]) {
        let start = ROM_BASE as usize;
        let len = image.len().min(ROM_SIZE);
        self.memory.slow[start..start + len].copy_from_slice(&image[..len]);
    }

    pub fn load_rom_set(&mut self, rom_set: &RomSet) -> Result<(), RomLoadError> {
        let image = self.model.rom_region().load_lenient(rom_set)?;
        self.load_rom(&image);
        info!("{} ROM loaded at {:07X}", self.model.name(), ROM_BASE);
        Ok(())
    }

    /// One master-clock tick. True when an instruction retired.
    pub fn tick(&mut self) -> bool {
        self.cpu.execute_cycle(&mut self.memory)
    }

    pub fn set_irq(&mut self, level: bool) {
        self.memory.irq = level;
    }

    pub fn set_nmi(&mut self, level: bool) {
        self.memory.nmi = level;
    }
}

impl Machine for Mega65System {
    fn name(&self) -> &'static str {
        self.model.name()
    }

    fn run_cycles(&mut self, cycles: u64) -> u64 {
        let mut retired = 0;
        for _ in 0..cycles {
            if self.tick() {
                retired += 1;
            }
        }
        retired
    }

    fn reset(&mut self) {
        self.cpu.reset();
        self.cpu
            .arbiter
            .set_io_personality(self.model.io_personality());
    }

    fn cpu_state(&self) -> Gs4510State {
        self.cpu.snapshot()
    }

    fn debug_port(&mut self) -> &mut DebugPort {
        &mut self.cpu.debug
    }

    fn config_mut(&mut self) -> &mut ConfigInputs {
        &mut self.cpu.config
    }

    fn arbiter(&self) -> &MemoryArbiter {
        &self.cpu.arbiter
    }

    fn arbiter_mut(&mut self) -> &mut MemoryArbiter {
        &mut self.cpu.arbiter
    }

    fn peek(&self, phys: u32) -> u8 {
        let arbiter = &self.cpu.arbiter;
        match arbiter.classify(phys) {
            Region::CpuPort(reg) => arbiter.port.read(reg),
            Region::Shadow(index) => self.memory.shadow[index as usize & (SHADOW_SIZE - 1)],
            Region::Slow(index) => self.memory.slow[index as usize & (SLOW_SIZE - 1)],
            Region::Core(offset) => arbiter.read_core(offset),
            Region::Io(target, addr) => self.memory.io_peek(target, addr),
            Region::Unmapped => UNMAPPED_BYTE,
        }
    }

    fn poke(&mut self, phys: u32, data: u8) {
        self.cpu
            .arbiter
            .begin_write(&mut self.memory, BusMaster::Monitor, phys, data);
    }
}

// ---------------------------------------------------------------------------
// Machine registry
// ---------------------------------------------------------------------------

fn create(model: Model, rom_set: &RomSet) -> Result<Box<dyn Machine>, RomLoadError> {
    let mut sys = Mega65System::new(model);
    sys.load_rom_set(rom_set)?;
    Ok(Box::new(sys))
}

fn create_mega65(rom_set: &RomSet) -> Result<Box<dyn Machine>, RomLoadError> {
    create(Model::Mega65, rom_set)
}

fn create_c65(rom_set: &RomSet) -> Result<Box<dyn Machine>, RomLoadError> {
    create(Model::C65, rom_set)
}

inventory::submit! {
    MachineEntry::new("mega65", "mega65", "MEGA65 (45GS02, MEGA65 I/O)", create_mega65)
}

inventory::submit! {
    MachineEntry::new("c65", "c65", "Commodore 65 (4510, C65 I/O)", create_c65)
}
