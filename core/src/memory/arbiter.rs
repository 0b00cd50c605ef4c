//! Physical-address arbiter: picks the backing store that answers an access
//! and reports the wait-states it costs.

use super::cpu_port::CpuPort;
use super::mmu::IoPersonality;
use crate::core::{Bus, BusMaster, MmioTarget, Store};
use crate::device::dmagic::DmaRegisters;

pub const PHYS_MASK: u32 = 0xFFF_FFFF;
pub const UNMAPPED_BYTE: u8 = 0xFF;
pub const DEFAULT_SLOW_LATENCY: u8 = 4;

const SHADOW_MASK: u32 = 0x1_FFFF;
const SLOW_MASK: u32 = 0x7F_FFFF;
const IO_READ_LATENCY: u8 = 1;

// Core register page offsets not owned by the DMA block.
const REG_IO_PERSONALITY: u8 = 0xFC;
const REG_SHADOW_BANK: u8 = 0xFD;
const REG_SLOW_LATENCY: u8 = 0xFE;

/// Where a physical address lands, with the index handed to the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Region {
    CpuPort(u8),
    Shadow(u32),
    Slow(u32),
    /// DMA and control registers at `$FFDx7xx`.
    Core(u8),
    Io(MmioTarget, u32),
    Unmapped,
}

impl Region {
    pub fn category(self) -> AccessCategory {
        match self {
            Region::CpuPort(_) => AccessCategory::CpuPort,
            Region::Shadow(_) => AccessCategory::Shadow,
            Region::Slow(_) => AccessCategory::Slow,
            Region::Core(_) => AccessCategory::Core,
            Region::Io(..) => AccessCategory::Io,
            Region::Unmapped => AccessCategory::Unmapped,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessCategory {
    CpuPort,
    Shadow,
    Slow,
    Core,
    Io,
    Unmapped,
}

impl AccessCategory {
    pub const ALL: [AccessCategory; 6] = [
        AccessCategory::CpuPort,
        AccessCategory::Shadow,
        AccessCategory::Slow,
        AccessCategory::Core,
        AccessCategory::Io,
        AccessCategory::Unmapped,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Per-category access counts. Observability only.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccessCounters {
    reads: [u64; 6],
    writes: [u64; 6],
}

impl AccessCounters {
    pub fn reads(&self, category: AccessCategory) -> u64 {
        self.reads[category.index()]
    }

    pub fn writes(&self, category: AccessCategory) -> u64 {
        self.writes[category.index()]
    }
}

/// Wait-states still owed for the last memory operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PendingLatency(u8);

impl PendingLatency {
    pub const NONE: PendingLatency = PendingLatency(0);

    pub const fn cycles(n: u8) -> Self {
        PendingLatency(n)
    }

    pub fn remaining(self) -> u8 {
        self.0
    }

    pub fn is_settled(self) -> bool {
        self.0 == 0
    }

    pub fn tick(&mut self) {
        self.0 = self.0.saturating_sub(1);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccessGrant {
    pub latency: PendingLatency,
    pub source: Region,
}

pub struct MemoryArbiter {
    pub port: CpuPort,
    pub dma: DmaRegisters,
    slow_latency: u8,
    shadow_bank: u8,
    io: IoPersonality,
    read_latch: u8,
    last_address: u32,
    counters: AccessCounters,
}

impl MemoryArbiter {
    pub fn new() -> Self {
        Self {
            port: CpuPort::new(),
            dma: DmaRegisters::new(),
            slow_latency: DEFAULT_SLOW_LATENCY,
            shadow_bank: 0,
            io: IoPersonality::default(),
            read_latch: UNMAPPED_BYTE,
            last_address: 0,
            counters: AccessCounters::default(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn slow_latency(&self) -> u8 {
        self.slow_latency
    }

    pub fn set_slow_latency(&mut self, cycles: u8) {
        self.slow_latency = cycles;
    }

    /// Physical address bits 27:17 of the bank mirrored into the shadow
    /// store. Zero disables the mirror.
    pub fn shadow_bank(&self) -> u8 {
        self.shadow_bank
    }

    pub fn set_shadow_bank(&mut self, bank: u8) {
        self.shadow_bank = bank;
    }

    pub fn io_personality(&self) -> IoPersonality {
        self.io
    }

    pub fn set_io_personality(&mut self, io: IoPersonality) {
        self.io = io;
    }

    pub fn last_address(&self) -> u32 {
        self.last_address
    }

    pub fn counters(&self) -> &AccessCounters {
        &self.counters
    }

    fn in_shadow_bank(&self, phys: u32) -> bool {
        self.shadow_bank != 0 && phys >> 17 == self.shadow_bank as u32
    }

    /// Region answering a read of `phys`.
    pub fn classify(&self, phys: u32) -> Region {
        let phys = phys & PHYS_MASK;
        if phys > 1 && self.in_shadow_bank(phys) {
            return Region::Shadow(phys & SHADOW_MASK);
        }
        Self::primary(phys)
    }

    /// Region ignoring the shadow bank: where writes are committed.
    fn primary(phys: u32) -> Region {
        match phys {
            0 | 1 => Region::CpuPort(phys as u8),
            p if p >> 17 == 0 => Region::Shadow(p),
            p if p >> 24 == 0x8 => Region::Slow(p & SLOW_MASK),
            0x002_0000..=0x00F_FFFF => Region::Slow(phys),
            p if p & 0xFFF_0F00 == 0xFFD_0700 => Region::Core(p as u8),
            p if p >> 20 == 0xFF => Region::Io(mmio_target(p), p & 0xF_FFFF),
            _ => Region::Unmapped,
        }
    }

    pub fn begin_read<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
        phys: u32,
    ) -> AccessGrant {
        let phys = phys & PHYS_MASK;
        let source = self.classify(phys);
        self.read_latch = match source {
            Region::CpuPort(reg) => self.port.read(reg),
            Region::Shadow(index) => bus.read(master, Store::Shadow, index),
            Region::Slow(index) => bus.read(master, Store::Slow, index),
            Region::Core(offset) => self.read_core(offset),
            Region::Io(target, addr) => bus.io_read(master, target, addr),
            Region::Unmapped => UNMAPPED_BYTE,
        };
        self.last_address = phys;
        self.counters.reads[source.category().index()] += 1;

        let latency = match source {
            Region::Slow(_) => self.slow_latency,
            Region::Io(..) => IO_READ_LATENCY,
            _ => 0,
        };
        AccessGrant {
            latency: PendingLatency(latency),
            source,
        }
    }

    /// Byte fetched by the most recent read.
    pub fn poll_read_result(&self) -> u8 {
        self.read_latch
    }

    pub fn begin_write<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
        phys: u32,
        data: u8,
    ) -> AccessGrant {
        let phys = phys & PHYS_MASK;
        let target = Self::primary(phys);
        match target {
            Region::CpuPort(reg) => self.port.write(reg, data),
            Region::Shadow(index) => bus.write(master, Store::Shadow, index, data),
            Region::Slow(index) => bus.write(master, Store::Slow, index, data),
            Region::Core(offset) => self.write_core(offset, data),
            Region::Io(target, addr) => bus.io_write(master, target, addr, data),
            Region::Unmapped => {}
        }

        // Keep the shadow copy and the banked slow cell it stands in for
        // coherent, whichever path the write came through.
        let mirror = match target {
            Region::Shadow(index) => {
                if self.shadow_bank != 0
                    && let Region::Slow(slow) =
                        Self::primary(((self.shadow_bank as u32) << 17) | index)
                {
                    bus.write(master, Store::Slow, slow, data);
                }
                None
            }
            Region::Slow(index) if index <= 0xF_FFFF && self.in_shadow_bank(index) => {
                Some(index & SHADOW_MASK)
            }
            _ if self.in_shadow_bank(phys) => Some(phys & SHADOW_MASK),
            _ => None,
        };
        if let Some(index) = mirror {
            bus.write(master, Store::Shadow, index, data);
        }

        self.last_address = phys;
        self.counters.writes[target.category().index()] += 1;

        let latency = match target {
            Region::Slow(_) => self.slow_latency,
            _ => 0,
        };
        AccessGrant {
            latency: PendingLatency(latency),
            source: target,
        }
    }

    /// Core register page read. Has no side effects.
    pub fn read_core(&self, offset: u8) -> u8 {
        match offset {
            0x00..=0x04 => self.dma.read(offset),
            REG_IO_PERSONALITY => self.io.register(),
            REG_SHADOW_BANK => self.shadow_bank,
            REG_SLOW_LATENCY => self.slow_latency,
            _ => UNMAPPED_BYTE,
        }
    }

    fn write_core(&mut self, offset: u8, data: u8) {
        match offset {
            0x00..=0x04 => self.dma.write(offset, data),
            REG_IO_PERSONALITY => self.io = IoPersonality::from_register(data),
            REG_SHADOW_BANK => self.shadow_bank = data,
            REG_SLOW_LATENCY => self.slow_latency = data,
            _ => {}
        }
    }
}

impl Default for MemoryArbiter {
    fn default() -> Self {
        Self::new()
    }
}

fn mmio_target(phys: u32) -> MmioTarget {
    match phys {
        0xFF8_0000..=0xFF8_7FFF => MmioTarget::ColourRam,
        0xFFD_6E00..=0xFFD_6FFF => MmioTarget::SectorBuffer,
        p if p & 0xFFF_0C00 == 0xFFD_0800 => MmioTarget::ColourRam,
        p if p & 0xFFF_0F00 == 0xFFD_0000 => MmioTarget::Video,
        _ => MmioTarget::Generic,
    }
}
