//! Bank-switch state and the 16-bit → 28-bit address resolver.

use super::cpu_port::{CpuPort, IoBlockView};

/// Physical placement of the C65/MEGA65 ROM images in the slow store.
pub const CHARROM_BASE: u32 = 0x002_D000;
pub const BASIC_ROM_BASE: u32 = 0x002_A000;
pub const KERNAL_ROM_BASE: u32 = 0x002_E000;

/// I/O block selected when the CPU port exposes I/O at `$D000`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IoPersonality {
    C64,
    C65,
    #[default]
    Mega65,
}

impl IoPersonality {
    pub const fn base(self) -> u32 {
        match self {
            IoPersonality::C64 => 0xFFD_0000,
            IoPersonality::C65 => 0xFFD_1000,
            IoPersonality::Mega65 => 0xFFD_3000,
        }
    }

    /// Decode of the personality control register.
    pub const fn from_register(value: u8) -> Self {
        match value & 0x03 {
            0 => IoPersonality::C64,
            1 => IoPersonality::C65,
            _ => IoPersonality::Mega65,
        }
    }

    pub const fn register(self) -> u8 {
        match self {
            IoPersonality::C64 => 0,
            IoPersonality::C65 => 1,
            IoPersonality::Mega65 => 2,
        }
    }
}

/// State loaded by the MAP instruction.
///
/// `map_low`/`map_high` hold one enable bit per 8KB block of the lower and
/// upper 32KB halves. Offsets are 12 bits and supply physical address bits
/// 19:8 together with CPU address bits 15:8. The megabyte selectors supply
/// bits 27:20.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MmuState {
    pub map_low: u8,
    pub map_high: u8,
    pub offset_low: u16,
    pub offset_high: u16,
    pub mb_low: u8,
    pub mb_high: u8,
}

impl MmuState {
    /// Power-on mapping: the `$E000` block points at `$003E000`, where the
    /// ROM image keeps its reset vectors.
    pub const fn reset() -> Self {
        Self {
            map_low: 0,
            map_high: 0b1000,
            offset_low: 0,
            offset_high: 0x300,
            mb_low: 0,
            mb_high: 0,
        }
    }

    /// MAP: A/X program the lower half, Y/Z the upper half. An X (or Z)
    /// value of `$0F` selects the megabyte register instead.
    pub fn apply_map(&mut self, a: u8, x: u8, y: u8, z: u8) {
        if x == 0x0F {
            self.mb_low = a;
        } else {
            self.offset_low = ((x as u16 & 0x0F) << 8) | a as u16;
            self.map_low = x >> 4;
        }
        if z == 0x0F {
            self.mb_high = y;
        } else {
            self.offset_high = ((z as u16 & 0x0F) << 8) | y as u16;
            self.map_high = z >> 4;
        }
    }

    /// Bank-switch translation for `addr`, if its 8KB block is mapped.
    pub fn translate(&self, addr: u16) -> Option<u32> {
        let block = (addr >> 13) as u8;
        let (enables, offset, mb) = if block < 4 {
            (self.map_low, self.offset_low, self.mb_low)
        } else {
            (self.map_high, self.offset_high, self.mb_high)
        };
        if enables & (1 << (block & 3)) == 0 {
            return None;
        }
        let page = (offset.wrapping_add(addr >> 8) & 0x0FFF) as u32;
        Some(((mb as u32) << 20) | (page << 8) | (addr & 0xFF) as u32)
    }

    pub fn is_mapped(&self, addr: u16) -> bool {
        self.translate(addr).is_some()
    }
}

/// The four `$D030`-style ROM overlay enable lines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RomOverlays {
    pub rom_8000: bool,
    pub rom_a000: bool,
    pub rom_c000: bool,
    pub rom_e000: bool,
}

impl RomOverlays {
    /// Read-path overlay for `addr`, if its enable line is active.
    pub fn translate(&self, addr: u16) -> Option<u32> {
        let a = addr as u32;
        match addr {
            0x8000..=0x9FFF if self.rom_8000 => Some(0x003_8000 | (a & 0x1FFF)),
            0xA000..=0xBFFF if self.rom_a000 => Some(0x003_A000 | (a & 0x1FFF)),
            0xC000..=0xCFFF if self.rom_c000 => Some(0x002_C000 | (a & 0x0FFF)),
            0xE000..=0xFFFF if self.rom_e000 => Some(0x003_E000 | (a & 0x1FFF)),
            _ => None,
        }
    }
}

/// Translates CPU addresses using the live MMU, port and overlay state.
///
/// Nothing is cached: every access re-evaluates all layers.
pub struct AddressResolver<'a> {
    pub mmu: &'a MmuState,
    pub port: &'a CpuPort,
    pub overlays: RomOverlays,
    pub io: IoPersonality,
}

impl AddressResolver<'_> {
    pub fn resolve(&self, addr: u16, is_write: bool) -> u32 {
        // 1. $Dxxx: I/O or character ROM, depending on the CPU port.
        if addr >> 12 == 0xD {
            match self.port.io_block_view() {
                IoBlockView::Io => return self.io.base() | (addr as u32 & 0x0FFF),
                IoBlockView::CharRom if !is_write => {
                    return CHARROM_BASE | (addr as u32 & 0x0FFF);
                }
                _ => {}
            }
        }

        // 2. ROM overlays win over mapping, reads only.
        if !is_write && let Some(phys) = self.overlays.translate(addr) {
            return phys;
        }

        // 3. MAP translation.
        if let Some(phys) = self.mmu.translate(addr) {
            return phys;
        }

        // 4. C64 port ROMs, only visible where nothing is mapped.
        if !is_write {
            match addr {
                0xA000..=0xBFFF if self.port.basic_visible() => {
                    return BASIC_ROM_BASE | (addr as u32 & 0x1FFF);
                }
                0xE000..=0xFFFF if self.port.kernal_visible() => {
                    return KERNAL_ROM_BASE | (addr as u32 & 0x1FFF);
                }
                _ => {}
            }
        }

        addr as u32
    }
}
