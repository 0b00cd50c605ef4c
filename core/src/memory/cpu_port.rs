//! On-chip CPU port at physical `$0000000` (direction) and `$0000001` (data).
//!
//! Bits 0-2 of the effective port value gate the C64-compatible views of
//! the `$A000`, `$D000` and `$E000` blocks:
//!
//! | lhc | $A000-$BFFF | $D000-$DFFF | $E000-$FFFF |
//! |-----|-------------|-------------|-------------|
//! | 0   | RAM         | RAM         | RAM         |
//! | 1   | RAM         | CHAR ROM    | RAM         |
//! | 2   | RAM         | CHAR ROM    | KERNAL      |
//! | 3   | BASIC       | CHAR ROM    | KERNAL      |
//! | 4   | RAM         | RAM         | RAM         |
//! | 5   | RAM         | I/O         | RAM         |
//! | 6   | RAM         | I/O         | KERNAL      |
//! | 7   | BASIC       | I/O         | KERNAL      |

pub const LORAM: u8 = 0x01;
pub const HIRAM: u8 = 0x02;
pub const CHAREN: u8 = 0x04;

/// View of the `$D000-$DFFF` block selected by the port.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IoBlockView {
    Ram,
    CharRom,
    Io,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CpuPort {
    ddr: u8,
    data: u8,
    /// Level on input pins (bits where the direction register is 0).
    external: u8,
}

impl CpuPort {
    pub const fn new() -> Self {
        Self {
            ddr: 0x2F,
            data: 0x37,
            external: 0,
        }
    }

    /// Register read: offset 0 is the direction register, 1 the data port.
    pub fn read(&self, offset: u8) -> u8 {
        match offset & 1 {
            0 => self.ddr,
            _ => self.effective(),
        }
    }

    pub fn write(&mut self, offset: u8, data: u8) {
        match offset & 1 {
            0 => self.ddr = data,
            _ => self.data = data,
        }
    }

    pub fn set_external(&mut self, value: u8) {
        self.external = value;
    }

    #[inline]
    fn effective(&self) -> u8 {
        (self.data & self.ddr) | (self.external & !self.ddr)
    }

    /// LORAM/HIRAM/CHAREN after direction masking.
    #[inline]
    pub fn lhc(&self) -> u8 {
        self.effective() & 0x07
    }

    pub fn io_block_view(&self) -> IoBlockView {
        let lhc = self.lhc();
        if lhc & (LORAM | HIRAM) == 0 {
            IoBlockView::Ram
        } else if lhc & CHAREN != 0 {
            IoBlockView::Io
        } else {
            IoBlockView::CharRom
        }
    }

    #[inline]
    pub fn basic_visible(&self) -> bool {
        self.lhc() & (LORAM | HIRAM) == (LORAM | HIRAM)
    }

    #[inline]
    pub fn kernal_visible(&self) -> bool {
        self.lhc() & HIRAM != 0
    }
}

impl Default for CpuPort {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_on_shows_io_and_roms() {
        let port = CpuPort::new();
        assert_eq!(port.lhc(), 7);
        assert_eq!(port.io_block_view(), IoBlockView::Io);
        assert!(port.basic_visible());
        assert!(port.kernal_visible());
    }

    #[test]
    fn test_input_bits_read_external_level() {
        let mut port = CpuPort::new();
        port.write(0, 0x00); // every bit an input
        port.set_external(0x01);
        assert_eq!(port.lhc(), 0x01);
        assert_eq!(port.io_block_view(), IoBlockView::CharRom);
        assert!(!port.kernal_visible());
    }

    #[test]
    fn test_ram_everywhere_when_loram_and_hiram_clear() {
        let mut port = CpuPort::new();
        port.write(1, 0x34);
        assert_eq!(port.io_block_view(), IoBlockView::Ram);
        assert!(!port.basic_visible());
    }
}
