/// Identifies who is driving a backing-store access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusMaster {
    Cpu,     // instruction fetch, operand and stack traffic
    Dma,     // DMAgic list reads and block transfers (physical addresses)
    Monitor, // debug/monitor commands serviced while the CPU is held
}

/// The two memory backing stores behind the arbiter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Store {
    /// Zero-wait-state store, addressed by a 17-bit index.
    Shadow,
    /// Variable-latency store, addressed by a 23-bit index.
    Slow,
}

/// Sub-target of the memory-mapped I/O bus, selected by address pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MmioTarget {
    ColourRam,
    Video,
    SectorBuffer,
    Generic,
}

/// Backing-store interface consumed by the memory arbiter.
///
/// The core never owns memory. Machines (and test harnesses) implement this
/// trait to provide the shadow store, the slow store and the peripheral bus.
/// Wait-states are the arbiter's business; implementations answer
/// immediately.
pub trait Bus {
    fn read(&mut self, master: BusMaster, store: Store, index: u32) -> u8;
    fn write(&mut self, master: BusMaster, store: Store, index: u32, data: u8);

    /// Read strobe on the I/O bus. `addr` is the 20-bit offset inside the
    /// `$FFxxxxx` I/O megabyte.
    fn io_read(&mut self, _master: BusMaster, _target: MmioTarget, _addr: u32) -> u8 {
        0xFF
    }

    /// Write strobe on the I/O bus.
    fn io_write(&mut self, _master: BusMaster, _target: MmioTarget, _addr: u32, _data: u8) {}

    /// Interrupt lines as seen by `target`. Sampled by the CPU every tick.
    fn check_interrupts(&self, _target: BusMaster) -> InterruptState {
        InterruptState::default()
    }
}

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct InterruptState {
    pub nmi: bool, // edge-triggered; latched by the CPU on a rising edge
    pub irq: bool, // level-triggered
}

impl InterruptState {
    pub fn merge(self, other: InterruptState) -> InterruptState {
        InterruptState {
            nmi: self.nmi || other.nmi,
            irq: self.irq || other.irq,
        }
    }
}
