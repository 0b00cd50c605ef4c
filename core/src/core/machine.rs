use crate::cpu::gs4510::{ConfigInputs, DebugPort};
use crate::cpu::state::Gs4510State;
use crate::memory::MemoryArbiter;

/// Machine-agnostic interface for emulated systems.
///
/// Each machine owns its backing stores and a core, and exposes them through
/// this trait so the monitor never needs to know which system it drives.
pub trait Machine {
    /// Registry name of the system (e.g. "mega65").
    fn name(&self) -> &'static str;

    /// Advance the master clock by `cycles` ticks. Returns the number of
    /// instructions retired.
    fn run_cycles(&mut self, cycles: u64) -> u64;

    /// Reset the machine and start the reset vector sequence.
    fn reset(&mut self);

    fn cpu_state(&self) -> Gs4510State;

    /// The monitor side of the processor hold.
    fn debug_port(&mut self) -> &mut DebugPort;

    fn config_mut(&mut self) -> &mut ConfigInputs;

    /// Wait-state configuration, control registers and access counters.
    fn arbiter(&self) -> &MemoryArbiter;

    fn arbiter_mut(&mut self) -> &mut MemoryArbiter;

    /// Read a physical address without side effects or wait-states.
    fn peek(&self, phys: u32) -> u8;

    /// Write a physical address through the arbiter as the monitor master.
    fn poke(&mut self, phys: u32, data: u8);

    /// Copy `data` into physical memory starting at `phys`.
    fn load(&mut self, phys: u32, data: &[u8]) {
        for (i, &byte) in data.iter().enumerate() {
            self.poke(phys.wrapping_add(i as u32), byte);
        }
    }
}
