//! CPU state snapshot types and traits

use crate::memory::mmu::MmuState;

/// Trait for CPU types that can provide state snapshots
pub trait CpuStateTrait {
    type Snapshot;
    fn snapshot(&self) -> Self::Snapshot;
}

/// 4510 CPU state snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct Gs4510State {
    pub a: u8,   // Accumulator
    pub b: u8,   // Base page register
    pub x: u8,   // X index register
    pub y: u8,   // Y index register
    pub z: u8,   // Z index register
    pub sp: u16, // Stack pointer (SPH:SPL)
    pub pc: u16, // Program counter
    pub p: u8,   // Status register (flags)
    pub opcode: u8,
    pub arg1: u8,
    pub arg2: u8,
    pub mmu: MmuState,
    pub map_inhibit: bool, // inside a MAP..EOM sequence
    pub held: bool,        // parked in the processor hold
}
