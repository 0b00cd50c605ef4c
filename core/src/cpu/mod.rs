use crate::core::component::BusMasterComponent;

/// Generic CPU interface
pub trait Cpu: BusMasterComponent + CpuStateTrait {
    /// Start the reset sequence (register reset, then the reset vector fetch)
    fn reset(&mut self);

    /// Drive the external interrupt lines
    fn signal_interrupt(&mut self, int: crate::core::bus::InterruptState);

    /// Query if the CPU is parked in the processor hold
    fn is_sleeping(&self) -> bool;
}

// Re-export state types
pub mod state;
pub use state::{CpuStateTrait, Gs4510State};

pub mod gs4510;
pub use gs4510::Gs4510;
