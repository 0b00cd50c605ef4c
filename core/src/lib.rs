pub mod core;
pub mod cpu;
pub mod device;
pub mod memory;

pub mod prelude {
    pub use crate::core::machine::Machine;
    pub use crate::core::{Bus, BusMaster, BusMasterComponent, Component, Store, bus::InterruptState};
    pub use crate::cpu::gs4510::{ClockSpeed, ConfigInputs, DebugCommand, DebugPort};
    pub use crate::cpu::{Cpu, CpuStateTrait, Gs4510, Gs4510State};
}
