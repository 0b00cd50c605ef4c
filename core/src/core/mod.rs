pub mod bus;
pub mod component;
pub mod machine;

pub use bus::{Bus, BusMaster, InterruptState, MmioTarget, Store};
pub use component::{BusMasterComponent, Component};
pub use machine::Machine;
