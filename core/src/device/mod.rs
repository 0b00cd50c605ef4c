pub mod dmagic;

pub use dmagic::{DmaCommand, DmaDescriptor, DmaEndpoint, DmaRegisters};
