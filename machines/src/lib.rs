pub mod mega65;
pub mod registry;
pub mod rom_loader;

pub use mega65::{Mega65Memory, Mega65System};
