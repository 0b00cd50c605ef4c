//! Machine registry.
//!
//! Each system registers itself with [`inventory::submit!`] so the monitor
//! can list and build machines without a central table.

use gs45_core::core::machine::Machine;

use crate::rom_loader::{RomLoadError, RomSet};

pub type MachineFactory = fn(&RomSet) -> Result<Box<dyn Machine>, RomLoadError>;

pub struct MachineEntry {
    /// Name used on the command line (e.g. "mega65").
    pub name: &'static str,
    /// Archive stem looked up in a ROM directory (`{rom_name}.zip`).
    pub rom_name: &'static str,
    pub description: &'static str,
    pub create: MachineFactory,
}

impl MachineEntry {
    pub const fn new(
        name: &'static str,
        rom_name: &'static str,
        description: &'static str,
        create: MachineFactory,
    ) -> Self {
        Self {
            name,
            rom_name,
            description,
            create,
        }
    }
}

inventory::collect!(MachineEntry);

/// Every registered machine, sorted by name.
pub fn all() -> Vec<&'static MachineEntry> {
    let mut entries: Vec<_> = inventory::iter::<MachineEntry>.into_iter().collect();
    entries.sort_by_key(|e| e.name);
    entries
}

pub fn find(name: &str) -> Option<&'static MachineEntry> {
    inventory::iter::<MachineEntry>
        .into_iter()
        .find(|e| e.name.eq_ignore_ascii_case(name))
}
