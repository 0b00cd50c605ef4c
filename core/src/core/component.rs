use super::bus::BusMaster;

/// Anything that advances by discrete clock ticks.
pub trait Component {
    /// Master clock ticks consumed per internal step (for clock domain crossing).
    fn clock_divider(&self) -> u64 {
        1
    }
}

/// Extension for components that act as bus masters (the CPU core).
pub trait BusMasterComponent: Component {
    type Bus: super::bus::Bus + ?Sized;

    /// Execute one master clock tick with bus access. Returns true at an
    /// instruction boundary.
    fn tick_with_bus(&mut self, bus: &mut Self::Bus, master: BusMaster) -> bool;
}
