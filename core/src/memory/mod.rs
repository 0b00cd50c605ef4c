pub mod arbiter;
pub mod cpu_port;
pub mod mmu;

pub use arbiter::{
    AccessCategory, AccessCounters, AccessGrant, MemoryArbiter, PendingLatency, Region,
};
pub use cpu_port::CpuPort;
pub use mmu::{AddressResolver, IoPersonality, MmuState, RomOverlays};
