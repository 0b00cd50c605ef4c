//! 45GS02/4510 core: the 65CE02 instruction set with MAP banking, driven one
//! master-clock tick at a time through the memory arbiter.

pub mod alu;
mod branch;
pub mod debug;
mod dma;
pub mod exec;
mod interpret;
mod stack;
pub mod table;

use log::debug;

use crate::core::{
    Bus, BusMaster,
    bus::InterruptState,
    component::{BusMasterComponent, Component},
};
use crate::cpu::{
    Cpu,
    state::{CpuStateTrait, Gs4510State},
};
use crate::memory::{AddressResolver, MemoryArbiter, PendingLatency, RomOverlays};

pub use debug::{DebugCommand, DebugPort};
pub use exec::{
    CoreState, CycleEvent, CycleInput, ExecState, MemoryKind, PendingMemoryOp, Transition,
    transition,
};
pub use table::{GS4510, OpcodeTable};

use alu::{AluOut, WordOut};

#[repr(u8)]
#[derive(Copy, Clone, Debug)]
pub enum StatusFlag {
    C = 0x01, // Carry
    Z = 0x02, // Zero
    I = 0x04, // Interrupt Disable
    D = 0x08, // Decimal
    B = 0x10, // Break (only in pushed copies)
    E = 0x20, // 8-bit stack
    V = 0x40, // Overflow
    N = 0x80, // Negative
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Registers {
    pub a: u8,
    pub b: u8, // base page
    pub x: u8,
    pub y: u8,
    pub z: u8,
    pub sph: u8,
    pub spl: u8,
    pub pc: u16,
    pub p: u8,
}

impl Registers {
    pub const RESET: Registers = Registers {
        a: 0x11,
        b: 0x00,
        x: 0x22,
        y: 0x33,
        z: 0x00,
        sph: 0x01,
        spl: 0xFF,
        pc: 0x0000,
        p: StatusFlag::I as u8 | StatusFlag::E as u8,
    };

    #[inline]
    pub fn sp(&self) -> u16 {
        u16::from_be_bytes([self.sph, self.spl])
    }

    #[inline]
    pub fn set_sp(&mut self, sp: u16) {
        [self.sph, self.spl] = sp.to_be_bytes();
    }

    #[inline]
    pub fn flag(&self, flag: StatusFlag) -> bool {
        self.p & flag as u8 != 0
    }

    #[inline]
    pub fn set_flag(&mut self, flag: StatusFlag, set: bool) {
        if set {
            self.p |= flag as u8;
        } else {
            self.p &= !(flag as u8);
        }
    }

    #[inline]
    pub fn set_nz(&mut self, value: u8) {
        self.set_flag(StatusFlag::N, value & 0x80 != 0);
        self.set_flag(StatusFlag::Z, value == 0);
    }

    /// Commit ALU flags and hand back the result byte.
    pub fn apply(&mut self, out: AluOut) -> u8 {
        self.set_flag(StatusFlag::N, out.n);
        self.set_flag(StatusFlag::Z, out.z);
        if let Some(v) = out.v {
            self.set_flag(StatusFlag::V, v);
        }
        if let Some(c) = out.c {
            self.set_flag(StatusFlag::C, c);
        }
        out.value
    }

    pub fn apply_word(&mut self, out: WordOut) -> u16 {
        self.set_flag(StatusFlag::N, out.n);
        self.set_flag(StatusFlag::Z, out.z);
        if let Some(c) = out.c {
            self.set_flag(StatusFlag::C, c);
        }
        out.value
    }

    /// P from a pulled byte: B is not a real flag and E is left alone.
    pub fn restore_p(&mut self, data: u8) {
        let keep = StatusFlag::E as u8;
        self.p = (data & !(StatusFlag::B as u8 | keep)) | (self.p & keep);
    }

    // With E set the stack is confined to one page: only SPL moves.

    pub fn inc_sp(&mut self) {
        if self.flag(StatusFlag::E) {
            self.spl = self.spl.wrapping_add(1);
        } else {
            self.set_sp(self.sp().wrapping_add(1));
        }
    }

    pub fn dec_sp(&mut self) {
        if self.flag(StatusFlag::E) {
            self.spl = self.spl.wrapping_sub(1);
        } else {
            self.set_sp(self.sp().wrapping_sub(1));
        }
    }

    /// Drop `n` bytes from the stack (`RTS #n`).
    pub fn release_stack(&mut self, n: u8) {
        if self.flag(StatusFlag::E) {
            self.spl = self.spl.wrapping_add(n);
        } else {
            self.set_sp(self.sp().wrapping_add(n as u16));
        }
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::RESET
    }
}

/// CPU speed, expressed as master-clock ticks per CPU cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClockSpeed {
    Mhz1,
    Mhz2,
    Mhz3_5,
    #[default]
    Full,
}

impl ClockSpeed {
    pub const fn divider(self) -> u64 {
        match self {
            ClockSpeed::Mhz1 => 40,
            ClockSpeed::Mhz2 => 20,
            ClockSpeed::Mhz3_5 => 12,
            ClockSpeed::Full => 1,
        }
    }
}

/// Externally driven configuration lines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConfigInputs {
    pub speed: ClockSpeed,
    pub overlays: RomOverlays,
}

pub struct Gs4510 {
    /// Registers, MAP state and instruction latches.
    pub core: CoreState,
    pub arbiter: MemoryArbiter,
    pub debug: DebugPort,
    pub config: ConfigInputs,

    // Internal state
    pub(crate) state: ExecState,
    table: &'static OpcodeTable,
    latency: PendingLatency,
    speed_wait: u64,
    nmi_pending: bool,
    nmi_line: bool,
    irq_line: bool,
    external: InterruptState,
    cycles: u64,
}

impl Gs4510 {
    /// A core ready to fetch at PC 0 with reset registers. Use
    /// [`Cpu::reset`] to run the reset vector sequence instead.
    pub fn new() -> Self {
        Self::with_table(&GS4510)
    }

    /// A core decoding through `table`.
    pub fn with_table(table: &'static OpcodeTable) -> Self {
        Self {
            core: CoreState::reset(),
            arbiter: MemoryArbiter::new(),
            debug: DebugPort::new(),
            config: ConfigInputs::default(),
            state: ExecState::InstructionFetch,
            table,
            latency: PendingLatency::NONE,
            speed_wait: 0,
            nmi_pending: false,
            nmi_line: false,
            irq_line: false,
            external: InterruptState::default(),
            cycles: 0,
        }
    }

    pub fn state(&self) -> &ExecState {
        &self.state
    }

    /// Master-clock ticks seen since construction.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Wait-states still owed by the current access.
    pub fn pending_latency(&self) -> PendingLatency {
        self.latency
    }

    pub fn is_held(&self) -> bool {
        matches!(self.state, ExecState::ProcessorHold { .. })
    }

    /// Physical address `addr` resolves to under the live MAP, port and
    /// overlay state.
    pub fn resolve(&self, addr: u16, is_write: bool) -> u32 {
        AddressResolver {
            mmu: &self.core.mmu,
            port: &self.arbiter.port,
            overlays: self.config.overlays,
            io: self.arbiter.io_personality(),
        }
        .resolve(addr, is_write)
    }

    /// Advance one master-clock tick. Returns true when an instruction
    /// completed on this tick.
    pub fn execute_cycle<B: Bus + ?Sized>(&mut self, bus: &mut B) -> bool {
        self.cycles += 1;
        self.sample_interrupts(bus);

        if self.speed_wait > 0 {
            self.speed_wait -= 1;
            return false;
        }
        self.speed_wait = self.config.speed.divider() - 1;

        if !self.latency.is_settled() {
            self.latency.tick();
            return false;
        }

        if self.is_held() {
            self.service_hold(bus);
            return false;
        }

        if self.state == ExecState::InstructionFetch
            && self.debug.trace()
            && !self.debug.consume_step_credit()
        {
            self.enter_hold(ExecState::InstructionFetch, None);
            return false;
        }

        let input = CycleInput {
            data: self.arbiter.poll_read_result(),
            nmi: self.nmi_pending,
            irq: self.irq_line,
            dma_request: self.arbiter.dma.pending_request(),
            trace: self.debug.trace(),
        };
        let Transition {
            next,
            core,
            memory,
            event,
            retired,
        } = transition(&self.state, &self.core, &input, self.table);

        self.core = core;
        if let Some(event) = event {
            self.apply_event(event);
        }

        if self.debug.attention() {
            self.enter_hold(next, memory);
        } else {
            if let Some(op) = memory {
                self.issue(bus, op);
            }
            self.state = next;
        }
        retired
    }

    fn sample_interrupts<B: Bus + ?Sized>(&mut self, bus: &B) {
        let lines = bus.check_interrupts(BusMaster::Cpu).merge(self.external);
        if lines.nmi && !self.nmi_line {
            self.nmi_pending = true;
        }
        self.nmi_line = lines.nmi;
        self.irq_line = lines.irq;
    }

    fn apply_event(&mut self, event: CycleEvent) {
        match event {
            CycleEvent::NmiAccepted => self.nmi_pending = false,
            CycleEvent::DmaAdmitted => self.arbiter.dma.admit(),
            CycleEvent::DmaCompleted => self.arbiter.dma.complete(),
        }
    }

    fn issue<B: Bus + ?Sized>(&mut self, bus: &mut B, op: PendingMemoryOp) {
        let (master, phys) = if op.resolve {
            (BusMaster::Cpu, self.resolve(op.address as u16, op.is_write()))
        } else {
            (BusMaster::Dma, op.address)
        };
        let grant = match op.kind {
            MemoryKind::Read => self.arbiter.begin_read(bus, master, phys),
            MemoryKind::Write(data) => self.arbiter.begin_write(bus, master, phys, data),
        };
        self.latency = grant.latency;
    }

    fn enter_hold(&mut self, resume: ExecState, deferred: Option<PendingMemoryOp>) {
        debug!("processor hold, resume at {:?}", resume);
        self.state = match resume {
            held @ ExecState::ProcessorHold { .. } => held,
            resume => ExecState::ProcessorHold {
                resume: Box::new(resume),
                deferred,
            },
        };
    }

    /// One tick in the hold: serve a command, or leave once attention is
    /// dropped (and, in trace mode, a step is available).
    fn service_hold<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.debug.set_granted(self.debug.attention());

        if let Some(command) = self.debug.take_command() {
            debug!("monitor command {:?}", command);
            match command {
                DebugCommand::Read { address } => {
                    self.arbiter.begin_read(bus, BusMaster::Monitor, address);
                    let data = self.arbiter.poll_read_result();
                    self.debug.respond(data);
                }
                DebugCommand::Write { address, data } => {
                    self.arbiter.begin_write(bus, BusMaster::Monitor, address, data);
                }
                DebugCommand::SetPc { address } => self.redirect(address),
            }
            return;
        }

        if self.debug.attention() || (self.debug.trace() && !self.debug.has_step_credit()) {
            return;
        }

        self.debug.set_granted(false);
        let held = std::mem::replace(&mut self.state, ExecState::InstructionFetch);
        if let ExecState::ProcessorHold { resume, deferred } = held {
            debug!("hold released");
            if let Some(op) = deferred {
                self.issue(bus, op);
            }
            self.state = *resume;
        }
    }

    /// Set PC from the monitor. The in-flight instruction is abandoned;
    /// a DMA job keeps running.
    fn redirect(&mut self, address: u16) {
        self.core.regs.pc = address;
        if let ExecState::ProcessorHold { resume, deferred } = &mut self.state {
            if !matches!(
                **resume,
                ExecState::DmaListRead { .. } | ExecState::DmaTransfer { .. }
            ) {
                **resume = ExecState::InstructionFetch;
                *deferred = None;
            }
        }
    }
}

impl Default for Gs4510 {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Gs4510 {
    fn clock_divider(&self) -> u64 {
        self.config.speed.divider()
    }
}

impl BusMasterComponent for Gs4510 {
    type Bus = dyn Bus;

    fn tick_with_bus(&mut self, bus: &mut Self::Bus, _master: BusMaster) -> bool {
        self.execute_cycle(bus)
    }
}

impl Cpu for Gs4510 {
    fn reset(&mut self) {
        self.state = ExecState::Reset;
        self.arbiter.reset();
        self.latency = PendingLatency::NONE;
        self.speed_wait = 0;
        self.nmi_pending = false;
    }

    fn signal_interrupt(&mut self, int: InterruptState) {
        self.external = int;
    }

    fn is_sleeping(&self) -> bool {
        self.is_held()
    }
}

impl CpuStateTrait for Gs4510 {
    type Snapshot = Gs4510State;

    fn snapshot(&self) -> Gs4510State {
        let r = &self.core.regs;
        let l = &self.core.latches;
        Gs4510State {
            a: r.a,
            b: r.b,
            x: r.x,
            y: r.y,
            z: r.z,
            sp: r.sp(),
            pc: r.pc,
            p: r.p,
            opcode: l.opcode,
            arg1: l.arg1,
            arg2: l.arg2,
            mmu: self.core.mmu,
            map_inhibit: self.core.map_inhibit,
            held: self.is_held(),
        }
    }
}
