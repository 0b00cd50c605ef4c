//! Cycle-level state machine.
//!
//! [`transition`] is pure: it takes the current state, a copy of the
//! register/MMU context and the per-cycle inputs, and returns the next state,
//! the updated context and at most one memory operation. The tick driver in
//! `mod.rs` owns wait-states, the debug hold and applying the result.

use log::trace;

use super::Registers;
use super::table::{AddressingMode, ControlSignals, Instruction, OpcodeEntry, OpcodeTable};
use crate::device::dmagic::{DMA_LIST_LEN, DmaDescriptor};
use crate::memory::mmu::MmuState;

pub const NMI_VECTOR: u16 = 0xFFFA;
pub const RESET_VECTOR: u16 = 0xFFFC;
pub const IRQ_VECTOR: u16 = 0xFFFE;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterruptKind {
    Brk,
    Irq,
    Nmi,
}

impl InterruptKind {
    pub fn vector(self) -> u16 {
        match self {
            InterruptKind::Nmi => NMI_VECTOR,
            InterruptKind::Brk | InterruptKind::Irq => IRQ_VECTOR,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DmaPhase {
    Read,
    Write,
    Fill,
    SwapReadSource,
    SwapReadDest,
    SwapWriteDest,
    SwapWriteSource,
    Finish,
}

/// A DMA descriptor being executed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DmaJob {
    pub list: u32,
    pub descriptor: DmaDescriptor,
    /// Bytes completed so far.
    pub step: u32,
    pub phase: DmaPhase,
    /// Byte carried between the halves of a swap.
    pub latch: u8,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecState {
    Reset,
    VectorFetch { vector: u16, step: u8 },
    InstructionFetch,
    InstructionDecode,
    Operand1,
    Operand2,
    /// Pointer reads of the indirect data modes: 0 latches the low byte,
    /// 1 the high byte.
    Dereference(u8),
    LoadTarget,
    LoadTargetHigh,
    /// Applies a pulled stack byte.
    MicrocodeInterpret,
    WriteCommit,
    WriteCommitHigh,
    PushLow,
    Rts,
    Rts2,
    Rti(u8),
    CallSubroutine,
    CallSubroutine2,
    JumpDereference(u8),
    B16TakeBranch,
    TakeBranch8,
    TakeBranch8b,
    Interrupt { kind: InterruptKind, step: u8 },
    DmaListRead { list: u32, index: u8, bytes: [u8; DMA_LIST_LEN] },
    DmaTransfer { job: DmaJob },
    ProcessorHold { resume: Box<ExecState>, deferred: Option<PendingMemoryOp> },
}

/// Per-instruction scratch registers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Latches {
    /// Address the current opcode was fetched from.
    pub opcode_pc: u16,
    pub opcode: u8,
    pub arg1: u8,
    pub arg2: u8,
    /// Indirect pointer being dereferenced.
    pub pointer: u16,
    /// Effective address.
    pub address: u16,
    /// Operand, return address or word being modified.
    pub value: u16,
}

/// Everything a transition may read and rewrite.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoreState {
    pub regs: Registers,
    pub mmu: MmuState,
    pub latches: Latches,
    /// Set by MAP, cleared by EOM. Blocks interrupt admission.
    pub map_inhibit: bool,
}

impl CoreState {
    pub const fn reset() -> Self {
        Self {
            regs: Registers::RESET,
            mmu: MmuState::reset(),
            latches: Latches {
                opcode_pc: 0,
                opcode: 0,
                arg1: 0,
                arg2: 0,
                pointer: 0,
                address: 0,
                value: 0,
            },
            map_inhibit: false,
        }
    }
}

impl Default for CoreState {
    fn default() -> Self {
        Self::reset()
    }
}

/// Signals sampled by the driver for one transition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CycleInput {
    /// Result of the previous read.
    pub data: u8,
    /// Latched NMI edge.
    pub nmi: bool,
    /// IRQ line level.
    pub irq: bool,
    /// List address of a DMA job awaiting admission.
    pub dma_request: Option<u32>,
    pub trace: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemoryKind {
    Read,
    Write(u8),
}

/// Memory request emitted by a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingMemoryOp {
    pub address: u32,
    pub kind: MemoryKind,
    /// `address` is a 16-bit CPU address to pass through the resolver.
    /// Otherwise it is physical (DMA traffic).
    pub resolve: bool,
}

impl PendingMemoryOp {
    pub fn cpu_read(addr: u16) -> Self {
        Self {
            address: addr as u32,
            kind: MemoryKind::Read,
            resolve: true,
        }
    }

    pub fn cpu_write(addr: u16, data: u8) -> Self {
        Self {
            address: addr as u32,
            kind: MemoryKind::Write(data),
            resolve: true,
        }
    }

    pub fn phys_read(addr: u32) -> Self {
        Self {
            address: addr,
            kind: MemoryKind::Read,
            resolve: false,
        }
    }

    pub fn phys_write(addr: u32, data: u8) -> Self {
        Self {
            address: addr,
            kind: MemoryKind::Write(data),
            resolve: false,
        }
    }

    pub fn is_write(&self) -> bool {
        matches!(self.kind, MemoryKind::Write(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleEvent {
    NmiAccepted,
    DmaAdmitted,
    DmaCompleted,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    pub next: ExecState,
    pub core: CoreState,
    pub memory: Option<PendingMemoryOp>,
    pub event: Option<CycleEvent>,
    /// An instruction completed on this cycle.
    pub retired: bool,
}

pub fn transition(
    state: &ExecState,
    core: &CoreState,
    input: &CycleInput,
    table: &OpcodeTable,
) -> Transition {
    let mut step = Step {
        core: *core,
        input,
        table,
        memory: None,
        event: None,
        retired: false,
    };
    let next = step.run(state);
    Transition {
        next,
        core: step.core,
        memory: step.memory,
        event: step.event,
        retired: step.retired,
    }
}

/// Working set of a single transition.
pub(super) struct Step<'a> {
    pub(super) core: CoreState,
    pub(super) input: &'a CycleInput,
    table: &'a OpcodeTable,
    memory: Option<PendingMemoryOp>,
    pub(super) event: Option<CycleEvent>,
    pub(super) retired: bool,
}

impl Step<'_> {
    fn run(&mut self, state: &ExecState) -> ExecState {
        match state {
            ExecState::Reset => {
                self.core = CoreState::reset();
                ExecState::VectorFetch {
                    vector: RESET_VECTOR,
                    step: 0,
                }
            }
            ExecState::VectorFetch { vector, step } => self.vector_fetch(*vector, *step),
            ExecState::InstructionFetch => self.instruction_fetch(),
            ExecState::InstructionDecode => self.decode(),
            ExecState::Operand1 => self.operand1(),
            ExecState::Operand2 => {
                self.core.latches.arg2 = self.input.data;
                self.addressing(self.entry())
            }
            ExecState::Dereference(n) => self.dereference(*n),
            ExecState::LoadTarget => self.load_target(),
            ExecState::LoadTargetHigh => self.load_target_high(),
            ExecState::MicrocodeInterpret => self.microcode_interpret(),
            ExecState::WriteCommit => self.write_commit(),
            ExecState::WriteCommitHigh => {
                let l = self.core.latches;
                let addr = self.next_byte(l.address);
                self.write(addr, (l.value >> 8) as u8);
                self.finish()
            }
            ExecState::PushLow => {
                self.push(self.core.latches.value as u8);
                self.finish()
            }
            ExecState::Rts => self.rts(),
            ExecState::Rts2 => self.rts2(),
            ExecState::Rti(n) => self.rti(*n),
            ExecState::CallSubroutine => self.call_subroutine(),
            ExecState::CallSubroutine2 => self.call_subroutine2(),
            ExecState::JumpDereference(n) => self.jump_dereference(*n),
            ExecState::B16TakeBranch => self.b16_take_branch(),
            ExecState::TakeBranch8 | ExecState::TakeBranch8b => self.take_branch8(),
            ExecState::Interrupt { kind, step } => self.interrupt(*kind, *step),
            ExecState::DmaListRead { list, index, bytes } => {
                self.dma_list_read(*list, *index, *bytes)
            }
            ExecState::DmaTransfer { job } => self.dma_transfer(*job),
            // Serviced by the tick driver.
            ExecState::ProcessorHold { .. } => state.clone(),
        }
    }

    // ---- Bus request helpers ----

    #[inline]
    pub(super) fn read(&mut self, addr: u16) {
        self.memory = Some(PendingMemoryOp::cpu_read(addr));
    }

    #[inline]
    pub(super) fn write(&mut self, addr: u16, data: u8) {
        self.memory = Some(PendingMemoryOp::cpu_write(addr, data));
    }

    #[inline]
    pub(super) fn read_phys(&mut self, addr: u32) {
        self.memory = Some(PendingMemoryOp::phys_read(addr));
    }

    #[inline]
    pub(super) fn write_phys(&mut self, addr: u32, data: u8) {
        self.memory = Some(PendingMemoryOp::phys_write(addr, data));
    }

    /// Read the byte at PC and advance it.
    pub(super) fn fetch_pc(&mut self) {
        let pc = self.core.regs.pc;
        self.read(pc);
        self.core.regs.pc = pc.wrapping_add(1);
    }

    pub(super) fn entry(&self) -> OpcodeEntry {
        self.table.entry(self.core.latches.opcode)
    }

    /// Complete the current instruction.
    pub(super) fn finish(&mut self) -> ExecState {
        self.retired = true;
        ExecState::InstructionFetch
    }

    /// Address of the second byte of a word operand. Base-page words wrap
    /// inside the page.
    pub(super) fn next_byte(&self, addr: u16) -> u16 {
        match self.entry().mode {
            AddressingMode::BasePage
            | AddressingMode::BasePageX
            | AddressingMode::BasePageY
            | AddressingMode::BasePageIndirectX
            | AddressingMode::BasePageIndirectY
            | AddressingMode::BasePageIndirectZ => {
                (addr & 0xFF00) | (addr.wrapping_add(1) & 0x00FF)
            }
            _ => addr.wrapping_add(1),
        }
    }

    #[inline]
    fn base_page(&self, offset: u8) -> u16 {
        u16::from_be_bytes([self.core.regs.b, offset])
    }

    // ---- Fetch / decode ----

    fn instruction_fetch(&mut self) -> ExecState {
        if let Some(next) = self.admit() {
            return next;
        }
        self.core.latches.opcode_pc = self.core.regs.pc;
        self.fetch_pc();
        ExecState::InstructionDecode
    }

    fn decode(&mut self) -> ExecState {
        let opcode = self.input.data;
        self.core.latches.opcode = opcode;
        let entry = self.entry();
        trace!(
            "{:04X}: {:02X} {:?} {:?}",
            self.core.latches.opcode_pc, opcode, entry.instruction, entry.mode
        );

        if entry.signals.contains(ControlSignals::SINGLE_CYCLE) {
            self.single_cycle(entry.instruction);
            self.retired = true;
            if self.input.trace {
                return ExecState::ProcessorHold {
                    resume: Box::new(ExecState::InstructionFetch),
                    deferred: None,
                };
            }
            return ExecState::InstructionFetch;
        }

        if entry.bytes > 1 {
            self.fetch_pc();
            return ExecState::Operand1;
        }
        self.implied(entry.instruction)
    }

    fn operand1(&mut self) -> ExecState {
        self.core.latches.arg1 = self.input.data;
        let entry = self.entry();
        if entry.bytes > 2 {
            self.fetch_pc();
            return match entry.mode {
                AddressingMode::RelativeWord => ExecState::B16TakeBranch,
                _ => ExecState::Operand2,
            };
        }
        self.addressing(entry)
    }

    // ---- Addressing modes ----

    /// Runs in the cycle that consumed the last operand byte.
    fn addressing(&mut self, entry: OpcodeEntry) -> ExecState {
        let l = self.core.latches;
        let r = self.core.regs;
        let absolute = u16::from_le_bytes([l.arg1, l.arg2]);

        match entry.mode {
            AddressingMode::Immediate => {
                if entry.instruction == Instruction::Rtn {
                    self.pull();
                    return ExecState::Rts;
                }
                self.execute_operand(entry.instruction, l.arg1);
                self.finish()
            }
            AddressingMode::ImmediateWord => {
                self.core.latches.value = absolute;
                self.push(l.arg2);
                ExecState::PushLow
            }
            AddressingMode::Relative => self.branch8(entry.instruction),
            AddressingMode::BasePageRelative => {
                let addr = self.base_page(l.arg1);
                self.core.latches.address = addr;
                self.read(addr);
                ExecState::LoadTarget
            }
            AddressingMode::BasePage => self.effective(self.base_page(l.arg1), entry),
            AddressingMode::BasePageX => {
                self.effective(self.base_page(l.arg1.wrapping_add(r.x)), entry)
            }
            AddressingMode::BasePageY => {
                self.effective(self.base_page(l.arg1.wrapping_add(r.y)), entry)
            }
            AddressingMode::Absolute => match entry.instruction {
                Instruction::Jmp => {
                    self.core.regs.pc = absolute;
                    self.finish()
                }
                Instruction::Jsr => {
                    self.core.latches.address = absolute;
                    self.push_return_high()
                }
                _ => self.effective(absolute, entry),
            },
            AddressingMode::AbsoluteX => self.effective(absolute.wrapping_add(r.x as u16), entry),
            AddressingMode::AbsoluteY => self.effective(absolute.wrapping_add(r.y as u16), entry),
            AddressingMode::Indirect | AddressingMode::IndirectX => {
                let index = if entry.mode == AddressingMode::IndirectX {
                    r.x as u16
                } else {
                    0
                };
                self.core.latches.pointer = absolute.wrapping_add(index);
                if entry.instruction == Instruction::Jsr {
                    self.push_return_high()
                } else {
                    ExecState::JumpDereference(0)
                }
            }
            AddressingMode::BasePageIndirectX => {
                self.start_dereference(self.base_page(l.arg1.wrapping_add(r.x)))
            }
            AddressingMode::BasePageIndirectY | AddressingMode::BasePageIndirectZ => {
                self.start_dereference(self.base_page(l.arg1))
            }
            AddressingMode::StackIndirectY => {
                self.start_dereference(r.sp().wrapping_add(l.arg1 as u16))
            }
            // Reached only by tables that give these modes operand bytes.
            AddressingMode::Implied
            | AddressingMode::Accumulator
            | AddressingMode::RelativeWord => self.finish(),
        }
    }

    fn start_dereference(&mut self, pointer: u16) -> ExecState {
        self.core.latches.pointer = pointer;
        self.read(pointer);
        ExecState::Dereference(0)
    }

    fn dereference(&mut self, step: u8) -> ExecState {
        let data = self.input.data;
        let entry = self.entry();
        if step == 0 {
            self.core.latches.value = data as u16;
            let pointer = self.core.latches.pointer;
            let next = match entry.mode {
                AddressingMode::StackIndirectY => pointer.wrapping_add(1),
                _ => (pointer & 0xFF00) | (pointer.wrapping_add(1) & 0x00FF),
            };
            self.read(next);
            return ExecState::Dereference(1);
        }

        let base = u16::from_le_bytes([self.core.latches.value as u8, data]);
        let r = self.core.regs;
        let index = match entry.mode {
            AddressingMode::BasePageIndirectY | AddressingMode::StackIndirectY => r.y,
            AddressingMode::BasePageIndirectZ => r.z,
            _ => 0,
        };
        self.effective(base.wrapping_add(index as u16), entry)
    }

    /// Effective address known: issue the data access.
    fn effective(&mut self, addr: u16, entry: OpcodeEntry) -> ExecState {
        self.core.latches.address = addr;
        let signals = entry.signals;
        if signals.contains(ControlSignals::STORE) {
            let data = self.store_value(entry.instruction);
            self.write(addr, data);
            return self.finish();
        }
        if signals.intersects(ControlSignals::LOAD | ControlSignals::MODIFY) {
            self.read(addr);
            return ExecState::LoadTarget;
        }
        self.finish()
    }

    // ---- Data cycles ----

    fn load_target(&mut self) -> ExecState {
        let data = self.input.data;
        let entry = self.entry();
        if entry.signals.contains(ControlSignals::WORD) {
            self.core.latches.value = data as u16;
            let addr = self.next_byte(self.core.latches.address);
            self.read(addr);
            return ExecState::LoadTargetHigh;
        }

        match entry.instruction {
            Instruction::Bbr(_) | Instruction::Bbs(_) => self.branch_on_bit(entry.instruction, data),
            ins if entry.signals.contains(ControlSignals::MODIFY) => {
                self.core.latches.value = self.modify(ins, data) as u16;
                ExecState::WriteCommit
            }
            ins => {
                self.execute_operand(ins, data);
                self.finish()
            }
        }
    }

    fn load_target_high(&mut self) -> ExecState {
        let word = u16::from_le_bytes([self.core.latches.value as u8, self.input.data]);
        let entry = self.entry();
        if entry.instruction == Instruction::Phw {
            self.core.latches.value = word;
            self.push((word >> 8) as u8);
            return ExecState::PushLow;
        }
        self.core.latches.value = self.modify_word(entry.instruction, word);
        ExecState::WriteCommit
    }

    fn write_commit(&mut self) -> ExecState {
        let l = self.core.latches;
        self.write(l.address, l.value as u8);
        if self.entry().signals.contains(ControlSignals::WORD) {
            ExecState::WriteCommitHigh
        } else {
            self.finish()
        }
    }
}
