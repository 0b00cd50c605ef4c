use log::debug;

use super::exec::{CycleEvent, ExecState, InterruptKind, Step};
use super::table::{AddressingMode, Instruction};
use super::StatusFlag;
use crate::device::dmagic::DMA_LIST_LEN;

impl Step<'_> {
    pub(super) fn push(&mut self, data: u8) {
        let sp = self.core.regs.sp();
        self.write(sp, data);
        self.core.regs.dec_sp();
    }

    pub(super) fn pull(&mut self) {
        self.core.regs.inc_sp();
        let sp = self.core.regs.sp();
        self.read(sp);
    }

    /// Multi-cycle implied instructions.
    pub(super) fn implied(&mut self, instruction: Instruction) -> ExecState {
        let r = self.core.regs;
        match instruction {
            Instruction::Pha => self.push_and_finish(r.a),
            Instruction::Phx => self.push_and_finish(r.x),
            Instruction::Phy => self.push_and_finish(r.y),
            Instruction::Phz => self.push_and_finish(r.z),
            Instruction::Php => self.push_and_finish(r.p | StatusFlag::B as u8),
            Instruction::Pla
            | Instruction::Plx
            | Instruction::Ply
            | Instruction::Plz
            | Instruction::Plp => {
                self.pull();
                ExecState::MicrocodeInterpret
            }
            Instruction::Rts => {
                self.pull();
                ExecState::Rts
            }
            Instruction::Rti => {
                self.pull();
                ExecState::Rti(0)
            }
            Instruction::Brk => {
                // Skip the signature byte.
                self.core.regs.pc = r.pc.wrapping_add(1);
                ExecState::Interrupt {
                    kind: InterruptKind::Brk,
                    step: 0,
                }
            }
            _ => self.finish(),
        }
    }

    fn push_and_finish(&mut self, data: u8) -> ExecState {
        self.push(data);
        self.finish()
    }

    /// Apply a pulled byte.
    pub(super) fn microcode_interpret(&mut self) -> ExecState {
        let data = self.input.data;
        let instruction = self.entry().instruction;
        let r = &mut self.core.regs;
        match instruction {
            Instruction::Pla => {
                r.a = data;
                r.set_nz(data);
            }
            Instruction::Plx => {
                r.x = data;
                r.set_nz(data);
            }
            Instruction::Ply => {
                r.y = data;
                r.set_nz(data);
            }
            Instruction::Plz => {
                r.z = data;
                r.set_nz(data);
            }
            Instruction::Plp => r.restore_p(data),
            _ => {}
        }
        self.finish()
    }

    // ---- Subroutines ----

    /// Push the high byte of the return address (last byte of the
    /// instruction) and continue into the call sequence.
    pub(super) fn push_return_high(&mut self) -> ExecState {
        let ret = self.core.regs.pc.wrapping_sub(1);
        self.core.latches.value = ret;
        self.push((ret >> 8) as u8);
        ExecState::CallSubroutine
    }

    pub(super) fn call_subroutine(&mut self) -> ExecState {
        self.push(self.core.latches.value as u8);
        ExecState::CallSubroutine2
    }

    pub(super) fn call_subroutine2(&mut self) -> ExecState {
        match self.entry().mode {
            AddressingMode::Indirect | AddressingMode::IndirectX => {
                self.read(self.core.latches.pointer);
                ExecState::JumpDereference(1)
            }
            _ => {
                self.core.regs.pc = self.core.latches.address;
                self.finish()
            }
        }
    }

    /// Indirect jump: 0 reads the pointer low byte, 1 latches it and reads the
    /// high byte, 2 loads PC.
    pub(super) fn jump_dereference(&mut self, step: u8) -> ExecState {
        let pointer = self.core.latches.pointer;
        match step {
            0 => {
                self.read(pointer);
                ExecState::JumpDereference(1)
            }
            1 => {
                self.core.latches.value = self.input.data as u16;
                self.read(pointer.wrapping_add(1));
                ExecState::JumpDereference(2)
            }
            _ => {
                self.core.regs.pc =
                    u16::from_le_bytes([self.core.latches.value as u8, self.input.data]);
                self.finish()
            }
        }
    }

    pub(super) fn rts(&mut self) -> ExecState {
        self.core.latches.value = self.input.data as u16;
        self.pull();
        ExecState::Rts2
    }

    /// Final RTS cycle. Unless something must be admitted at the next
    /// boundary, the following opcode fetch is issued here.
    pub(super) fn rts2(&mut self) -> ExecState {
        let target =
            u16::from_le_bytes([self.core.latches.value as u8, self.input.data]).wrapping_add(1);
        if self.entry().instruction == Instruction::Rtn {
            let release = self.core.latches.arg1;
            self.core.regs.release_stack(release);
        }
        self.core.regs.pc = target;
        self.retired = true;

        if self.input.trace || self.admission_pending() {
            return ExecState::InstructionFetch;
        }
        self.core.latches.opcode_pc = target;
        self.fetch_pc();
        ExecState::InstructionDecode
    }

    pub(super) fn rti(&mut self, step: u8) -> ExecState {
        let data = self.input.data;
        match step {
            0 => {
                self.core.regs.restore_p(data);
                self.pull();
                ExecState::Rti(1)
            }
            1 => {
                self.core.latches.value = data as u16;
                self.pull();
                ExecState::Rti(2)
            }
            _ => {
                self.core.regs.pc = u16::from_le_bytes([self.core.latches.value as u8, data]);
                self.finish()
            }
        }
    }

    // ---- Interrupts ----

    fn admission_pending(&self) -> bool {
        let input = self.input;
        input.dma_request.is_some()
            || (!self.core.map_inhibit
                && (input.nmi || (input.irq && !self.core.regs.flag(StatusFlag::I))))
    }

    /// Boundary admission: DMA first, then NMI, then IRQ. NMI and IRQ wait
    /// while a MAP sequence is open.
    pub(super) fn admit(&mut self) -> Option<ExecState> {
        if let Some(list) = self.input.dma_request {
            debug!("DMA admitted, list at {:07X}", list);
            self.event = Some(CycleEvent::DmaAdmitted);
            self.read_phys(list);
            return Some(ExecState::DmaListRead {
                list,
                index: 0,
                bytes: [0; DMA_LIST_LEN],
            });
        }
        if self.core.map_inhibit {
            return None;
        }
        let kind = if self.input.nmi {
            self.event = Some(CycleEvent::NmiAccepted);
            InterruptKind::Nmi
        } else if self.input.irq && !self.core.regs.flag(StatusFlag::I) {
            InterruptKind::Irq
        } else {
            return None;
        };
        debug!("{:?} accepted at {:04X}", kind, self.core.regs.pc);
        Some(ExecState::Interrupt { kind, step: 0 })
    }

    /// Push PCH, PCL and P, then fetch the vector.
    pub(super) fn interrupt(&mut self, kind: InterruptKind, step: u8) -> ExecState {
        let r = self.core.regs;
        match step {
            0 => {
                self.push((r.pc >> 8) as u8);
                ExecState::Interrupt { kind, step: 1 }
            }
            1 => {
                self.push(r.pc as u8);
                ExecState::Interrupt { kind, step: 2 }
            }
            _ => {
                let b = if kind == InterruptKind::Brk {
                    StatusFlag::B as u8
                } else {
                    0
                };
                self.push((r.p & !(StatusFlag::B as u8)) | b);
                self.core.regs.set_flag(StatusFlag::I, true);
                ExecState::VectorFetch {
                    vector: kind.vector(),
                    step: 0,
                }
            }
        }
    }

    pub(super) fn vector_fetch(&mut self, vector: u16, step: u8) -> ExecState {
        match step {
            0 => {
                self.read(vector);
                ExecState::VectorFetch { vector, step: 1 }
            }
            1 => {
                self.core.latches.value = self.input.data as u16;
                self.read(vector.wrapping_add(1));
                ExecState::VectorFetch { vector, step: 2 }
            }
            _ => {
                self.core.regs.pc =
                    u16::from_le_bytes([self.core.latches.value as u8, self.input.data]);
                self.finish()
            }
        }
    }
}
