use super::exec::{ExecState, Step};
use super::table::{Condition, Instruction};
use super::StatusFlag;

impl Step<'_> {
    pub(super) fn condition(&self, condition: Condition) -> bool {
        let r = &self.core.regs;
        match condition {
            Condition::Always => true,
            Condition::Plus => !r.flag(StatusFlag::N),
            Condition::Minus => r.flag(StatusFlag::N),
            Condition::OverflowClear => !r.flag(StatusFlag::V),
            Condition::OverflowSet => r.flag(StatusFlag::V),
            Condition::CarryClear => !r.flag(StatusFlag::C),
            Condition::CarrySet => r.flag(StatusFlag::C),
            Condition::NotEqual => !r.flag(StatusFlag::Z),
            Condition::Equal => r.flag(StatusFlag::Z),
        }
    }

    /// 8-bit relative branch: the condition is resolved while the offset
    /// byte is consumed.
    pub(super) fn branch8(&mut self, instruction: Instruction) -> ExecState {
        match instruction {
            Instruction::Branch(condition) if self.condition(condition) => ExecState::TakeBranch8,
            _ => self.finish(),
        }
    }

    /// Taken 8-bit branch. PC already points past the instruction, so the
    /// offset in the last operand byte applies directly.
    pub(super) fn take_branch8(&mut self) -> ExecState {
        let l = self.core.latches;
        let offset = if self.entry().bytes == 3 { l.arg2 } else { l.arg1 };
        self.core.regs.pc = self.core.regs.pc.wrapping_add(offset as i8 as i16 as u16);
        self.finish()
    }

    /// BBR/BBS: the base-page byte has arrived.
    pub(super) fn branch_on_bit(&mut self, instruction: Instruction, data: u8) -> ExecState {
        let taken = match instruction {
            Instruction::Bbr(bit) => data & (1 << bit) == 0,
            Instruction::Bbs(bit) => data & (1 << bit) != 0,
            _ => false,
        };
        if taken {
            ExecState::TakeBranch8b
        } else {
            self.finish()
        }
    }

    /// 16-bit branch and BSR. The offset is relative to the last byte of the
    /// instruction.
    pub(super) fn b16_take_branch(&mut self) -> ExecState {
        let data = self.input.data;
        self.core.latches.arg2 = data;
        let l = self.core.latches;
        let offset = u16::from_le_bytes([l.arg1, data]);
        let target = l.opcode_pc.wrapping_add(2).wrapping_add(offset);

        match self.entry().instruction {
            Instruction::Bsr => {
                self.core.latches.address = target;
                self.push_return_high()
            }
            Instruction::Branch(condition) => {
                if self.condition(condition) {
                    self.core.regs.pc = target;
                }
                self.finish()
            }
            _ => self.finish(),
        }
    }
}
