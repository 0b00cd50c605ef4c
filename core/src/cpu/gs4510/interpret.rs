use log::debug;

use super::exec::Step;
use super::table::Instruction;
use super::{StatusFlag, alu};

impl Step<'_> {
    /// Register-only instructions, completed in the decode cycle.
    pub(super) fn single_cycle(&mut self, instruction: Instruction) {
        let r = &mut self.core.regs;
        match instruction {
            Instruction::Clc => r.set_flag(StatusFlag::C, false),
            Instruction::Sec => r.set_flag(StatusFlag::C, true),
            Instruction::Cli => r.set_flag(StatusFlag::I, false),
            Instruction::Sei => r.set_flag(StatusFlag::I, true),
            Instruction::Clv => r.set_flag(StatusFlag::V, false),
            Instruction::Cld => r.set_flag(StatusFlag::D, false),
            Instruction::Sed => r.set_flag(StatusFlag::D, true),
            Instruction::Cle => r.set_flag(StatusFlag::E, false),
            Instruction::See => r.set_flag(StatusFlag::E, true),

            Instruction::Tax => {
                r.x = r.a;
                r.set_nz(r.x);
            }
            Instruction::Txa => {
                r.a = r.x;
                r.set_nz(r.a);
            }
            Instruction::Tay => {
                r.y = r.a;
                r.set_nz(r.y);
            }
            Instruction::Tya => {
                r.a = r.y;
                r.set_nz(r.a);
            }
            Instruction::Taz => {
                r.z = r.a;
                r.set_nz(r.z);
            }
            Instruction::Tza => {
                r.a = r.z;
                r.set_nz(r.a);
            }
            Instruction::Tab => r.b = r.a,
            Instruction::Tba => {
                r.a = r.b;
                r.set_nz(r.a);
            }
            Instruction::Tsx => {
                r.x = r.spl;
                r.set_nz(r.x);
            }
            Instruction::Txs => r.spl = r.x,
            Instruction::Tsy => {
                r.y = r.sph;
                r.set_nz(r.y);
            }
            Instruction::Tys => r.sph = r.y,

            Instruction::Inx => r.x = r.apply(alu::inc(r.x)),
            Instruction::Iny => r.y = r.apply(alu::inc(r.y)),
            Instruction::Inz => r.z = r.apply(alu::inc(r.z)),
            Instruction::Dex => r.x = r.apply(alu::dec(r.x)),
            Instruction::Dey => r.y = r.apply(alu::dec(r.y)),
            Instruction::Dez => r.z = r.apply(alu::dec(r.z)),

            // Accumulator forms
            Instruction::Inc => r.a = r.apply(alu::inc(r.a)),
            Instruction::Dec => r.a = r.apply(alu::dec(r.a)),
            Instruction::Neg => r.a = r.apply(alu::neg(r.a)),
            Instruction::Asl => r.a = r.apply(alu::asl(r.a)),
            Instruction::Lsr => r.a = r.apply(alu::lsr(r.a)),
            Instruction::Asr => r.a = r.apply(alu::asr(r.a)),
            Instruction::Rol => {
                let c = r.flag(StatusFlag::C);
                r.a = r.apply(alu::rol(r.a, c));
            }
            Instruction::Ror => {
                let c = r.flag(StatusFlag::C);
                r.a = r.apply(alu::ror(r.a, c));
            }

            Instruction::Map => {
                let (a, x, y, z) = (r.a, r.x, r.y, r.z);
                self.core.mmu.apply_map(a, x, y, z);
                self.core.map_inhibit = true;
                debug!(
                    "MAP a={:02X} x={:02X} y={:02X} z={:02X} -> {:?}",
                    a, x, y, z, self.core.mmu
                );
            }
            Instruction::Eom => self.core.map_inhibit = false,
            _ => {}
        }
    }

    /// Consume an operand byte (immediate or loaded).
    pub(super) fn execute_operand(&mut self, instruction: Instruction, m: u8) {
        let r = &mut self.core.regs;
        let carry = r.flag(StatusFlag::C);
        let decimal = r.flag(StatusFlag::D);
        match instruction {
            Instruction::Adc => r.a = r.apply(alu::add(r.a, m, carry, decimal)),
            Instruction::Sbc => r.a = r.apply(alu::sub(r.a, m, carry, decimal)),
            Instruction::And => r.a = r.apply(alu::and(r.a, m)),
            Instruction::Ora => r.a = r.apply(alu::ora(r.a, m)),
            Instruction::Eor => r.a = r.apply(alu::eor(r.a, m)),
            Instruction::Bit => {
                r.apply(alu::bit(r.a, m));
            }
            Instruction::Cmp => {
                r.apply(alu::compare(r.a, m));
            }
            Instruction::Cpx => {
                r.apply(alu::compare(r.x, m));
            }
            Instruction::Cpy => {
                r.apply(alu::compare(r.y, m));
            }
            Instruction::Cpz => {
                r.apply(alu::compare(r.z, m));
            }
            Instruction::Lda => {
                r.a = m;
                r.set_nz(m);
            }
            Instruction::Ldx => {
                r.x = m;
                r.set_nz(m);
            }
            Instruction::Ldy => {
                r.y = m;
                r.set_nz(m);
            }
            Instruction::Ldz => {
                r.z = m;
                r.set_nz(m);
            }
            _ => {}
        }
    }

    /// Byte read-modify-write: returns the value to write back.
    pub(super) fn modify(&mut self, instruction: Instruction, m: u8) -> u8 {
        let r = &mut self.core.regs;
        let carry = r.flag(StatusFlag::C);
        match instruction {
            Instruction::Asl => r.apply(alu::asl(m)),
            Instruction::Lsr => r.apply(alu::lsr(m)),
            Instruction::Asr => r.apply(alu::asr(m)),
            Instruction::Rol => r.apply(alu::rol(m, carry)),
            Instruction::Ror => r.apply(alu::ror(m, carry)),
            Instruction::Inc => r.apply(alu::inc(m)),
            Instruction::Dec => r.apply(alu::dec(m)),
            Instruction::Tsb => {
                r.set_flag(StatusFlag::Z, r.a & m == 0);
                m | r.a
            }
            Instruction::Trb => {
                r.set_flag(StatusFlag::Z, r.a & m == 0);
                m & !r.a
            }
            Instruction::Rmb(bit) => m & !(1 << bit),
            Instruction::Smb(bit) => m | (1 << bit),
            _ => m,
        }
    }

    pub(super) fn modify_word(&mut self, instruction: Instruction, w: u16) -> u16 {
        let r = &mut self.core.regs;
        let carry = r.flag(StatusFlag::C);
        match instruction {
            Instruction::Inw => r.apply_word(alu::inc_word(w)),
            Instruction::Dew => r.apply_word(alu::dec_word(w)),
            Instruction::Asw => r.apply_word(alu::asl_word(w)),
            Instruction::Row => r.apply_word(alu::rol_word(w, carry)),
            _ => w,
        }
    }

    pub(super) fn store_value(&self, instruction: Instruction) -> u8 {
        let r = &self.core.regs;
        match instruction {
            Instruction::Sta => r.a,
            Instruction::Stx => r.x,
            Instruction::Sty => r.y,
            Instruction::Stz => r.z,
            _ => 0,
        }
    }
}
