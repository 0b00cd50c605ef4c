//! Opcode personality: opcode byte → addressing mode, instruction and the
//! control signals the state machine sequences from.
//!
//! The table is plain data. `Gs4510` holds a `&'static OpcodeTable`, so an
//! alternate personality is a different table, not a different core.

use bitflags::bitflags;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressingMode {
    Implied,
    Accumulator,
    Immediate,
    ImmediateWord,
    BasePage,
    BasePageX,
    BasePageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    /// `JMP ($nnnn)`, `JSR ($nnnn)`
    Indirect,
    /// `JMP ($nnnn,X)`, `JSR ($nnnn,X)`
    IndirectX,
    BasePageIndirectX,
    BasePageIndirectY,
    BasePageIndirectZ,
    /// `($nn,SP),Y`
    StackIndirectY,
    Relative,
    RelativeWord,
    /// `BBR`/`BBS`: base-page operand plus 8-bit branch offset.
    BasePageRelative,
}

impl AddressingMode {
    pub const fn operand_bytes(self) -> u8 {
        match self {
            AddressingMode::Implied | AddressingMode::Accumulator => 0,
            AddressingMode::Immediate
            | AddressingMode::BasePage
            | AddressingMode::BasePageX
            | AddressingMode::BasePageY
            | AddressingMode::BasePageIndirectX
            | AddressingMode::BasePageIndirectY
            | AddressingMode::BasePageIndirectZ
            | AddressingMode::StackIndirectY
            | AddressingMode::Relative => 1,
            AddressingMode::ImmediateWord
            | AddressingMode::Absolute
            | AddressingMode::AbsoluteX
            | AddressingMode::AbsoluteY
            | AddressingMode::Indirect
            | AddressingMode::IndirectX
            | AddressingMode::RelativeWord
            | AddressingMode::BasePageRelative => 2,
        }
    }
}

/// Branch condition tested against P.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Condition {
    Always,
    Plus,
    Minus,
    OverflowClear,
    OverflowSet,
    CarryClear,
    CarrySet,
    NotEqual,
    Equal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instruction {
    Adc,
    And,
    Asl,
    Asr,
    Asw,
    Bbr(u8),
    Bbs(u8),
    Bit,
    Branch(Condition),
    Brk,
    Bsr,
    Clc,
    Cld,
    Cle,
    Cli,
    Clv,
    Cmp,
    Cpx,
    Cpy,
    Cpz,
    Dec,
    Dew,
    Dex,
    Dey,
    Dez,
    Eom,
    Eor,
    Inc,
    Inw,
    Inx,
    Iny,
    Inz,
    Jmp,
    Jsr,
    Lda,
    Ldx,
    Ldy,
    Ldz,
    Lsr,
    Map,
    Neg,
    Nop,
    Ora,
    Pha,
    Php,
    Phw,
    Phx,
    Phy,
    Phz,
    Pla,
    Plp,
    Plx,
    Ply,
    Plz,
    Rmb(u8),
    Rol,
    Ror,
    Row,
    Rti,
    /// `RTS #n`: return, then release `n` bytes of stack.
    Rtn,
    Rts,
    Sbc,
    Sec,
    Sed,
    See,
    Sei,
    Smb(u8),
    Sta,
    Stx,
    Sty,
    /// Stores the Z register.
    Stz,
    Tab,
    Tax,
    Tay,
    Taz,
    Tba,
    Trb,
    Tsb,
    Tsx,
    Tsy,
    Txa,
    Txs,
    Tya,
    Tys,
    Tza,
}

bitflags! {
    /// Control-signal bundle driving sequencing and the ALU.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ControlSignals: u16 {
        /// Fully executed in the decode cycle.
        const SINGLE_CYCLE = 1 << 0;
        /// Needs an operand value (immediate byte or memory read).
        const LOAD = 1 << 1;
        /// Writes a register to the effective address.
        const STORE = 1 << 2;
        /// Read-modify-write of the effective address.
        const MODIFY = 1 << 3;
        /// 16-bit operand.
        const WORD = 1 << 4;
        const BRANCH = 1 << 5;
        /// Pushes a return address before transferring control.
        const SUBROUTINE = 1 << 6;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpcodeEntry {
    pub mode: AddressingMode,
    pub instruction: Instruction,
    pub bytes: u8,
    pub signals: ControlSignals,
}

impl OpcodeEntry {
    pub const fn new(instruction: Instruction, mode: AddressingMode) -> Self {
        Self {
            mode,
            instruction,
            bytes: 1 + mode.operand_bytes(),
            signals: ControlSignals::from_bits_truncate(signals_for(instruction, mode)),
        }
    }
}

pub struct OpcodeTable {
    entries: [OpcodeEntry; 256],
}

impl OpcodeTable {
    pub const fn new(entries: [OpcodeEntry; 256]) -> Self {
        Self { entries }
    }

    #[inline]
    pub fn entry(&self, opcode: u8) -> OpcodeEntry {
        self.entries[opcode as usize]
    }
}

/// The 4510 personality.
pub static GS4510: OpcodeTable = gs4510_table();

const fn gs4510_table() -> OpcodeTable {
    let mut entries = [OpcodeEntry::new(Instruction::Nop, AddressingMode::Implied); 256];
    let mut i = 0;
    while i < 256 {
        let (instruction, mode) = gs4510_decode(i as u8);
        entries[i] = OpcodeEntry::new(instruction, mode);
        i += 1;
    }
    OpcodeTable::new(entries)
}

const fn signals_for(instruction: Instruction, mode: AddressingMode) -> u16 {
    use Instruction as I;

    let implied = matches!(mode, AddressingMode::Implied | AddressingMode::Accumulator);
    let mut bits = 0;
    match instruction {
        I::Adc | I::And | I::Bit | I::Cmp | I::Cpx | I::Cpy | I::Cpz | I::Eor | I::Lda
        | I::Ldx | I::Ldy | I::Ldz | I::Ora | I::Sbc => bits |= ControlSignals::LOAD.bits(),
        I::Sta | I::Stx | I::Sty | I::Stz => bits |= ControlSignals::STORE.bits(),
        I::Asl | I::Lsr | I::Rol | I::Ror | I::Asr | I::Inc | I::Dec if !implied => {
            bits |= ControlSignals::MODIFY.bits();
        }
        I::Tsb | I::Trb | I::Rmb(_) | I::Smb(_) => bits |= ControlSignals::MODIFY.bits(),
        I::Inw | I::Dew | I::Asw | I::Row => {
            bits |= ControlSignals::MODIFY.bits() | ControlSignals::WORD.bits();
        }
        I::Phw => {
            bits |= ControlSignals::WORD.bits();
            if matches!(mode, AddressingMode::Absolute) {
                bits |= ControlSignals::LOAD.bits();
            }
        }
        I::Branch(_) => bits |= ControlSignals::BRANCH.bits(),
        I::Bbr(_) | I::Bbs(_) => {
            bits |= ControlSignals::BRANCH.bits() | ControlSignals::LOAD.bits();
        }
        I::Bsr => bits |= ControlSignals::BRANCH.bits() | ControlSignals::SUBROUTINE.bits(),
        I::Jsr => bits |= ControlSignals::SUBROUTINE.bits(),
        _ => {}
    }
    if implied && is_single_cycle(instruction) {
        bits |= ControlSignals::SINGLE_CYCLE.bits();
    }
    bits
}

const fn is_single_cycle(instruction: Instruction) -> bool {
    use Instruction as I;

    matches!(
        instruction,
        I::Clc | I::Sec | I::Cli | I::Sei | I::Clv | I::Cld | I::Sed | I::Cle | I::See
            | I::Tax | I::Txa | I::Tay | I::Tya | I::Taz | I::Tza | I::Tab | I::Tba
            | I::Tsx | I::Txs | I::Tsy | I::Tys
            | I::Inx | I::Iny | I::Inz | I::Dex | I::Dey | I::Dez
            | I::Inc | I::Dec | I::Neg | I::Asl | I::Lsr | I::Rol | I::Ror | I::Asr
            | I::Map | I::Eom | I::Nop
    )
}

const fn gs4510_decode(opcode: u8) -> (Instruction, AddressingMode) {
    use AddressingMode as M;
    use Condition as C;
    use Instruction as I;

    // Column 7: RMB/SMB, column F: BBR/BBS. Bit number is opcode bits 6:4.
    let bit = (opcode >> 4) & 0x07;
    match opcode & 0x0F {
        0x07 if opcode < 0x80 => return (I::Rmb(bit), M::BasePage),
        0x07 => return (I::Smb(bit), M::BasePage),
        0x0F if opcode < 0x80 => return (I::Bbr(bit), M::BasePageRelative),
        0x0F => return (I::Bbs(bit), M::BasePageRelative),
        _ => {}
    }

    match opcode {
        // ---- 0x ----
        0x00 => (I::Brk, M::Implied),
        0x01 => (I::Ora, M::BasePageIndirectX),
        0x02 => (I::Cle, M::Implied),
        0x03 => (I::See, M::Implied),
        0x04 => (I::Tsb, M::BasePage),
        0x05 => (I::Ora, M::BasePage),
        0x06 => (I::Asl, M::BasePage),
        0x08 => (I::Php, M::Implied),
        0x09 => (I::Ora, M::Immediate),
        0x0A => (I::Asl, M::Accumulator),
        0x0B => (I::Tsy, M::Implied),
        0x0C => (I::Tsb, M::Absolute),
        0x0D => (I::Ora, M::Absolute),
        0x0E => (I::Asl, M::Absolute),
        // ---- 1x ----
        0x10 => (I::Branch(C::Plus), M::Relative),
        0x11 => (I::Ora, M::BasePageIndirectY),
        0x12 => (I::Ora, M::BasePageIndirectZ),
        0x13 => (I::Branch(C::Plus), M::RelativeWord),
        0x14 => (I::Trb, M::BasePage),
        0x15 => (I::Ora, M::BasePageX),
        0x16 => (I::Asl, M::BasePageX),
        0x18 => (I::Clc, M::Implied),
        0x19 => (I::Ora, M::AbsoluteY),
        0x1A => (I::Inc, M::Accumulator),
        0x1B => (I::Inz, M::Implied),
        0x1C => (I::Trb, M::Absolute),
        0x1D => (I::Ora, M::AbsoluteX),
        0x1E => (I::Asl, M::AbsoluteX),
        // ---- 2x ----
        0x20 => (I::Jsr, M::Absolute),
        0x21 => (I::And, M::BasePageIndirectX),
        0x22 => (I::Jsr, M::Indirect),
        0x23 => (I::Jsr, M::IndirectX),
        0x24 => (I::Bit, M::BasePage),
        0x25 => (I::And, M::BasePage),
        0x26 => (I::Rol, M::BasePage),
        0x28 => (I::Plp, M::Implied),
        0x29 => (I::And, M::Immediate),
        0x2A => (I::Rol, M::Accumulator),
        0x2B => (I::Tys, M::Implied),
        0x2C => (I::Bit, M::Absolute),
        0x2D => (I::And, M::Absolute),
        0x2E => (I::Rol, M::Absolute),
        // ---- 3x ----
        0x30 => (I::Branch(C::Minus), M::Relative),
        0x31 => (I::And, M::BasePageIndirectY),
        0x32 => (I::And, M::BasePageIndirectZ),
        0x33 => (I::Branch(C::Minus), M::RelativeWord),
        0x34 => (I::Bit, M::BasePageX),
        0x35 => (I::And, M::BasePageX),
        0x36 => (I::Rol, M::BasePageX),
        0x38 => (I::Sec, M::Implied),
        0x39 => (I::And, M::AbsoluteY),
        0x3A => (I::Dec, M::Accumulator),
        0x3B => (I::Dez, M::Implied),
        0x3C => (I::Bit, M::AbsoluteX),
        0x3D => (I::And, M::AbsoluteX),
        0x3E => (I::Rol, M::AbsoluteX),
        // ---- 4x ----
        0x40 => (I::Rti, M::Implied),
        0x41 => (I::Eor, M::BasePageIndirectX),
        0x42 => (I::Neg, M::Accumulator),
        0x43 => (I::Asr, M::Accumulator),
        0x44 => (I::Asr, M::BasePage),
        0x45 => (I::Eor, M::BasePage),
        0x46 => (I::Lsr, M::BasePage),
        0x48 => (I::Pha, M::Implied),
        0x49 => (I::Eor, M::Immediate),
        0x4A => (I::Lsr, M::Accumulator),
        0x4B => (I::Taz, M::Implied),
        0x4C => (I::Jmp, M::Absolute),
        0x4D => (I::Eor, M::Absolute),
        0x4E => (I::Lsr, M::Absolute),
        // ---- 5x ----
        0x50 => (I::Branch(C::OverflowClear), M::Relative),
        0x51 => (I::Eor, M::BasePageIndirectY),
        0x52 => (I::Eor, M::BasePageIndirectZ),
        0x53 => (I::Branch(C::OverflowClear), M::RelativeWord),
        0x54 => (I::Asr, M::BasePageX),
        0x55 => (I::Eor, M::BasePageX),
        0x56 => (I::Lsr, M::BasePageX),
        0x58 => (I::Cli, M::Implied),
        0x59 => (I::Eor, M::AbsoluteY),
        0x5A => (I::Phy, M::Implied),
        0x5B => (I::Tab, M::Implied),
        0x5C => (I::Map, M::Implied),
        0x5D => (I::Eor, M::AbsoluteX),
        0x5E => (I::Lsr, M::AbsoluteX),
        // ---- 6x ----
        0x60 => (I::Rts, M::Implied),
        0x61 => (I::Adc, M::BasePageIndirectX),
        0x62 => (I::Rtn, M::Immediate),
        0x63 => (I::Bsr, M::RelativeWord),
        0x64 => (I::Stz, M::BasePage),
        0x65 => (I::Adc, M::BasePage),
        0x66 => (I::Ror, M::BasePage),
        0x68 => (I::Pla, M::Implied),
        0x69 => (I::Adc, M::Immediate),
        0x6A => (I::Ror, M::Accumulator),
        0x6B => (I::Tza, M::Implied),
        0x6C => (I::Jmp, M::Indirect),
        0x6D => (I::Adc, M::Absolute),
        0x6E => (I::Ror, M::Absolute),
        // ---- 7x ----
        0x70 => (I::Branch(C::OverflowSet), M::Relative),
        0x71 => (I::Adc, M::BasePageIndirectY),
        0x72 => (I::Adc, M::BasePageIndirectZ),
        0x73 => (I::Branch(C::OverflowSet), M::RelativeWord),
        0x74 => (I::Stz, M::BasePageX),
        0x75 => (I::Adc, M::BasePageX),
        0x76 => (I::Ror, M::BasePageX),
        0x78 => (I::Sei, M::Implied),
        0x79 => (I::Adc, M::AbsoluteY),
        0x7A => (I::Ply, M::Implied),
        0x7B => (I::Tba, M::Implied),
        0x7C => (I::Jmp, M::IndirectX),
        0x7D => (I::Adc, M::AbsoluteX),
        0x7E => (I::Ror, M::AbsoluteX),
        // ---- 8x ----
        0x80 => (I::Branch(C::Always), M::Relative),
        0x81 => (I::Sta, M::BasePageIndirectX),
        0x82 => (I::Sta, M::StackIndirectY),
        0x83 => (I::Branch(C::Always), M::RelativeWord),
        0x84 => (I::Sty, M::BasePage),
        0x85 => (I::Sta, M::BasePage),
        0x86 => (I::Stx, M::BasePage),
        0x88 => (I::Dey, M::Implied),
        0x89 => (I::Bit, M::Immediate),
        0x8A => (I::Txa, M::Implied),
        0x8B => (I::Sty, M::AbsoluteX),
        0x8C => (I::Sty, M::Absolute),
        0x8D => (I::Sta, M::Absolute),
        0x8E => (I::Stx, M::Absolute),
        // ---- 9x ----
        0x90 => (I::Branch(C::CarryClear), M::Relative),
        0x91 => (I::Sta, M::BasePageIndirectY),
        0x92 => (I::Sta, M::BasePageIndirectZ),
        0x93 => (I::Branch(C::CarryClear), M::RelativeWord),
        0x94 => (I::Sty, M::BasePageX),
        0x95 => (I::Sta, M::BasePageX),
        0x96 => (I::Stx, M::BasePageY),
        0x98 => (I::Tya, M::Implied),
        0x99 => (I::Sta, M::AbsoluteY),
        0x9A => (I::Txs, M::Implied),
        0x9B => (I::Stx, M::AbsoluteY),
        0x9C => (I::Stz, M::Absolute),
        0x9D => (I::Sta, M::AbsoluteX),
        0x9E => (I::Stz, M::AbsoluteX),
        // ---- Ax ----
        0xA0 => (I::Ldy, M::Immediate),
        0xA1 => (I::Lda, M::BasePageIndirectX),
        0xA2 => (I::Ldx, M::Immediate),
        0xA3 => (I::Ldz, M::Immediate),
        0xA4 => (I::Ldy, M::BasePage),
        0xA5 => (I::Lda, M::BasePage),
        0xA6 => (I::Ldx, M::BasePage),
        0xA8 => (I::Tay, M::Implied),
        0xA9 => (I::Lda, M::Immediate),
        0xAA => (I::Tax, M::Implied),
        0xAB => (I::Ldz, M::Absolute),
        0xAC => (I::Ldy, M::Absolute),
        0xAD => (I::Lda, M::Absolute),
        0xAE => (I::Ldx, M::Absolute),
        // ---- Bx ----
        0xB0 => (I::Branch(C::CarrySet), M::Relative),
        0xB1 => (I::Lda, M::BasePageIndirectY),
        0xB2 => (I::Lda, M::BasePageIndirectZ),
        0xB3 => (I::Branch(C::CarrySet), M::RelativeWord),
        0xB4 => (I::Ldy, M::BasePageX),
        0xB5 => (I::Lda, M::BasePageX),
        0xB6 => (I::Ldx, M::BasePageY),
        0xB8 => (I::Clv, M::Implied),
        0xB9 => (I::Lda, M::AbsoluteY),
        0xBA => (I::Tsx, M::Implied),
        0xBB => (I::Ldz, M::AbsoluteX),
        0xBC => (I::Ldy, M::AbsoluteX),
        0xBD => (I::Lda, M::AbsoluteX),
        0xBE => (I::Ldx, M::AbsoluteY),
        // ---- Cx ----
        0xC0 => (I::Cpy, M::Immediate),
        0xC1 => (I::Cmp, M::BasePageIndirectX),
        0xC2 => (I::Cpz, M::Immediate),
        0xC3 => (I::Dew, M::BasePage),
        0xC4 => (I::Cpy, M::BasePage),
        0xC5 => (I::Cmp, M::BasePage),
        0xC6 => (I::Dec, M::BasePage),
        0xC8 => (I::Iny, M::Implied),
        0xC9 => (I::Cmp, M::Immediate),
        0xCA => (I::Dex, M::Implied),
        0xCB => (I::Asw, M::Absolute),
        0xCC => (I::Cpy, M::Absolute),
        0xCD => (I::Cmp, M::Absolute),
        0xCE => (I::Dec, M::Absolute),
        // ---- Dx ----
        0xD0 => (I::Branch(C::NotEqual), M::Relative),
        0xD1 => (I::Cmp, M::BasePageIndirectY),
        0xD2 => (I::Cmp, M::BasePageIndirectZ),
        0xD3 => (I::Branch(C::NotEqual), M::RelativeWord),
        0xD4 => (I::Cpz, M::BasePage),
        0xD5 => (I::Cmp, M::BasePageX),
        0xD6 => (I::Dec, M::BasePageX),
        0xD8 => (I::Cld, M::Implied),
        0xD9 => (I::Cmp, M::AbsoluteY),
        0xDA => (I::Phx, M::Implied),
        0xDB => (I::Phz, M::Implied),
        0xDC => (I::Cpz, M::Absolute),
        0xDD => (I::Cmp, M::AbsoluteX),
        0xDE => (I::Dec, M::AbsoluteX),
        // ---- Ex ----
        0xE0 => (I::Cpx, M::Immediate),
        0xE1 => (I::Sbc, M::BasePageIndirectX),
        0xE2 => (I::Lda, M::StackIndirectY),
        0xE3 => (I::Inw, M::BasePage),
        0xE4 => (I::Cpx, M::BasePage),
        0xE5 => (I::Sbc, M::BasePage),
        0xE6 => (I::Inc, M::BasePage),
        0xE8 => (I::Inx, M::Implied),
        0xE9 => (I::Sbc, M::Immediate),
        0xEA => (I::Eom, M::Implied),
        0xEB => (I::Row, M::Absolute),
        0xEC => (I::Cpx, M::Absolute),
        0xED => (I::Sbc, M::Absolute),
        0xEE => (I::Inc, M::Absolute),
        // ---- Fx ----
        0xF0 => (I::Branch(C::Equal), M::Relative),
        0xF1 => (I::Sbc, M::BasePageIndirectY),
        0xF2 => (I::Sbc, M::BasePageIndirectZ),
        0xF3 => (I::Branch(C::Equal), M::RelativeWord),
        0xF4 => (I::Phw, M::ImmediateWord),
        0xF5 => (I::Sbc, M::BasePageX),
        0xF6 => (I::Inc, M::BasePageX),
        0xF8 => (I::Sed, M::Implied),
        0xF9 => (I::Sbc, M::AbsoluteY),
        0xFA => (I::Plx, M::Implied),
        0xFB => (I::Plz, M::Implied),
        0xFC => (I::Phw, M::Absolute),
        0xFD => (I::Sbc, M::AbsoluteX),
        0xFE => (I::Inc, M::AbsoluteX),
        _ => (I::Nop, M::Implied),
    }
}
