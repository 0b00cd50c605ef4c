//! Pure ALU: every function returns the result byte plus the flags it
//! defines. `None` in `v`/`c` means the operation leaves that flag alone.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AluOut {
    pub value: u8,
    pub n: bool,
    pub z: bool,
    pub v: Option<bool>,
    pub c: Option<bool>,
}

impl AluOut {
    #[inline]
    fn nz(value: u8) -> Self {
        Self {
            value,
            n: value & 0x80 != 0,
            z: value == 0,
            v: None,
            c: None,
        }
    }

    #[inline]
    fn with_carry(mut self, c: bool) -> Self {
        self.c = Some(c);
        self
    }
}

/// 16-bit result for the word read-modify-write instructions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WordOut {
    pub value: u16,
    pub n: bool,
    pub z: bool,
    pub c: Option<bool>,
}

impl WordOut {
    #[inline]
    fn nz(value: u16) -> Self {
        Self {
            value,
            n: value & 0x8000 != 0,
            z: value == 0,
            c: None,
        }
    }
}

// ---- Arithmetic ----

/// ADC. In decimal mode N, V and Z come from the value after the low-digit
/// correction but before the high-digit one.
pub fn add(a: u8, b: u8, carry_in: bool, decimal: bool) -> AluOut {
    let mut tmp = (a & 0x0F) as u16 + (b & 0x0F) as u16 + carry_in as u16;
    if decimal {
        if tmp > 0x09 {
            tmp += 0x06;
        }
        tmp = if tmp < 0x10 { tmp & 0x0F } else { (tmp & 0x0F) | 0x10 };
    }
    tmp += (a & 0xF0) as u16 + (b & 0xF0) as u16;

    let intermediate = tmp as u8;
    let n = intermediate & 0x80 != 0;
    let z = intermediate == 0;
    let v = (a ^ intermediate) & !(a ^ b) & 0x80 != 0;

    if decimal && (tmp >> 4) > 0x09 {
        tmp += 0x60;
        tmp |= 0x100;
    }

    AluOut {
        value: tmp as u8,
        n,
        z,
        v: Some(v),
        c: Some(tmp & 0x100 != 0),
    }
}

/// SBC. Flags always come from the binary difference; decimal mode only
/// corrects the stored value.
pub fn sub(a: u8, b: u8, carry_in: bool, decimal: bool) -> AluOut {
    let binary = a as u16 + (!b) as u16 + carry_in as u16;
    let result = binary as u8;
    let v = (a ^ b) & (a ^ result) & 0x80 != 0;

    let value = if decimal {
        let borrow = !carry_in as i16;
        let mut lo = (a & 0x0F) as i16 - (b & 0x0F) as i16 - borrow;
        let mut hi = (a >> 4) as i16 - (b >> 4) as i16;
        if lo < 0 {
            lo -= 6;
            hi -= 1;
        }
        if hi < 0 {
            hi -= 6;
        }
        (((hi as u8) & 0x0F) << 4) | ((lo as u8) & 0x0F)
    } else {
        result
    };

    AluOut {
        value,
        n: result & 0x80 != 0,
        z: result == 0,
        v: Some(v),
        c: Some(binary > 0xFF),
    }
}

/// CMP/CPX/CPY/CPZ: N and Z from `a - b`, C set when no borrow.
pub fn compare(a: u8, b: u8) -> AluOut {
    AluOut::nz(a.wrapping_sub(b)).with_carry(a >= b)
}

/// NEG: two's complement of the accumulator.
pub fn neg(a: u8) -> AluOut {
    AluOut::nz(0u8.wrapping_sub(a))
}

pub fn inc(v: u8) -> AluOut {
    AluOut::nz(v.wrapping_add(1))
}

pub fn dec(v: u8) -> AluOut {
    AluOut::nz(v.wrapping_sub(1))
}

// ---- Logic ----

pub fn and(a: u8, b: u8) -> AluOut {
    AluOut::nz(a & b)
}

pub fn ora(a: u8, b: u8) -> AluOut {
    AluOut::nz(a | b)
}

pub fn eor(a: u8, b: u8) -> AluOut {
    AluOut::nz(a ^ b)
}

/// BIT: Z from `a & m`, N and V copied from bits 7 and 6 of the operand.
/// `value` carries the operand through unchanged.
///
/// The immediate form (`$89`) goes through here too and copies N and V like
/// the memory forms, as the 65CE02 does. The 65C02 version only sets Z.
pub fn bit(a: u8, m: u8) -> AluOut {
    AluOut {
        value: m,
        n: m & 0x80 != 0,
        z: a & m == 0,
        v: Some(m & 0x40 != 0),
        c: None,
    }
}

// ---- Shifts and rotates ----

pub fn asl(v: u8) -> AluOut {
    AluOut::nz(v << 1).with_carry(v & 0x80 != 0)
}

pub fn lsr(v: u8) -> AluOut {
    AluOut::nz(v >> 1).with_carry(v & 0x01 != 0)
}

pub fn rol(v: u8, carry_in: bool) -> AluOut {
    AluOut::nz((v << 1) | carry_in as u8).with_carry(v & 0x80 != 0)
}

pub fn ror(v: u8, carry_in: bool) -> AluOut {
    AluOut::nz((v >> 1) | ((carry_in as u8) << 7)).with_carry(v & 0x01 != 0)
}

/// ASR: arithmetic shift right, bit 7 is preserved.
pub fn asr(v: u8) -> AluOut {
    AluOut::nz((v >> 1) | (v & 0x80)).with_carry(v & 0x01 != 0)
}

// ---- Word operations ----

pub fn inc_word(w: u16) -> WordOut {
    WordOut::nz(w.wrapping_add(1))
}

pub fn dec_word(w: u16) -> WordOut {
    WordOut::nz(w.wrapping_sub(1))
}

pub fn asl_word(w: u16) -> WordOut {
    let mut out = WordOut::nz(w << 1);
    out.c = Some(w & 0x8000 != 0);
    out
}

pub fn rol_word(w: u16, carry_in: bool) -> WordOut {
    let mut out = WordOut::nz((w << 1) | carry_in as u16);
    out.c = Some(w & 0x8000 != 0);
    out
}
