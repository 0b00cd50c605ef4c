use gs45_core::cpu::gs4510::StatusFlag;
mod common;
use common::{TestBus, cpu_at, run_instruction};

// =============================================================================
// Immediate
// =============================================================================

#[test]
fn test_lda_immediate() {
    let mut cpu = cpu_at(0x0200);
    let mut bus = TestBus::new();
    bus.load(0x0200, &[0xA9, 0x80]); // LDA #$80
    let ticks = run_instruction(&mut cpu, &mut bus);
    assert_eq!(ticks, 3); // fetch, decode, operand
    assert_eq!(cpu.core.regs.a, 0x80);
    assert!(cpu.core.regs.flag(StatusFlag::N));
    assert!(!cpu.core.regs.flag(StatusFlag::Z));
    assert_eq!(cpu.core.regs.pc, 0x0202);
}

#[test]
fn test_lda_immediate_zero() {
    let mut cpu = cpu_at(0x0200);
    let mut bus = TestBus::new();
    bus.load(0x0200, &[0xA9, 0x00]);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.core.regs.a, 0x00);
    assert!(cpu.core.regs.flag(StatusFlag::Z));
    assert!(!cpu.core.regs.flag(StatusFlag::N));
}

#[test]
fn test_ldz_immediate() {
    let mut cpu = cpu_at(0x0200);
    let mut bus = TestBus::new();
    bus.load(0x0200, &[0xA3, 0x05]); // LDZ #$05
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.core.regs.z, 0x05);
}

// =============================================================================
// Base page and absolute
// =============================================================================

#[test]
fn test_lda_base_page() {
    let mut cpu = cpu_at(0x0200);
    let mut bus = TestBus::new();
    bus.load(0x0200, &[0xA5, 0x10]); // LDA $10
    bus.shadow[0x0010] = 0x42;
    let ticks = run_instruction(&mut cpu, &mut bus);
    assert_eq!(ticks, 4);
    assert_eq!(cpu.core.regs.a, 0x42);
}

#[test]
fn test_base_page_follows_b_register() {
    let mut cpu = cpu_at(0x0200);
    let mut bus = TestBus::new();
    cpu.core.regs.b = 0x12;
    bus.load(0x0200, &[0xA5, 0x34]); // LDA $34 -> $1234
    bus.shadow[0x1234] = 0x99;
    bus.shadow[0x0034] = 0x01;
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.core.regs.a, 0x99);
}

#[test]
fn test_lda_absolute() {
    let mut cpu = cpu_at(0x0200);
    let mut bus = TestBus::new();
    bus.load(0x0200, &[0xAD, 0x34, 0x12]); // LDA $1234
    bus.shadow[0x1234] = 0x55;
    let ticks = run_instruction(&mut cpu, &mut bus);
    assert_eq!(ticks, 5);
    assert_eq!(cpu.core.regs.a, 0x55);
    assert_eq!(cpu.core.regs.pc, 0x0203);
}

#[test]
fn test_lda_absolute_x() {
    let mut cpu = cpu_at(0x0200);
    let mut bus = TestBus::new();
    bus.load(0x0200, &[0xBD, 0x00, 0x12]); // LDA $1200,X (X=$22)
    bus.shadow[0x1222] = 0x66;
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.core.regs.a, 0x66);
}

#[test]
fn test_ldx_base_page_y() {
    let mut cpu = cpu_at(0x0200);
    let mut bus = TestBus::new();
    cpu.core.regs.y = 0x02;
    cpu.core.regs.b = 0x30;
    bus.load(0x0200, &[0xB6, 0xFF]); // LDX $FF,Y
    bus.shadow[0x3101] = 0x01;
    bus.shadow[0x3001] = 0x7E;
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.core.regs.x, 0x7E); // $30FF + 2 stays in the $30 page
}

// =============================================================================
// Indirect modes
// =============================================================================

#[test]
fn test_lda_bp_indirect_z() {
    let mut cpu = cpu_at(0x0200);
    let mut bus = TestBus::new();
    cpu.core.regs.z = 0x05;
    bus.load(0x0200, &[0xB2, 0x10]); // LDA ($10),Z
    bus.shadow[0x0010] = 0x00;
    bus.shadow[0x0011] = 0x30;
    bus.shadow[0x3005] = 0x77;
    let ticks = run_instruction(&mut cpu, &mut bus);
    assert_eq!(ticks, 6); // fetch, decode, ptr lo, ptr hi, data, load
    assert_eq!(cpu.core.regs.a, 0x77);
}

#[test]
fn test_lda_bp_indirect_y() {
    let mut cpu = cpu_at(0x0200);
    let mut bus = TestBus::new();
    bus.load(0x0200, &[0xB1, 0x10]); // LDA ($10),Y (Y=$33)
    bus.shadow[0x0010] = 0x00;
    bus.shadow[0x0011] = 0x30;
    bus.shadow[0x3033] = 0x12;
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.core.regs.a, 0x12);
}

#[test]
fn test_lda_bp_indirect_x() {
    let mut cpu = cpu_at(0x0200);
    let mut bus = TestBus::new();
    bus.load(0x0200, &[0xA1, 0x10]); // LDA ($10,X) (X=$22)
    bus.shadow[0x0032] = 0x80;
    bus.shadow[0x0033] = 0x40;
    bus.shadow[0x4080] = 0x3C;
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.core.regs.a, 0x3C);
}

#[test]
fn test_bp_pointer_wraps_within_page() {
    let mut cpu = cpu_at(0x0200);
    let mut bus = TestBus::new();
    cpu.core.regs.b = 0x12;
    cpu.core.regs.z = 0x00;
    bus.load(0x0200, &[0xB2, 0xFF]); // LDA ($FF),Z
    bus.shadow[0x12FF] = 0x34;
    bus.shadow[0x1200] = 0x40; // high byte comes from the start of the page
    bus.shadow[0x1300] = 0x50;
    bus.shadow[0x4034] = 0xAA;
    bus.shadow[0x5034] = 0xBB;
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.core.regs.a, 0xAA);
}

#[test]
fn test_lda_stack_indirect_y() {
    let mut cpu = cpu_at(0x0200);
    let mut bus = TestBus::new();
    cpu.core.regs.spl = 0xF0;
    bus.load(0x0200, &[0xE2, 0x03]); // LDA ($03,SP),Y
    bus.shadow[0x01F3] = 0x00;
    bus.shadow[0x01F4] = 0x50;
    bus.shadow[0x5033] = 0xAB;
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.core.regs.a, 0xAB);
}

// =============================================================================
// Stores
// =============================================================================

#[test]
fn test_sta_absolute() {
    let mut cpu = cpu_at(0x0200);
    let mut bus = TestBus::new();
    bus.load(0x0200, &[0x8D, 0x00, 0x30]); // STA $3000
    let ticks = run_instruction(&mut cpu, &mut bus);
    assert_eq!(ticks, 4); // the write goes out with the last operand byte
    assert_eq!(bus.shadow[0x3000], 0x11);
}

#[test]
fn test_stz_stores_z_register() {
    let mut cpu = cpu_at(0x0200);
    let mut bus = TestBus::new();
    cpu.core.regs.z = 0x5A;
    bus.shadow[0x3000] = 0xFF;
    bus.load(0x0200, &[0x9C, 0x00, 0x30]); // STZ $3000
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(bus.shadow[0x3000], 0x5A); // Z register, not zero
}

#[test]
fn test_stz_base_page_with_z_clear() {
    let mut cpu = cpu_at(0x0200);
    let mut bus = TestBus::new();
    bus.shadow[0x0040] = 0xFF;
    bus.load(0x0200, &[0x64, 0x40]); // STZ $40
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(bus.shadow[0x0040], 0x00);
}

#[test]
fn test_sta_bp_indirect_z() {
    let mut cpu = cpu_at(0x0200);
    let mut bus = TestBus::new();
    cpu.core.regs.z = 0x02;
    bus.load(0x0200, &[0x92, 0x10]); // STA ($10),Z
    bus.shadow[0x0010] = 0x00;
    bus.shadow[0x0011] = 0x30;
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(bus.shadow[0x3002], 0x11);
}

#[test]
fn test_sta_stack_indirect_y() {
    let mut cpu = cpu_at(0x0200);
    let mut bus = TestBus::new();
    cpu.core.regs.spl = 0xF0;
    cpu.core.regs.y = 0x01;
    bus.load(0x0200, &[0x82, 0x01]); // STA ($01,SP),Y
    bus.shadow[0x01F1] = 0x00;
    bus.shadow[0x01F2] = 0x60;
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(bus.shadow[0x6001], 0x11);
}

#[test]
fn test_stx_sty_absolute() {
    let mut cpu = cpu_at(0x0200);
    let mut bus = TestBus::new();
    bus.load(0x0200, &[0x8E, 0x00, 0x30, 0x8C, 0x01, 0x30]); // STX $3000; STY $3001
    run_instruction(&mut cpu, &mut bus);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(bus.shadow[0x3000], 0x22);
    assert_eq!(bus.shadow[0x3001], 0x33);
}
