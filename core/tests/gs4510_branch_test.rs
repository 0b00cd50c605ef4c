use gs45_core::cpu::gs4510::StatusFlag;
mod common;
use common::{TestBus, cpu_at, run_instruction, run_instructions};

// =============================================================================
// 8-bit relative branches
// =============================================================================

#[test]
fn test_bne_taken_forward() {
    let mut cpu = cpu_at(0x0200);
    let mut bus = TestBus::new();
    bus.load(0x0200, &[0xD0, 0x05]); // BNE +5 (Z clear)
    let ticks = run_instruction(&mut cpu, &mut bus);
    assert_eq!(ticks, 4); // fetch, decode, offset, take
    assert_eq!(cpu.core.regs.pc, 0x0207);
}

#[test]
fn test_bne_not_taken() {
    let mut cpu = cpu_at(0x0200);
    let mut bus = TestBus::new();
    bus.load(0x0200, &[0xA9, 0x00, 0xD0, 0x05]); // LDA #0; BNE +5
    run_instruction(&mut cpu, &mut bus);
    let ticks = run_instruction(&mut cpu, &mut bus);
    assert_eq!(ticks, 3);
    assert_eq!(cpu.core.regs.pc, 0x0204);
}

#[test]
fn test_branch_backward() {
    let mut cpu = cpu_at(0x0210);
    let mut bus = TestBus::new();
    bus.load(0x0210, &[0x80, 0xFC]); // BRA -4
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.core.regs.pc, 0x020E);
}

#[test]
fn test_bcs_bcc() {
    let mut cpu = cpu_at(0x0200);
    let mut bus = TestBus::new();
    cpu.core.regs.set_flag(StatusFlag::C, true);
    bus.load(0x0200, &[0x90, 0x10, 0xB0, 0x10]); // BCC +16; BCS +16
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.core.regs.pc, 0x0202); // BCC not taken
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.core.regs.pc, 0x0214);
}

// =============================================================================
// 16-bit relative branches
// =============================================================================

#[test]
fn test_word_branch_always() {
    let mut cpu = cpu_at(0x0200);
    let mut bus = TestBus::new();
    bus.load(0x0200, &[0x83, 0x00, 0x10]); // BRA +$1000
    let ticks = run_instruction(&mut cpu, &mut bus);
    assert_eq!(ticks, 4);
    assert_eq!(cpu.core.regs.pc, 0x1202); // relative to the last operand byte
}

#[test]
fn test_word_branch_backward_to_self() {
    let mut cpu = cpu_at(0x1000);
    let mut bus = TestBus::new();
    bus.load(0x1000, &[0x83, 0xFE, 0xFF]); // BRA -2
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.core.regs.pc, 0x1000);
}

#[test]
fn test_word_branch_not_taken() {
    let mut cpu = cpu_at(0x0200);
    let mut bus = TestBus::new();
    bus.load(0x0200, &[0xF3, 0x00, 0x10]); // BEQ +$1000, Z clear
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.core.regs.pc, 0x0203);
}

// =============================================================================
// Bit branches
// =============================================================================

#[test]
fn test_bbr_taken_when_bit_clear() {
    let mut cpu = cpu_at(0x0200);
    let mut bus = TestBus::new();
    bus.shadow[0x0040] = 0xF7;
    bus.load(0x0200, &[0x3F, 0x40, 0x05]); // BBR3 $40,+5
    let ticks = run_instruction(&mut cpu, &mut bus);
    assert_eq!(ticks, 6);
    assert_eq!(cpu.core.regs.pc, 0x0208);
}

#[test]
fn test_bbs_not_taken_when_bit_clear() {
    let mut cpu = cpu_at(0x0200);
    let mut bus = TestBus::new();
    bus.shadow[0x0040] = 0xF7;
    bus.load(0x0200, &[0xBF, 0x40, 0x05]); // BBS3 $40,+5
    let ticks = run_instruction(&mut cpu, &mut bus);
    assert_eq!(ticks, 5);
    assert_eq!(cpu.core.regs.pc, 0x0203);
}

#[test]
fn test_bbs_backward() {
    let mut cpu = cpu_at(0x0200);
    let mut bus = TestBus::new();
    bus.shadow[0x0040] = 0x80;
    bus.load(0x0200, &[0xFF, 0x40, 0xFD]); // BBS7 $40,-3
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.core.regs.pc, 0x0200);
}

// =============================================================================
// Jumps
// =============================================================================

#[test]
fn test_jmp_absolute() {
    let mut cpu = cpu_at(0x0200);
    let mut bus = TestBus::new();
    bus.load(0x0200, &[0x4C, 0x00, 0x30]);
    let ticks = run_instruction(&mut cpu, &mut bus);
    assert_eq!(ticks, 4);
    assert_eq!(cpu.core.regs.pc, 0x3000);
}

#[test]
fn test_jmp_indirect() {
    let mut cpu = cpu_at(0x0200);
    let mut bus = TestBus::new();
    bus.load(0x0200, &[0x6C, 0x00, 0x30]); // JMP ($3000)
    bus.shadow[0x3000] = 0x34;
    bus.shadow[0x3001] = 0x12;
    let ticks = run_instruction(&mut cpu, &mut bus);
    assert_eq!(ticks, 7);
    assert_eq!(cpu.core.regs.pc, 0x1234);
}

#[test]
fn test_jmp_indirect_x() {
    let mut cpu = cpu_at(0x0200);
    let mut bus = TestBus::new();
    bus.load(0x0200, &[0x7C, 0x00, 0x30]); // JMP ($3000,X) (X=$22)
    bus.shadow[0x3022] = 0x78;
    bus.shadow[0x3023] = 0x56;
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.core.regs.pc, 0x5678);
}

#[test]
fn test_bsr_and_return() {
    let mut cpu = cpu_at(0x0200);
    let mut bus = TestBus::new();
    bus.load(0x0200, &[0x63, 0xFD, 0x0F]); // BSR +$0FFD -> $11FF
    bus.load(0x11FF, &[0x60]); // RTS
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.core.regs.pc, 0x11FF);
    assert_eq!(bus.shadow[0x01FF], 0x02); // return address $0202, high first
    assert_eq!(bus.shadow[0x01FE], 0x02);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.core.latches.opcode_pc, 0x0203); // next opcode already fetched
}

#[test]
fn test_loop_counts_down() {
    let mut cpu = cpu_at(0x0200);
    let mut bus = TestBus::new();
    // LDX #3; loop: DEX; BNE loop
    bus.load(0x0200, &[0xA2, 0x03, 0xCA, 0xD0, 0xFD]);
    run_instructions(&mut cpu, &mut bus, 7);
    assert_eq!(cpu.core.regs.x, 0x00);
    assert_eq!(cpu.core.regs.pc, 0x0205);
}
