use gs45_core::cpu::gs4510::exec::InterruptKind;
use gs45_core::cpu::gs4510::{
    CoreState, CycleEvent, CycleInput, ExecState, GS4510, MemoryKind, PendingMemoryOp,
    StatusFlag, transition,
};
use gs45_core::device::DmaCommand;

fn core_at(pc: u16) -> CoreState {
    let mut core = CoreState::reset();
    core.regs.pc = pc;
    core
}

fn data(byte: u8) -> CycleInput {
    CycleInput {
        data: byte,
        ..CycleInput::default()
    }
}

// =============================================================================
// Purity
// =============================================================================

#[test]
fn test_same_inputs_same_result() {
    let core = core_at(0x0200);
    let input = data(0xE8);
    let a = transition(&ExecState::InstructionDecode, &core, &input, &GS4510);
    let b = transition(&ExecState::InstructionDecode, &core, &input, &GS4510);
    assert_eq!(a, b);
    assert_eq!(core.regs.x, 0x22); // the caller's copy is untouched
}

#[test]
fn test_fetch_requests_opcode() {
    let core = core_at(0x0200);
    let t = transition(&ExecState::InstructionFetch, &core, &data(0), &GS4510);
    assert_eq!(t.next, ExecState::InstructionDecode);
    assert_eq!(t.memory, Some(PendingMemoryOp::cpu_read(0x0200)));
    assert_eq!(t.core.regs.pc, 0x0201);
    assert_eq!(t.core.latches.opcode_pc, 0x0200);
    assert!(!t.retired);
    assert_eq!(t.event, None);
}

#[test]
fn test_single_cycle_decode_retires() {
    let core = core_at(0x0201);
    let t = transition(&ExecState::InstructionDecode, &core, &data(0xE8), &GS4510);
    assert_eq!(t.next, ExecState::InstructionFetch);
    assert_eq!(t.core.regs.x, 0x23);
    assert_eq!(t.core.latches.opcode, 0xE8);
    assert_eq!(t.memory, None);
    assert!(t.retired);
}

#[test]
fn test_trace_parks_after_single_cycle() {
    let core = core_at(0x0201);
    let input = CycleInput {
        data: 0xE8,
        trace: true,
        ..CycleInput::default()
    };
    let t = transition(&ExecState::InstructionDecode, &core, &input, &GS4510);
    assert_eq!(
        t.next,
        ExecState::ProcessorHold {
            resume: Box::new(ExecState::InstructionFetch),
            deferred: None,
        }
    );
    assert!(t.retired);
}

#[test]
fn test_hold_is_a_fixed_point() {
    let core = core_at(0x0200);
    let held = ExecState::ProcessorHold {
        resume: Box::new(ExecState::Operand1),
        deferred: Some(PendingMemoryOp::cpu_read(0x0201)),
    };
    let t = transition(&held, &core, &data(0x55), &GS4510);
    assert_eq!(t.next, held);
    assert_eq!(t.core, core);
    assert_eq!(t.memory, None);
}

#[test]
fn test_store_emits_write() {
    let mut core = core_at(0x0203);
    core.latches.opcode = 0x8D; // STA abs
    core.latches.arg1 = 0x00;
    core.regs.a = 0x66;
    let t = transition(&ExecState::Operand2, &core, &data(0x40), &GS4510);
    assert_eq!(t.memory, Some(PendingMemoryOp::cpu_write(0x4000, 0x66)));
    assert!(t.memory.is_some_and(|op| op.is_write()));
    assert!(t.retired);
}

// =============================================================================
// Admission
// =============================================================================

#[test]
fn test_dma_request_admitted_first() {
    let mut core = core_at(0x0200);
    core.regs.set_flag(StatusFlag::I, false);
    let input = CycleInput {
        nmi: true,
        irq: true,
        dma_request: Some(0x0800),
        ..CycleInput::default()
    };
    let t = transition(&ExecState::InstructionFetch, &core, &input, &GS4510);
    assert!(matches!(t.next, ExecState::DmaListRead { list: 0x0800, index: 0, .. }));
    assert_eq!(t.memory, Some(PendingMemoryOp::phys_read(0x0800)));
    assert_eq!(t.event, Some(CycleEvent::DmaAdmitted));
    assert_eq!(t.core.regs.pc, 0x0200);
}

#[test]
fn test_nmi_admitted_over_irq() {
    let mut core = core_at(0x0200);
    core.regs.set_flag(StatusFlag::I, false);
    let input = CycleInput {
        nmi: true,
        irq: true,
        ..CycleInput::default()
    };
    let t = transition(&ExecState::InstructionFetch, &core, &input, &GS4510);
    assert_eq!(
        t.next,
        ExecState::Interrupt {
            kind: InterruptKind::Nmi,
            step: 0
        }
    );
    assert_eq!(t.event, Some(CycleEvent::NmiAccepted));
}

#[test]
fn test_map_inhibit_blocks_interrupts_not_dma() {
    let mut core = core_at(0x0200);
    core.map_inhibit = true;
    let input = CycleInput {
        nmi: true,
        ..CycleInput::default()
    };
    let t = transition(&ExecState::InstructionFetch, &core, &input, &GS4510);
    assert_eq!(t.next, ExecState::InstructionDecode);
    assert_eq!(t.event, None);

    let input = CycleInput {
        dma_request: Some(0x0900),
        ..CycleInput::default()
    };
    let t = transition(&ExecState::InstructionFetch, &core, &input, &GS4510);
    assert!(matches!(t.next, ExecState::DmaListRead { .. }));
}

#[test]
fn test_vector_fetch_completes_with_pc() {
    let mut core = core_at(0x0000);
    core.latches.value = 0x34;
    let state = ExecState::VectorFetch {
        vector: 0xFFFC,
        step: 2,
    };
    let t = transition(&state, &core, &data(0x12), &GS4510);
    assert_eq!(t.core.regs.pc, 0x1234);
    assert_eq!(t.next, ExecState::InstructionFetch);
    assert!(t.retired);
}

#[test]
fn test_reset_state_restores_registers() {
    let mut core = core_at(0x8000);
    core.regs.a = 0x00;
    core.map_inhibit = true;
    let t = transition(&ExecState::Reset, &core, &data(0), &GS4510);
    assert_eq!(t.core, CoreState::reset());
    assert_eq!(
        t.next,
        ExecState::VectorFetch {
            vector: 0xFFFC,
            step: 0
        }
    );
}

// =============================================================================
// DMA
// =============================================================================

#[test]
fn test_last_list_byte_starts_transfer() {
    let core = core_at(0x0200);
    let mut bytes = [0u8; 11];
    bytes[..10].copy_from_slice(&[0x03, 0x10, 0x00, 0xEE, 0x00, 0x00, 0x00, 0x30, 0x00, 0x00]);
    let state = ExecState::DmaListRead {
        list: 0x0800,
        index: 10,
        bytes,
    };
    let t = transition(&state, &core, &data(0x00), &GS4510);
    let ExecState::DmaTransfer { job } = t.next else {
        panic!("expected a transfer, got {:?}", t.next);
    };
    assert_eq!(job.descriptor.command, DmaCommand::Fill);
    assert_eq!(job.descriptor.length(), 0x10);
    assert_eq!(job.descriptor.dest.address, 0x3000);
    assert_eq!(job.step, 0);
    assert_eq!(t.memory, None);
}

#[test]
fn test_fill_writes_physical() {
    let core = core_at(0x0200);
    let mut bytes = [0u8; 11];
    bytes[..10].copy_from_slice(&[0x03, 0x01, 0x00, 0xEE, 0x00, 0x00, 0x00, 0x30, 0x00, 0x00]);
    let state = ExecState::DmaListRead {
        list: 0x0800,
        index: 10,
        bytes,
    };
    let started = transition(&state, &core, &data(0x00), &GS4510);
    let t = transition(&started.next, &core, &data(0x00), &GS4510);
    let op = t.memory.expect("fill write");
    assert_eq!(op.address, 0x3000);
    assert_eq!(op.kind, MemoryKind::Write(0xEE));
    assert!(!op.resolve);
}
