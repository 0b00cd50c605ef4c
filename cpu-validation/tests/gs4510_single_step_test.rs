use std::path::Path;

use gs45_cpu_validation::{
    Gs4510CpuState, Gs4510TestCase, TracingBus, load_vectors, step_traced, validation_cpu,
    vector_files,
};

fn run_test_case(tc: &Gs4510TestCase) {
    let mut cpu = validation_cpu(&tc.initial);
    let mut bus = TracingBus::new();
    for &(addr, val) in &tc.initial.ram {
        bus.memory[addr as usize] = val;
    }

    let trace = step_traced(&mut cpu, &mut bus, 200)
        .unwrap_or_else(|| panic!("{}: instruction never retired", tc.name));

    // Registers
    let got = Gs4510CpuState::capture(&cpu);
    let want = &tc.final_state;
    assert_eq!(got.pc, want.pc, "{}: PC", tc.name);
    assert_eq!(got.sp, want.sp, "{}: SP", tc.name);
    assert_eq!(got.a, want.a, "{}: A", tc.name);
    assert_eq!(got.b, want.b, "{}: B", tc.name);
    assert_eq!(got.x, want.x, "{}: X", tc.name);
    assert_eq!(got.y, want.y, "{}: Y", tc.name);
    assert_eq!(got.z, want.z, "{}: Z", tc.name);
    assert_eq!(got.p, want.p, "{}: P", tc.name);

    // Memory
    for &(addr, expected) in &want.ram {
        assert_eq!(
            bus.memory[addr as usize], expected,
            "{}: RAM[0x{:04X}]",
            tc.name, addr
        );
    }

    // Per-tick bus activity, internal ticks included
    assert_eq!(
        trace.len(),
        tc.cycles.len(),
        "{}: tick count (got {} expected {})",
        tc.name,
        trace.len(),
        tc.cycles.len()
    );
    for (i, (&(addr, data, op), (exp_addr, exp_data, exp_op))) in
        trace.iter().zip(&tc.cycles).enumerate()
    {
        assert_eq!(op.as_str(), exp_op.as_str(), "{}: cycle {} op", tc.name, i);
        if exp_op != "internal" {
            assert_eq!(addr, *exp_addr, "{}: cycle {} addr", tc.name, i);
            assert_eq!(data, *exp_data, "{}: cycle {} data", tc.name, i);
        }
    }
}

#[test]
fn test_all_recorded_opcodes() {
    let files = vector_files(Path::new("test_data/gs4510"));
    assert!(
        !files.is_empty(),
        "no GS4510 vectors in test_data/gs4510; record some with: \
         cargo run -p gs45-cpu-validation --bin gen_gs4510_tests -- all"
    );

    let mut total_tests = 0;
    for path in &files {
        let tests = load_vectors(path).unwrap_or_else(|e| panic!("{e}"));
        for tc in &tests {
            run_test_case(tc);
        }
        total_tests += tests.len();
    }

    assert!(total_tests > 0, "vector files hold no cases");
    eprintln!(
        "Validated {} vectors across {} opcode files",
        total_tests,
        files.len()
    );
}
