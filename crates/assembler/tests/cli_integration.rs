//! CLI smoke tests for the assembler binary.

use std::process::Command;

use proptest as _;
use rstest as _;
use slate_asm as _;
use slate_core as _;

fn slate_asm() -> Command {
    Command::new(env!("CARGO_BIN_EXE_slate-asm"))
}

#[test]
fn assembles_a_source_file_to_a_flat_binary() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("prog.s");
    let output = dir.path().join("prog.bin");
    std::fs::write(&input, "_start: li a0, 42\nebreak\n").unwrap();

    let status = slate_asm()
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .status()
        .expect("binary must run");

    assert!(status.success());
    let image = std::fs::read(&output).unwrap();
    assert_eq!(image.len(), 8);
    assert_eq!(&image[0..4], &0x02A0_0513_u32.to_le_bytes());
}

#[test]
fn listing_flag_prints_the_disassembly_dump() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("prog.s");
    std::fs::write(&input, "nop\n").unwrap();

    let result = slate_asm()
        .arg(&input)
        .arg("--listing")
        .output()
        .expect("binary must run");

    assert!(result.status.success());
    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains("addi zero, zero, 0"));
}

#[test]
fn errors_are_printed_per_line_and_fail_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("bad.s");
    std::fs::write(&input, "nop\nfrobnicate a0\n").unwrap();

    let result = slate_asm().arg(&input).output().expect("binary must run");

    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains(":2: error: unknown mnemonic 'frobnicate'"));
}

#[test]
fn missing_input_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("absent.s");

    let result = slate_asm().arg(&input).output().expect("binary must run");
    assert!(!result.status.success());
}
