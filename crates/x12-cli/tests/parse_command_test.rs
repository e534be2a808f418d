use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

use tempfile::TempDir;

const SAMPLE_824: &str = "\
ISA*00*          *00*          *08*9254110060     *ZZ*123456789      *041216*0805*U*00501*000095071*0*P*>~
GS*AG*5137624388*123456789*20041216*0805*95071*X*005010~
ST*824*021390001*005010X186A1~
BGN*11*FFA.ABCDEF.123456*20020709*0932**123456789**WQ~
N1*41*ABC INSURANCE*46*111111111~
PER*IC*JOHN JOHNSON*TE*8005551212*EX*1439~
N1*40*SMITHCO*46*A1234~
OTI*TA*TN*NA***20020709*0902*2*0001*834*005010X220A1~
SE*7*021390001~
GE*1*95071~
IEA*1*000095071~
";

fn cargo_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_x12"))
}

fn run_x12(args: &[&str]) -> Output {
    Command::new(cargo_bin())
        .args(args)
        .output()
        .expect("run x12")
}

fn write_input(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("input file should be writable");
    path
}

#[test]
fn parse_command_outputs_json_to_stdout() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "sample.edi", SAMPLE_824);

    let output = run_x12(&["parse", input.to_string_lossy().as_ref(), "--pretty"]);

    assert!(
        output.status.success(),
        "expected parse to succeed; stdout: {}; stderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout should be UTF-8");
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("stdout should be JSON");
    assert_eq!(
        json["interchanges"][0]["header"]["control_number"],
        "000095071"
    );
    assert_eq!(
        json["interchanges"][0]["function_groups"][0]["transactions"][0]["segments"]
            .as_array()
            .map(Vec::len),
        Some(5)
    );
}

#[test]
fn parse_command_reports_malformed_isa() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "truncated.edi", &SAMPLE_824.replace("*0*P*>~", "*0*P~"));

    let output = run_x12(&["parse", input.to_string_lossy().as_ref()]);

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("malformed ISA"), "stderr: {stderr}");
}

#[test]
fn parse_command_relaxed_accepts_padded_segment_id() {
    let dir = TempDir::new().unwrap();
    let padded = SAMPLE_824.replacen("ISA*", "ISA *", 1);
    let input = write_input(&dir, "padded.edi", &padded);

    let strict = run_x12(&["parse", input.to_string_lossy().as_ref()]);
    assert_eq!(strict.status.code(), Some(2));

    let relaxed = run_x12(&["parse", input.to_string_lossy().as_ref(), "--relaxed"]);
    assert!(
        relaxed.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&relaxed.stderr)
    );
}
