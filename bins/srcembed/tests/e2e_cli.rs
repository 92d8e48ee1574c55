//! End-to-end runs of the `srcembed` binary.
//!
//! Each test spawns the built executable with piped or file-backed stdin, so
//! both the double-buffered path and the mapped path are covered.
//!
//! ```bash
//! cargo test -p srcembed --test e2e_cli -- --nocapture
//! ```

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

const BIN: &str = env!("CARGO_BIN_EXE_srcembed");

fn temp_path(label: &str) -> PathBuf {
    let pid = std::process::id();
    std::env::temp_dir().join(format!("srcembed_e2e_{label}_{pid}"))
}

/// Runs the binary with `input` written through a pipe.
fn run_piped(args: &[&str], input: &[u8], envs: &[(&str, &str)]) -> Output {
    let mut child = Command::new(BIN)
        .args(args)
        .envs(envs.iter().copied())
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn srcembed");

    let mut stdin = child.stdin.take().expect("stdin");
    let input = input.to_vec();
    let feeder = std::thread::spawn(move || {
        // the child may exit without reading (usage errors)
        let _ = stdin.write_all(&input);
    });
    let output = child.wait_with_output().expect("wait srcembed");
    feeder.join().unwrap();
    output
}

fn run_from_file(label: &str, args: &[&str], input: &[u8], envs: &[(&str, &str)]) -> Output {
    let path = temp_path(label);
    File::create(&path).unwrap().write_all(input).unwrap();
    let output = Command::new(BIN)
        .args(args)
        .envs(envs.iter().copied())
        .env_remove("RUST_LOG")
        .stdin(File::open(&path).unwrap())
        .output()
        .expect("run srcembed");
    std::fs::remove_file(&path).unwrap();
    output
}

fn expected(varname: &str, opening: &str, data: &[u8]) -> String {
    let body: Vec<String> = data.iter().map(u8::to_string).collect();
    format!("const char {varname}{opening}{} }};\n", body.join(", "))
}

fn stdout(o: &Output) -> String {
    String::from_utf8(o.stdout.clone()).unwrap()
}

fn stderr(o: &Output) -> String {
    String::from_utf8(o.stderr.clone()).unwrap()
}

#[test]
fn cpp_from_pipe() {
    let out = run_piped(&["c++"], b"hi\n", &[]);
    assert!(out.status.success());
    assert_eq!(stdout(&out), "const char data[] { 104, 105, 10 };\n");
    assert_eq!(stderr(&out), "");
}

#[test]
fn c_with_varname() {
    let out = run_piped(&["--varname", "icon", "c"], &[0, 128, 255], &[]);
    assert!(out.status.success());
    assert_eq!(stdout(&out), "const char icon[] = { 0, 128, 255 };\n");
}

#[test]
fn large_input_through_every_strategy_and_policy() {
    let data: Vec<u8> = (0..300_000u32)
        .map(|i| (i.wrapping_mul(2_654_435_761) >> 13) as u8)
        .collect();
    let want = expected("blob", "[] = { ", &data);

    for (label, toml) in [
        ("spin", "wait = \"spin\"\nhalf_capacity = 4096\n"),
        ("block", "wait = \"block\"\nhalf_capacity = 1000\n"),
        ("buffered", "input = \"buffered\"\nhalf_capacity = 777\n"),
        ("mapped", "input = \"mapped\"\n"),
    ] {
        let config = temp_path(&format!("{label}.toml"));
        std::fs::write(&config, toml).unwrap();
        let config_str = config.to_str().unwrap();
        let envs = [("SRCEMBED_CONFIG", config_str)];

        let piped = run_piped(&["--varname", "blob", "c"], &data, &envs);
        assert!(piped.status.success(), "{label}: {}", stderr(&piped));
        assert_eq!(stdout(&piped), want, "{label} piped");

        let filed = run_from_file(label, &["--varname", "blob", "c"], &data, &envs);
        assert!(filed.status.success(), "{label}: {}", stderr(&filed));
        assert_eq!(stdout(&filed), want, "{label} file");

        std::fs::remove_file(&config).unwrap();
    }
}

#[test]
fn mapped_mode_warns_when_stdin_is_a_pipe() {
    let config = temp_path("mapped_pipe.toml");
    std::fs::write(&config, "input = \"mapped\"\n").unwrap();
    let envs = [("SRCEMBED_CONFIG", config.to_str().unwrap())];

    let piped = run_piped(&["c++"], b"hi\n", &envs);
    assert!(piped.status.success(), "{}", stderr(&piped));
    assert_eq!(stdout(&piped), "const char data[] { 104, 105, 10 };\n");
    assert!(stderr(&piped).contains("stdin cannot be mapped, streaming instead"));

    let filed = run_from_file("mapped_file", &["c++"], b"hi\n", &envs);
    assert!(filed.status.success());
    assert_eq!(stdout(&filed), "const char data[] { 104, 105, 10 };\n");
    assert_eq!(stderr(&filed), "");

    std::fs::remove_file(&config).unwrap();
}

#[test]
fn help_goes_to_stdout() {
    let out = run_piped(&["--help"], b"", &[]);
    assert!(out.status.success());
    assert!(stdout(&out).starts_with("usage: srcembed [--help]"));
    assert!(stdout(&out).ends_with("\tc++\n\tc\n"));
    assert_eq!(stderr(&out), "");
}

#[test]
fn usage_diagnostics_exit_zero() {
    let cases: [(&[&str], &str); 6] = [
        (&[], "ERROR: not enough args\n"),
        (&["--varname", "x"], "ERROR: not enough args\n"),
        (&["--help", "c"], "ERROR: too many args\n"),
        (&["c", "c++"], "ERROR: too many args\n"),
        (&["--varname", "x", "c", "y"], "ERROR: too many args\n"),
        (&["rust"], "ERROR: invalid language\n"),
    ];
    for (args, message) in cases {
        let out = run_piped(args, b"data", &[]);
        assert!(out.status.success(), "{args:?}");
        assert_eq!(stdout(&out), "", "{args:?}");
        assert_eq!(stderr(&out), message, "{args:?}");
    }
}

#[test]
fn empty_input_is_reported() {
    let out = run_piped(&["c"], b"", &[]);
    assert!(out.status.success());
    assert_eq!(stdout(&out), "");
    assert_eq!(stderr(&out), "ERROR: no data received, language requires data\n");

    let out = run_from_file("empty", &["c++"], b"", &[]);
    assert!(out.status.success());
    assert_eq!(stderr(&out), "ERROR: no data received, language requires data\n");
}

#[test]
fn bad_config_is_fatal() {
    let config = temp_path("zero.toml");
    std::fs::write(&config, "half_capacity = 0\n").unwrap();
    let out = run_piped(&["c"], b"x", &[("SRCEMBED_CONFIG", config.to_str().unwrap())]);
    std::fs::remove_file(&config).unwrap();
    assert!(!out.status.success());
    assert!(stderr(&out).starts_with("ERROR: invalid config"));
}
