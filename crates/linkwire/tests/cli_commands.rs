use std::path::PathBuf;
use std::process::{Command, Output};

use linkwire::session::hash_bytes;

const ROM_BYTES: &[u8] = b"POKEMON RED\x00\x00\x00\x00\x00";

fn write_temp_rom(tag: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "linkwire-{tag}-{}-{}.gb",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::write(&path, ROM_BYTES).expect("temp rom should be writable");
    path
}

fn linkwire(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_linkwire"))
        .args(args)
        .output()
        .expect("linkwire binary should run")
}

#[test]
fn hash_prints_the_game_hash() {
    let rom = write_temp_rom("hash");
    let expected = format!("{:#010x}", hash_bytes(ROM_BYTES));

    let out = linkwire(&["hash", rom.to_str().expect("temp path should be utf-8")]);
    assert!(out.status.success(), "hash should exit zero");

    let stdout = String::from_utf8(out.stdout).expect("output should be utf-8");
    assert!(
        stdout.contains(&expected),
        "stdout should contain {expected}, got {stdout:?}"
    );

    let _ = std::fs::remove_file(rom);
}

#[test]
fn hash_json_output_is_parseable() {
    let rom = write_temp_rom("hashjson");

    let out = linkwire(&[
        "hash",
        rom.to_str().expect("temp path should be utf-8"),
        "--format",
        "json",
    ]);
    assert!(out.status.success());

    let stdout = String::from_utf8(out.stdout).expect("output should be utf-8");
    let value: serde_json::Value =
        serde_json::from_str(stdout.trim()).expect("json output should parse");
    assert_eq!(
        value["hash"].as_str(),
        Some(format!("{:#010x}", hash_bytes(ROM_BYTES)).as_str())
    );

    let _ = std::fs::remove_file(rom);
}

#[test]
fn hash_fails_for_missing_file() {
    let out = linkwire(&["hash", "/nonexistent/linkwire-test.gb"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8(out.stderr).expect("stderr should be utf-8");
    assert!(stderr.contains("error:"), "stderr should explain, got {stderr:?}");
}

#[test]
fn version_reports_the_package_version() {
    let out = linkwire(&["version"]);
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).expect("output should be utf-8");
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn host_timeout_exits_with_an_error() {
    let rom = write_temp_rom("timeout");

    let out = linkwire(&[
        "host",
        rom.to_str().expect("temp path should be utf-8"),
        "--port",
        "0",
        "--timeout",
        "300ms",
        "--format",
        "json",
    ]);
    assert!(!out.status.success(), "an expired host should exit non-zero");

    let stdout = String::from_utf8(out.stdout).expect("output should be utf-8");
    let states: Vec<String> = stdout
        .lines()
        .filter_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
        .filter_map(|value| value["state"].as_str().map(str::to_string))
        .collect();
    assert!(
        states.contains(&"hosting".to_string()),
        "snapshots should include hosting, got {states:?}"
    );
    assert_eq!(states.last().map(String::as_str), Some("disconnected"));

    let _ = std::fs::remove_file(rom);
}
