// End-to-end tests driving the set-store binary over stdin

use assert_cmd::Command;
use std::fs;
use tempfile::TempDir;

fn run(input: &str) -> String {
    let output = Command::cargo_bin("set-store")
        .unwrap()
        .env("SET_STORE_LOG", "off")
        .write_stdin(input)
        .output()
        .unwrap();
    assert!(output.status.success());
    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn test_sadd_scard_session() {
    let stdout = run("SADD s1 1 2 3\nSADD s1 2 4\nSCARD s1\n");
    assert_eq!(stdout, "(integer) 3\n(integer) 1\n(integer) 4\n");
}

#[test]
fn test_set_algebra_session() {
    let stdout = run("SADD s1 1 2 3 4\nSADD s2 1 2 8\nSDIFF s1 s2\nSINTERCARD 2 s1 s2\n");
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "(integer) 4");
    assert_eq!(lines[1], "(integer) 3");
    // Array items are numbered; their order is unspecified.
    let mut diff: Vec<&str> = lines[2..4].iter().map(|l| &l[3..]).collect();
    diff.sort();
    assert_eq!(diff, ["\"3\"", "\"4\""]);
    assert_eq!(lines[4], "(integer) 2");
}

#[test]
fn test_errors_and_nil() {
    let stdout = run("SET k v\nSADD k a\nSPOP missing\nBOGUS\nSADD \"open\n");
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "OK");
    assert_eq!(
        lines[1],
        "(error) WRONGTYPE Operation against a key holding the wrong kind of value"
    );
    assert_eq!(lines[2], "(nil)");
    assert_eq!(lines[3], "(error) ERR unknown command 'BOGUS'");
    assert_eq!(lines[4], "(error) ERR unbalanced quotes in request");
}

#[test]
fn test_quit_stops_processing() {
    let stdout = run("PING\nQUIT\nPING\n");
    assert_eq!(stdout, "PONG\n");
}

#[test]
fn test_config_file_argument() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("set-store.conf");
    fs::write(&config_path, "lock-stripes 4\n").unwrap();

    let output = Command::cargo_bin("set-store")
        .unwrap()
        .arg(&config_path)
        .env("SET_STORE_LOG", "off")
        .write_stdin("SADD s a\n")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "(integer) 1\n");
}

#[test]
fn test_bad_config_file_fails() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("bad.conf");
    fs::write(&config_path, "lock-stripes zero\n").unwrap();

    let output = Command::cargo_bin("set-store")
        .unwrap()
        .arg(&config_path)
        .write_stdin("")
        .output()
        .unwrap();
    assert!(!output.status.success());
}
