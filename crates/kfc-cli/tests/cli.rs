//! End-to-end tests for the `kfc` binary.

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

fn kfc() -> Command {
    let mut cmd = Command::cargo_bin("kfc").unwrap();
    cmd.env_remove("KFC_SMTP_SMARTHOST")
        .env_remove("KFC_SMTP_SENDER")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn fingerprint_prints_known_value() {
    kfc()
        .args(["fingerprint", "-l", "alertname=HighLatency", "-l", "instance=a"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Fingerprint:  a30d814ee85c3d3c\n"));
}

#[test]
fn fingerprint_json() {
    kfc()
        .args(["--format", "json", "fingerprint", "-l", "alertname=Test"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"fingerprint\": \"a95455532b13f1fa\""));
}

#[test]
fn fingerprint_rejects_malformed_label() {
    kfc()
        .args(["fingerprint", "-l", "no-equals-sign"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no-equals-sign"));
}

#[test]
fn render_from_flags() {
    kfc()
        .args([
            "--sender",
            "alerts@example.org",
            "render",
            "--to",
            "oncall@example.org",
            "--summary",
            "p99 above 500ms",
            "-l",
            "alertname=HighLatency",
            "-p",
            "runbook=https://runbooks.example.org/latency",
        ])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "From: KFC2K <alerts@example.org>\nTo: oncall@example.org\nDate: ",
        ))
        .stdout(predicate::str::contains(
            "Subject: [ALERT] HighLatency: p99 above 500ms\n",
        ))
        .stdout(predicate::str::contains(
            "Payload labels:\n\n  runbook = \"https://runbooks.example.org/latency\"",
        ));
}

#[test]
fn render_resolved_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(
        br#"{
            "summary": "disk almost full",
            "description": "93% used on /var",
            "labels": {"alertname": "DiskFull", "instance": "db-1"}
        }"#,
    )
    .unwrap();

    kfc()
        .args(["render", "--to", "oncall@example.org", "--resolve", "--alert-file"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Subject: [RESOLVED] DiskFull: disk almost full\n",
        ))
        .stdout(predicate::str::contains("93% used on /var\n"))
        .stdout(predicate::str::contains("  instance = \"db-1\""));
}

#[test]
fn send_without_smarthost_fails() {
    kfc()
        .args(["send", "--to", "oncall@example.org", "--summary", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no smart host configured"));
}

#[test]
fn send_to_closed_port_fails() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().to_string()
    };

    kfc()
        .args(["--smarthost", &addr, "--timeout-secs", "5"])
        .args(["send", "--to", "oncall@example.org", "--summary", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: notification failed: connect to"));
}
