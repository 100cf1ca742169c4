use std::process::Command;

#[test]
fn main_replays_commands_without_errors_as_expected() {
    let bin = env!("CARGO_BIN_EXE_vaultledger");
    let csv_path = "tests/fixtures/main_replays_commands_without_errors_as_expected.csv";

    let output = Command::new(bin).arg(csv_path).output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(
        output.status.success(),
        "binary failed: status={:?} stderr={stderr} stdout={stdout}",
        output.status,
    );
    insta::assert_snapshot!(stdout);
    assert!(stderr.contains("replay completed"));
    assert!(stderr.contains("emergency withdrawal owner=0 amount=10"));
}

#[test]
fn main_replays_commands_with_errors_as_expected() {
    let bin = env!("CARGO_BIN_EXE_vaultledger");
    let csv_path = "tests/fixtures/main_replays_commands_with_errors_as_expected.csv";

    let output = Command::new(bin).arg(csv_path).output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(Some(1), output.status.code());
    insta::assert_snapshot!(stdout);
    // Not using snapshotting because log lines carry timestamps.
    assert!(stderr.contains("failed to deserialize command"));
    assert!(stderr.contains("unknown variant `foo`"));
    assert!(stderr.contains("missing field `amount`"));
    assert!(stderr.contains("deposit amount must be greater than zero"));
    assert!(stderr.contains("deposit exceeds bank cap attempted=2000500 cap=1000000"));
    assert!(stderr.contains("withdrawal exceeds limit requested=1500 limit=1000"));
    assert!(stderr.contains("withdrawal cooldown not met"));
    assert!(stderr.contains("insufficient balance account=2 requested=10 available=0"));
    assert!(stderr.contains("no balance to withdraw account=3"));
    assert!(stderr.contains("unauthorized caller=1"));
    assert!(stderr.contains("invalid bank cap requested=400"));
    assert!(stderr.contains("emergency withdrawal exceeds pool funds requested=401 available=400"));
}

#[test]
fn main_applies_policy_flags() {
    let bin = env!("CARGO_BIN_EXE_vaultledger");
    let csv_path = "tests/fixtures/main_replays_commands_without_errors_as_expected.csv";

    let output = Command::new(bin)
        .arg(csv_path)
        .args(["--withdrawal-limit", "150", "--owner", "9"])
        .output()
        .unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(Some(1), output.status.code());
    assert!(stderr.contains("withdrawal exceeds limit requested=200 limit=150"));
    assert!(stderr.contains("unauthorized caller=0"));
}
