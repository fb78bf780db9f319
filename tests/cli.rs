use assert_cmd::Command;
use predicates::prelude::*;

fn gateway_cmd() -> Command {
    let mut cmd = Command::cargo_bin("gerrit-argo-gateway").unwrap();
    for var in [
        "GERRIT_SERVER",
        "SSH_PRIVATE_KEY_PATH",
        "GERRIT_SSH_COMMAND",
        "GERRIT_SUBSCRIPTIONS",
        "ARGO_SERVER",
        "ARGO_NAMESPACE",
        "ARGO_TOKEN",
        "RECHECK_PATTERN",
        "RECHECK_CI_PREFIX",
        "GATEWAY_DISPATCH_INTERVAL_MS",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_help() {
    gateway_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--subscription"));
}

#[test]
fn test_missing_remote_target_exits_with_config_code() {
    gateway_cmd()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("GERRIT_SERVER"));
}

#[test]
fn test_invalid_remote_target_exits_with_config_code() {
    gateway_cmd()
        .env("GERRIT_SERVER", "not-a-target")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not-a-target"));
}

#[test]
fn test_unreadable_private_key_exits_with_config_code() {
    gateway_cmd()
        .env("GERRIT_SERVER", "bot@gerrit")
        .env("SSH_PRIVATE_KEY_PATH", "/nonexistent/id_rsa")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("/nonexistent/id_rsa"));
}
