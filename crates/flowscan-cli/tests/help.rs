use assert_cmd::Command;
use predicates::prelude::*;

/// Helper to get a Command for the flowscan binary.
#[allow(deprecated)]
fn flowscan_cmd() -> Command {
    Command::cargo_bin("flowscan").unwrap()
}

#[test]
fn help_works() {
    flowscan_cmd().arg("--help").assert().success();
}

#[test]
fn help_lists_every_command() {
    flowscan_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("rules")
                .and(predicate::str::contains("flows"))
                .and(predicate::str::contains("scan"))
                .and(predicate::str::contains("report")),
        );
}

#[test]
fn unknown_report_format_is_rejected() {
    flowscan_cmd()
        .args(["report", "--format", "pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("pdf"));
}
