mod fixtures;

use fixtures::*;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

fn evtx_transform() -> Command {
    Command::new(assert_cmd::cargo_bin!("evtx_transform"))
}

fn args(w: &Workspace) -> [String; 4] {
    ["events.evtx", "transform.xslt", "output.txt", "run.log"]
        .map(|name| w.path(name).to_string_lossy().into_owned())
}

#[test]
fn it_prints_usage_to_stdout_when_arguments_are_missing() {
    let w = Workspace::new();
    let [input, stylesheet, ..] = args(&w);

    evtx_transform()
        .args([input, stylesheet])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Usage"));

    assert!(!w.path("run.log").exists());
}

#[test]
fn it_reports_inaccessible_files_in_the_run_log() {
    let w = Workspace::new();
    w.write_stylesheet(TEXT_STYLESHEET);

    evtx_transform()
        .args(args(&w))
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let log = w.read("run.log");
    assert!(log.starts_with("Event file: "));
    assert!(log.contains("Error checking files."));
    assert!(!w.path("output.txt").exists());
}

#[test]
fn it_reports_stylesheet_errors_in_the_run_log() {
    let w = Workspace::new();
    w.write("events.evtx", "not an event log");
    w.write_stylesheet("<html><body/></html>");

    evtx_transform()
        .args(args(&w))
        .assert()
        .success()
        .stderr(predicate::str::contains("document is not a stylesheet").not());

    let log = w.read("run.log");
    assert!(log.contains("Preparing files ..."));
    assert!(log.contains("Error loading XSLT"));
    assert!(log.contains("document is not a stylesheet"));
    assert!(!log.contains("Reading and processing events ..."));
    assert!(log.ends_with("Closing output file\nClosing log file\n"));
}

#[test]
fn it_fails_when_the_run_log_cannot_be_created() {
    let w = Workspace::new();
    let [input, stylesheet, output, _] = args(&w);
    let run_log = w.path("missing").join("run.log");

    evtx_transform()
        .args([input, stylesheet, output])
        .arg(run_log)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error initializing log file"));
}

#[test]
fn it_overwrites_the_run_log_of_a_previous_run() {
    let w = Workspace::new();
    w.write("run.log", "left over from a previous run\n");

    evtx_transform().args(args(&w)).assert().success();
    evtx_transform().args(args(&w)).assert().success();

    let log = w.read("run.log");
    assert!(!log.contains("left over"));
    assert_eq!(log.matches("Event file: ").count(), 1);
}
