use assert_cmd::Command;
use predicates::prelude::*;

fn ostrich() -> Command {
    Command::cargo_bin("ostrich").unwrap()
}

#[test]
fn test_commonpath_posix() {
    ostrich()
        .args(["commonpath", "--style", "posix", "/usr/lib/", "/usr/lib64"])
        .assert()
        .success()
        .stdout("/usr\n");
}

#[test]
fn test_commonpath_windows() {
    ostrich()
        .args([
            "commonpath",
            "--style",
            "windows",
            "C:\\Program Files\\Foo",
            "c:/program files/bar",
        ])
        .assert()
        .success()
        .stdout("C:\\Program Files\n");
}

#[test]
fn test_commonpath_mixed_paths_fail() {
    ostrich()
        .args(["commonpath", "--style", "posix", "/usr", "usr"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Can't mix absolute and relative paths"));
}

#[test]
fn test_safe_path() {
    ostrich()
        .args(["safe-path", "hello world, what's up?.txt"])
        .assert()
        .success()
        .stdout("hello_world__what_s_up_.txt\n");
}

#[test]
fn test_safe_path_rejects_dots() {
    ostrich().args(["safe-path", ".."]).assert().failure();
}

#[test]
fn test_capabilities() {
    ostrich()
        .arg("capabilities")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("timeout_supported="));
}

#[cfg(unix)]
#[test]
fn test_run_passes_exit_code_through() {
    ostrich()
        .args(["run", "--", "sh", "-c", "exit 47"])
        .assert()
        .code(47);
}

#[cfg(unix)]
#[test]
fn test_run_captures_output() {
    ostrich()
        .args(["run", "--capture", "--input", "spam", "--", "tr", "a-z", "A-Z"])
        .assert()
        .success()
        .stdout("SPAM");
}

#[cfg(unix)]
#[test]
fn test_run_check_reports_failure() {
    ostrich()
        .args(["run", "--check", "--", "sh", "-c", "exit 3"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains(
            "Command 'sh -c exit 3' returned non-zero exit status 3",
        ));
}

#[cfg(unix)]
#[test]
fn test_run_relative_program_in_cwd() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("hello.sh");
    std::fs::write(&script, "#!/bin/sh\necho hello\n").unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

    ostrich()
        .args(["run", "--capture", "--cwd"])
        .arg(dir.path())
        .args(["--", "./hello.sh"])
        .assert()
        .success()
        .stdout("hello\n");
}

#[cfg(unix)]
#[test]
fn test_run_missing_working_directory() {
    let dir = tempfile::tempdir().unwrap();
    ostrich()
        .args(["run", "--cwd"])
        .arg(dir.path().join("missing"))
        .args(["--", "true"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Working directory not found"));
}

#[cfg(unix)]
#[test]
fn test_run_timeout() {
    ostrich()
        .args(["run", "--timeout", "0.2", "--", "sleep", "30"])
        .assert()
        .code(124)
        .stderr(predicate::str::contains("timed out after 0.2 seconds"));
}

#[cfg(unix)]
#[test]
fn test_run_json_output() {
    ostrich()
        .args(["run", "--json", "--capture", "--env", "FRUIT=banana", "--", "sh", "-c", "printf \"$FRUIT\""])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"returncode\": 0"))
        .stdout(predicate::str::contains("\"stdout\": \"banana\""))
        .stdout(predicate::str::contains("\"args\": [\n    \"sh\","));
}

#[test]
fn test_run_unknown_program() {
    ostrich()
        .args(["run", "--", "ostrich-no-such-program-xyz"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Command not found"));
}
