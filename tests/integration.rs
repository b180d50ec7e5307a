//! End-to-end tests for the ktest CLI
//!
//! Each test builds a throwaway repository in a temp dir with fake build
//! and emulator scripts, then runs the real binary against it:
//! 1. Writing scenario files and shell fixtures
//! 2. Running `ktest run/list/explain` from the repository top
//! 3. Checking exit codes, the console report, and build side effects

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

/// Throwaway repository with a marker file and a short idle timeout
struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        fs::write(dir.path().join("Makefile"), "all:\n").expect("Failed to write marker");
        fs::create_dir_all(dir.path().join("test")).expect("Failed to create test dir");
        fs::write(
            dir.path().join("ktest.toml"),
            "[timeouts]\nidle_secs = 1\n",
        )
        .expect("Failed to write config");

        // Fake build tool: records every invocation, fails for `broken`
        let repo = Self { dir };
        repo.write_script(
            "make",
            "echo \"$*\" >> builds.log\n[ \"$1\" != broken ]\n",
        );
        repo
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write an executable shell script at the repository top
    fn write_script(&self, name: &str, body: &str) {
        let path = self.path().join(name);
        fs::write(&path, format!("#!/bin/sh\n{}", body)).expect("Failed to write script");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("Failed to make script executable");
    }

    /// Write a scenario file into the discovered location
    fn write_scenarios(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path().join("test").join(name);
        fs::write(&path, content).expect("Failed to write scenario file");
        path
    }

    fn copy_fixture(&self, name: &str) {
        let fixture = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join(name);
        fs::copy(&fixture, self.path().join("test").join(name)).expect("Failed to copy fixture");
    }

    /// Build commands executed so far, one per line
    fn builds(&self) -> Vec<String> {
        fs::read_to_string(self.path().join("builds.log"))
            .unwrap_or_default()
            .lines()
            .map(String::from)
            .collect()
    }

    fn run_ktest(&self, args: &[&str]) -> KtestOutput {
        self.run_ktest_in(self.path(), args, &[])
    }

    /// Run ktest from `dir` with extra environment variables
    fn run_ktest_in(&self, dir: &Path, args: &[&str], envs: &[(&str, &Path)]) -> KtestOutput {
        let output = Command::new(env!("CARGO_BIN_EXE_ktest"))
            .args(args)
            .current_dir(dir)
            .envs(envs.iter().copied())
            .env("NO_COLOR", "1")
            .env_remove("KTEST_OUTPUT")
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to run ktest");

        KtestOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            code: output.status.code(),
        }
    }
}

/// Output from a ktest invocation
#[derive(Debug)]
struct KtestOutput {
    stdout: String,
    stderr: String,
    code: Option<i32>,
}

/// Check if Tcl expect is available
fn expect_available() -> bool {
    which::which("expect").is_ok()
}

// ============== Tests ==============

#[test]
fn test_boot_reaches_ready_banner() {
    if !expect_available() {
        eprintln!("Skipping test: expect not available");
        return;
    }

    let repo = TestRepo::new();
    repo.copy_fixture("test_boot.yaml");
    repo.write_script("emulate", "echo booting\necho READY\nsleep 2\n");

    let output = repo.run_ktest(&["run"]);
    assert_eq!(output.code, Some(0), "ktest failed: {:?}", output);
    assert!(output.stdout.contains("boot reaches the ready banner"));
    assert!(output.stdout.contains("all passed"));
    assert_eq!(repo.builds(), vec!["v1"]);
}

#[test]
fn test_silent_emulator_times_out() {
    if !expect_available() {
        eprintln!("Skipping test: expect not available");
        return;
    }

    let repo = TestRepo::new();
    repo.copy_fixture("test_boot.yaml");
    repo.write_script("emulate", "sleep 5\n");

    let output = repo.run_ktest(&["run"]);
    assert_eq!(output.code, Some(1), "ktest should fail: {:?}", output);
    assert!(output.stdout.contains("[       FAIL ]"));
    assert!(output.stdout.contains("Command that failed:"));

    // The diagnostic reproduces the generated script
    let expected_script = "set timeout 1\n\
                           log_user 1\n\
                           \n\
                           spawn ./emulate\n\
                           \n\
                           expect_before {\n    timeout { exit 1 }\n    eof { exit 1 }\n}\n\
                           \n\
                           expect \"READY\" { exit 0 }\nexit 1\n";
    assert!(
        output.stdout.contains(expected_script),
        "Missing script in: {}",
        output.stdout
    );
}

#[test]
fn test_shared_build_runs_once() {
    let repo = TestRepo::new();
    repo.write_scenarios(
        "test_unittests.yaml",
        r#"
scenarios:
  - name: libsupport unittest
    builds:
      - ./make -O0
      - ./make -O3
    command: "true"
    test_cases:
      - name: runs successfully
        execute: true
  - name: programs unittest
    builds:
      - ./make -O0
      - ./make  -O3
    command: "true"
    test_cases:
      - name: runs successfully
        execute: true
"#,
    );

    let output = repo.run_ktest(&["run"]);
    assert_eq!(output.code, Some(0), "ktest failed: {:?}", output);
    // `./make  -O3` differs by whitespace and is its own group
    assert_eq!(repo.builds(), vec!["-O0", "-O3", "-O3"]);
}

#[test]
fn test_build_failure_stops_run() {
    let repo = TestRepo::new();
    repo.write_scenarios(
        "test_build.yaml",
        r#"
scenarios:
  - name: kernel
    builds:
      - ./make broken
      - ./make fine
    command: "true"
    test_cases:
      - name: runs
        execute: true
"#,
    );

    let output = repo.run_ktest(&["run"]);
    assert_eq!(output.code, Some(1));
    assert!(output.stdout.contains("[       FAIL ]   build"));
    assert!(output.stdout.contains("Command that failed:\n./make broken"));
    assert_eq!(repo.builds(), vec!["broken"]);
}

#[test]
fn test_test_failure_skips_later_groups() {
    let repo = TestRepo::new();
    repo.write_scenarios(
        "test_fail_fast.yaml",
        r#"
scenarios:
  - name: first
    builds: [./make v1]
    command: "exit 4"
    test_cases:
      - name: fails
        execute: true
  - name: second
    builds: [./make v2]
    command: "true"
    test_cases:
      - name: never runs
        execute: true
"#,
    );

    let output = repo.run_ktest(&["run"]);
    assert_eq!(output.code, Some(1));
    assert!(output.stdout.contains("Command that failed:\nexit 4"));
    assert!(!output.stdout.contains("never runs"));
    assert_eq!(repo.builds(), vec!["v1"]);
}

#[test]
fn test_reference_cycle_is_configuration_error() {
    let repo = TestRepo::new();
    repo.write_scenarios(
        "test_cycle.yaml",
        r#"
scenarios:
  - name: a
    test_cases:
      - include: b
  - name: b
    test_cases:
      - include: a
  - name: kernel
    builds: [./make v1]
    command: "true"
    test_cases:
      - include: a
"#,
    );

    let output = repo.run_ktest(&["run"]);
    assert_eq!(output.code, Some(1));
    assert!(
        output.stderr.contains("kernel -> a -> b -> a"),
        "Expected cycle in stderr: {}",
        output.stderr
    );
    assert!(repo.builds().is_empty(), "no build may start");
}

#[test]
fn test_list_json_shows_inlined_cases() {
    let repo = TestRepo::new();
    repo.write_scenarios(
        "test_shell.yaml",
        r#"
scenarios:
  - name: shell
    test_cases:
      - name: starts
        expect: expect ">"
  - name: qemu shell
    builds: [./make v1]
    command: qemu-system-i386 -cdrom peos2.img
    test_cases:
      - include: shell
      - name: stress
        expect: expect "WELCOME TO TESTER"
"#,
    );

    let output = repo.run_ktest(&["list", "--json"]);
    assert_eq!(output.code, Some(0), "ktest failed: {:?}", output);

    let listing: serde_json::Value =
        serde_json::from_str(&output.stdout).expect("list --json emits JSON");
    assert_eq!(listing[0]["build"], "./make v1");
    assert_eq!(listing[0]["scenarios"][0]["name"], "qemu shell");
    assert_eq!(
        listing[0]["scenarios"][0]["test_cases"],
        serde_json::json!(["starts [shell]", "stress"])
    );
    assert!(repo.builds().is_empty(), "list must not build");
}

#[test]
fn test_explain_prints_generated_script() {
    let repo = TestRepo::new();
    repo.copy_fixture("test_boot.yaml");

    let output = repo.run_ktest(&["explain", "boot"]);
    assert_eq!(output.code, Some(0), "ktest failed: {:?}", output);
    assert!(output.stdout.contains("expect <<'EOF'"));
    assert!(output.stdout.contains("spawn ./emulate"));
}

#[test]
fn test_only_unknown_scenario_fails() {
    let repo = TestRepo::new();
    repo.copy_fixture("test_boot.yaml");

    let output = repo.run_ktest(&["run", "--only", "nope"]);
    assert_eq!(output.code, Some(1));
    assert!(output.stderr.contains("'nope'"));
}

#[test]
fn test_user_config_markers_locate_top() {
    let repo = TestRepo::new();
    fs::remove_file(repo.path().join("Makefile")).expect("Failed to remove marker");
    fs::remove_file(repo.path().join("ktest.toml")).expect("Failed to remove config");
    fs::write(repo.path().join("peos.top"), "").expect("Failed to write marker");
    repo.copy_fixture("test_boot.yaml");

    let xdg = repo.path().join("xdg");
    fs::create_dir_all(xdg.join("ktest")).expect("Failed to create config dir");
    fs::write(
        xdg.join("ktest").join("config.toml"),
        "[discovery]\nmarkers = [\"peos.top\"]\n",
    )
    .expect("Failed to write user config");

    let output = repo.run_ktest_in(
        &repo.path().join("test"),
        &["list", "--json"],
        &[("XDG_CONFIG_HOME", xdg.as_path())],
    );
    assert_eq!(output.code, Some(0), "ktest failed: {:?}", output);

    let listing: serde_json::Value =
        serde_json::from_str(&output.stdout).expect("list --json emits JSON");
    assert_eq!(listing[0]["scenarios"][0]["name"], "boot");
}

#[test]
fn test_unspawnable_automation_program_reports_failure() {
    let repo = TestRepo::new();
    repo.copy_fixture("test_boot.yaml");
    repo.write_script("emulate", "echo READY\n");

    // Executable, so it passes the PATH check, but its interpreter is missing
    let program = repo.path().join("broken-expect");
    fs::write(&program, "#!/nonexistent/interpreter\n").expect("Failed to write program");
    fs::set_permissions(&program, fs::Permissions::from_mode(0o755))
        .expect("Failed to make program executable");
    fs::write(
        repo.path().join("ktest.toml"),
        format!(
            "[timeouts]\nidle_secs = 1\n\n[interactive]\nprogram = \"{}\"\n",
            program.display()
        ),
    )
    .expect("Failed to write config");

    let output = repo.run_ktest(&["run"]);
    assert_eq!(output.code, Some(1));
    assert!(output.stdout.contains("[       FAIL ]   boot reaches the ready banner"));
    assert!(output.stdout.contains("Command that failed:"));
    assert!(output.stderr.contains("Failed to spawn"), "stderr: {}", output.stderr);
}
