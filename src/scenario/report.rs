//! Console report
//!
//! gtest-style status lines on stdout. Everything here works on plain
//! strings; colouring is applied only to the status markers.

use std::io::Write;

use colored::Colorize;

const RUN: &str = "[ RUN...     ] ";
const OK: &str = "[         OK ] ";
const FAIL: &str = "[       FAIL ] ";
const SEPARATOR: &str = "[------------] ";

/// Label of a test case line: scenario name followed by test case name
pub fn test_label(scenario: &str, test_case: &str) -> String {
    format!("{} {}", scenario, test_case)
}

/// Line announcing a build group
pub fn build_header(build: &str) -> String {
    format!("{}{}", SEPARATOR.green(), build)
}

/// Transient line shown while something runs; overwritten by the verdict
fn running(label: &str) {
    print!("{}  {}\r", RUN.green(), label);
    let _ = std::io::stdout().flush();
}

fn passed(label: &str) {
    println!("{}  {}", OK.green(), label);
}

fn failed(label: &str, explanation: &str) {
    println!("{}  {}", FAIL.red(), label);
    println!();
    println!("Command that failed:");
    println!("{}", explanation);
}

pub fn build_started(build: &str) {
    println!("{}", build_header(build));
    running("build");
}

pub fn build_passed() {
    passed("build");
}

pub fn build_failed(build: &str) {
    failed("build", build);
}

pub fn test_started(scenario: &str, test_case: &str) {
    running(&test_label(scenario, test_case));
}

pub fn test_passed(scenario: &str, test_case: &str) {
    passed(&test_label(scenario, test_case));
}

pub fn test_failed(scenario: &str, test_case: &str, explanation: &str) {
    failed(&test_label(scenario, test_case), explanation);
}

pub fn group_passed() {
    println!("{}all tests passed", SEPARATOR.green());
    println!();
}

pub fn run_passed(builds: usize, test_cases: usize) {
    println!(
        "{}{} builds, {} test cases: all passed",
        SEPARATOR.green(),
        builds,
        test_cases
    );
}
