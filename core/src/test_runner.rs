//! Replays review scenarios stored on disk.
//!
//! Each case is a directory holding `meta.json`, `original.txt` and
//! `candidate.txt`, plus optional `expected_original.txt` and
//! `expected_working.txt` checked after the actions have run.

use crate::logger::Logger;
use crate::session::{DiffSession, Resolution};
use crate::test_helpers::*;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Accept(usize),
    Reject(usize),
    AcceptAll,
    RejectAll,
}

#[derive(Deserialize, Debug)]
struct CaseMeta {
    description: String,
    #[serde(default)]
    actions: Vec<Action>,
    #[serde(default)]
    expect_failures: usize,
    expect_diff_mode: bool,
    expected_log_contains: Option<String>,
}

#[derive(Debug, Default)]
pub struct GauntletReport {
    pub log: String,
    pub passed: usize,
    pub total: usize,
}

impl GauntletReport {
    pub fn succeeded(&self) -> bool {
        self.total > 0 && self.passed == self.total
    }
}

/// Runs every case directory under `cases_dir`, in name order.
pub fn run(cases_dir: &Path) -> GauntletReport {
    let rid = Logger::next_rid();
    let mut report = GauntletReport::default();
    logln(&mut report.log, "🧪 **Review Gauntlet** starting…");
    logln(&mut report.log, format!("📂 Cases at: {}", cases_dir.display()));

    let mut cases: Vec<PathBuf> = match fs::read_dir(cases_dir) {
        Ok(iter) => iter.flatten().map(|e| e.path()).filter(|p| p.is_dir()).collect(),
        Err(e) => {
            logln(&mut report.log, format!("❌ Failed to read cases directory: {}", e));
            return report;
        }
    };
    cases.sort();

    for case_path in &cases {
        report.total += 1;
        let case_name = case_path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        case_header(&mut report.log, &case_name);

        if run_case(rid, &mut report.log, case_path) {
            report.passed += 1;
            logln(&mut report.log, "  ✅ case passed");
        } else {
            logln(&mut report.log, "  ❌ case failed");
        }
    }

    logln(&mut report.log, format!("\n🧾 **Cases Passed**: {}/{}", report.passed, report.total));
    if report.succeeded() {
        logln(&mut report.log, "\n✅ **Gauntlet PASSED**");
    } else {
        logln(&mut report.log, "\n❌ **Gauntlet FAILED** – see failed cases above");
    }
    report
}

fn run_case(rid: u64, log: &mut String, case_path: &Path) -> bool {
    let meta: CaseMeta = match fs::read_to_string(case_path.join("meta.json")) {
        Ok(text) => match serde_json::from_str(&text) {
            Ok(m) => m,
            Err(e) => {
                logln(log, format!("  ❌ Failed to parse meta.json: {}", e));
                return false;
            }
        },
        Err(e) => {
            logln(log, format!("  ❌ Failed to read meta.json: {}", e));
            return false;
        }
    };
    logln(log, format!("  • {}", meta.description));

    let (original, candidate) = match (
        read_case_file(case_path, "original.txt"),
        read_case_file(case_path, "candidate.txt"),
    ) {
        (Ok(Some(o)), Ok(Some(c))) => (o, c),
        _ => {
            logln(log, "  ❌ Case needs readable original.txt and candidate.txt");
            return false;
        }
    };

    let buffer = Arc::new(Mutex::new(String::new()));
    let mut session = DiffSession::new(original, Logger::capturing(rid, buffer.clone()));
    session.begin_diff(candidate);
    logln(log, format!("    hunks: {}", session.stats().pending()));

    let mut failures = 0;
    for action in &meta.actions {
        let outcome = match *action {
            Action::Accept(i) => session.accept_hunk(i).map(Some),
            Action::Reject(i) => session.reject_hunk(i).map(Some),
            Action::AcceptAll => {
                session.accept_all();
                Ok(None)
            }
            Action::RejectAll => {
                session.reject_all();
                Ok(None)
            }
        };
        match outcome {
            Ok(Some(Resolution::Converged)) => logln(log, format!("    {action:?} -> converged")),
            Ok(Some(Resolution::Reviewing { remaining })) => {
                logln(log, format!("    {action:?} -> {remaining} pending"))
            }
            Ok(None) => logln(log, format!("    {action:?}")),
            Err(e) => {
                logln(log, format!("    {action:?} refused: {}", e));
                failures += 1;
            }
        }
    }

    let mut checks_passed = true;
    if failures != meta.expect_failures {
        logln(log, format!(
            "    ❌ Expected {} refused action(s), got {}.",
            meta.expect_failures, failures
        ));
        checks_passed = false;
    }

    if session.is_reviewing() != meta.expect_diff_mode {
        logln(log, format!(
            "    ❌ Expected diff mode {}, session reports {}.",
            meta.expect_diff_mode,
            session.is_reviewing()
        ));
        checks_passed = false;
    } else {
        logln(log, format!("    ✓ Diff mode is {}", meta.expect_diff_mode));
    }

    for (file, label, actual) in [
        ("expected_original.txt", "baseline", session.committed()),
        ("expected_working.txt", "working text", session.working()),
    ] {
        match read_case_file(case_path, file) {
            Ok(Some(expected)) => {
                if verify_text(log, label, &expected, actual).is_err() {
                    checks_passed = false;
                }
            }
            Ok(None) => {}
            Err(e) => {
                logln(log, format!("    ❌ Failed to read {file}: {}", e));
                checks_passed = false;
            }
        }
    }

    if let Some(expected_str) = meta.expected_log_contains {
        let captured = buffer.lock().map(|b| b.contains(&expected_str)).unwrap_or(false);
        if !captured {
            logln(log, format!("    ❌ Log verification failed. Did not find '{}'.", expected_str));
            checks_passed = false;
        } else {
            logln(log, format!("    ✓ Log verification passed. Found '{}'.", expected_str));
        }
    }

    checks_passed
}

/// Locates `tests/cases`, walking up from the current directory, then
/// falling back to the workspace root above `CARGO_MANIFEST_DIR`.
pub fn find_cases_dir() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;
    loop {
        let cases = current.join("tests").join("cases");
        if cases.is_dir() {
            return Some(cases);
        }
        if !current.pop() {
            break;
        }
    }

    let manifest_dir = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").ok()?);
    let cases = manifest_dir.parent()?.join("tests").join("cases");
    cases.is_dir().then_some(cases)
}
