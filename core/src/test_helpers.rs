use similar::TextDiff;
use std::fs;
use std::path::Path;

/// Reads `name` from a case directory; `None` when the file does not exist.
pub fn read_case_file(case_path: &Path, name: &str) -> std::io::Result<Option<String>> {
    let path = case_path.join(name);
    if !path.is_file() {
        return Ok(None);
    }
    fs::read_to_string(path).map(Some)
}

/// Compares `actual` to `expected`, logging a unified diff on mismatch.
pub fn verify_text(
    log: &mut String,
    label: &str,
    expected: &str,
    actual: &str,
) -> std::result::Result<(), String> {
    if expected == actual {
        logln(log, format!("    ✓ {label} verified"));
        return Ok(());
    }

    logln(log, format!("    ❌ {label} mismatch:"));
    let diff = TextDiff::from_lines(expected, actual);
    let unified = diff.unified_diff().context_radius(2).header("expected", "actual").to_string();
    for line in unified.lines() {
        logln(log, format!("      {line}"));
    }
    Err(format!("{label} does not match expected."))
}

pub fn case_header(log: &mut String, name: &str) {
    logln(log, format!("\n— Testing: {} —", name));
}

pub fn logln<S: Into<String>>(buf: &mut String, s: S) {
    if !buf.is_empty() && !buf.ends_with('\n') {
        buf.push('\n');
    }
    buf.push_str(&s.into());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logln_separates_entries() {
        let mut log = String::new();
        logln(&mut log, "one");
        logln(&mut log, "two");
        assert_eq!(log, "one\ntwo");
    }

    #[test]
    fn mismatches_are_logged_as_a_unified_diff() {
        let mut log = String::new();
        assert!(verify_text(&mut log, "baseline", "a\nb\n", "a\nb\n").is_ok());
        assert!(verify_text(&mut log, "baseline", "a\nb\n", "a\nc\n").is_err());
        assert!(log.contains("✓ baseline verified"));
        assert!(log.contains("-b"));
        assert!(log.contains("+c"));
    }

    #[test]
    fn missing_case_files_are_none() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("present.txt"), "x").unwrap();
        assert_eq!(read_case_file(dir.path(), "present.txt").unwrap().as_deref(), Some("x"));
        assert_eq!(read_case_file(dir.path(), "absent.txt").unwrap(), None);
    }
}
