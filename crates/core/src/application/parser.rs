// Separator Output Parser
// Single narrowly-scoped place that knows the tool's diagnostic phrasing
// (ADR-011: text matching is brittle; tool-version changes touch one file)

/// Marker keyword a diagnostic line must carry to count as progress
pub const PROGRESS_MARKER: &str = "Processing";

/// Translate one raw diagnostic line into an optional progress fraction.
///
/// A line yields `Some(p / 100)` iff it contains [`PROGRESS_MARKER`]
/// and an `<integer>%` substring. The figure is a single combined
/// value for all stems; the tool does not report per-stem progress.
/// Anything else (partial lines, plain log output, noise) yields
/// `None`.
pub fn parse_progress_line(line: &str) -> Option<f64> {
    if !line.contains(PROGRESS_MARKER) {
        return None;
    }
    extract_percent(line).map(|p| f64::from(p) / 100.0)
}

/// Find the first `<integer>%` in the line and return the integer.
fn extract_percent(line: &str) -> Option<u32> {
    let bytes = line.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b != b'%' {
            continue;
        }
        let mut start = i;
        while start > 0 && bytes[start - 1].is_ascii_digit() {
            start -= 1;
        }
        if start == i {
            continue; // '%' with no digits before it
        }
        if let Ok(p) = line[start..i].parse::<u32>() {
            return Some(p);
        }
    }
    None
}
