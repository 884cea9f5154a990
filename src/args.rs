//! Argument parsers shared by the subcommands.

/// Simulated response accuracy. Zero is rejected along with anything outside
/// `(0, 1]`, since a participant that is never right never meets criterion.
pub fn parse_accuracy(raw: &str) -> Result<f64, String> {
    let accuracy: f64 = raw.trim().parse().map_err(|e| format!("{raw:?}: {e}"))?;
    if accuracy > 0.0 && accuracy <= 1.0 {
        Ok(accuracy)
    } else {
        Err(format!("{raw} is not in (0, 1]"))
    }
}
