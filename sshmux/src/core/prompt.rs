//! Coercion of free-text prompt answers.

/// Parse a window count. Anything that is not a non-negative integer counts
/// as zero; the second value reports whether coercion happened.
pub fn coerce_count(answer: &str) -> (usize, bool) {
    let trimmed = answer.trim();
    if trimmed.is_empty() {
        return (0, false);
    }
    match trimmed.parse::<usize>() {
        Ok(count) => (count, false),
        Err(_) => (0, true),
    }
}

/// Label for the `n`th extra window of `host` (1-based) when none was given.
pub fn default_label(host: &str, n: usize) -> String {
    format!("{host}-{n}")
}
