/// Format a number for display.
///
/// Uses the shortest decimal that round-trips, so whole numbers print without
/// a fractional part (`7`, not `7.0`).
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        // Collapse -0 as well.
        "0".to_string()
    } else {
        n.to_string()
    }
}
