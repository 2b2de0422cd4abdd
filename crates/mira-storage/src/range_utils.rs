//! Range query helpers for prefix scans.

/// Calculate the exclusive end bound for a prefix range query.
///
/// Given prefix "u1:", returns "u1;" (next ASCII char after ':').
/// This allows efficient range scans: range(prefix..end_prefix)
pub fn prefix_end_bound(prefix: &str) -> String {
    if prefix.is_empty() {
        return String::new();
    }

    let mut bytes = prefix.as_bytes().to_vec();
    if let Some(last) = bytes.last_mut() {
        *last = last.saturating_add(1);
    }

    String::from_utf8(bytes).unwrap_or_else(|_| format!("{}\x7F", prefix))
}

/// Create a prefix range for redb queries.
pub fn prefix_range(prefix: &str) -> (String, String) {
    (prefix.to_string(), prefix_end_bound(prefix))
}

/// Encode a strength in [0, 1] as a fixed-width, lexicographically ordered key part.
///
/// Strengths are stored in millionths so `0.05` becomes `0050000`.
pub fn strength_key(strength: f64) -> String {
    let micros = (strength.clamp(0.0, 1.0) * 1_000_000.0).round() as u64;
    format!("{:07}", micros)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_end_bound() {
        assert_eq!(prefix_end_bound("u1:"), "u1;");
        assert_eq!(prefix_end_bound("episodic:mem-1:"), "episodic:mem-1;");
        assert_eq!(prefix_end_bound(""), "");
    }

    #[test]
    fn test_prefix_range() {
        let (start, end) = prefix_range("owner:");
        assert_eq!(start, "owner:");
        assert_eq!(end, "owner;");
    }

    #[test]
    fn test_strength_key_orders_lexicographically() {
        assert_eq!(strength_key(1.0), "1000000");
        assert_eq!(strength_key(0.05), "0050000");
        assert_eq!(strength_key(-0.5), "0000000");
        assert!(strength_key(0.099) < strength_key(0.1));
        assert!(strength_key(0.5) < strength_key(0.75));
    }
}
