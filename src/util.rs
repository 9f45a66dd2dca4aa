//! Small shared helpers.

/// Truncate a string to at most `max_len` bytes, appending "..." when cut.
/// Backs up to a char boundary so multi-byte text stays valid.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let target = max_len.saturating_sub(3);
    let mut end = 0;
    for (idx, _) in s.char_indices() {
        if idx > target {
            break;
        }
        end = idx;
    }
    format!("{}...", &s[..end])
}

/// Format an integer with thousands separators: 6950 -> "6,950".
pub fn group_digits(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
