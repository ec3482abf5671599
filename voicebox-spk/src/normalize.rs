//! Text normalization applied before hashing and synthesis

/// Remove line breaks and trim surrounding whitespace.
///
/// Line breaks are dropped without inserting a space, so `"foo\nbar"` becomes
/// `"foobar"`. Carriage returns are dropped as well, so CRLF input shares its
/// artifact with the LF form.
pub fn normalize_text(raw: &str) -> String {
    let joined: String = raw.chars().filter(|c| *c != '\n' && *c != '\r').collect();
    joined.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_newlines_without_spacing() {
        assert_eq!(normalize_text("hello\nworld"), "helloworld");
        assert_eq!(normalize_text("hello\r\nworld"), "helloworld");
    }

    #[test]
    fn trims_outer_whitespace_only() {
        assert_eq!(normalize_text("  two  words \t"), "two  words");
    }

    #[test]
    fn blank_inputs_normalize_to_empty() {
        assert!(normalize_text("").is_empty());
        assert!(normalize_text("   ").is_empty());
        assert!(normalize_text("\n\r\n\t").is_empty());
    }

    #[test]
    fn keeps_non_ascii_text() {
        assert_eq!(normalize_text(" สวัสดีครับ\n"), "สวัสดีครับ");
    }
}
