//! Chat-renderer formatting fixes for model output

/// Rewrite `**bold**` to `*bold*` for renderers that use single-asterisk bold.
///
/// Not idempotent on runs of four or more asterisks, so call it exactly once
/// per response.
pub fn normalize_emphasis(text: &str) -> String {
    text.replace("**", "*")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_to_single() {
        assert_eq!(normalize_emphasis("**x**"), "*x*");
        assert_eq!(normalize_emphasis("**x** **y**"), "*x* *y*");
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(normalize_emphasis("no markup, *already single*"), "no markup, *already single*");
        assert_eq!(normalize_emphasis(""), "");
    }

    #[test]
    fn test_quadruple_needs_second_pass() {
        let once = normalize_emphasis("****x****");
        assert_eq!(once, "**x**");
        assert_ne!(normalize_emphasis(&once), once);
    }
}
