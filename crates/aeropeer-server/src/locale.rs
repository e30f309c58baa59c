//! Locale derivation for gate redirects.
//!
//! The gate runs before any locale middleware, so this is a heuristic:
//! the first path segment is taken as the locale, with a configured
//! fallback when the path carries none. It is not a full locale
//! resolution pass.

/// Derive the locale from the leading path segment.
///
/// `/fr/reports` yields `fr`; `/` and the empty path yield `default`.
pub fn locale_from_path<'a>(path: &'a str, default: &'a str) -> &'a str {
    match path.trim_start_matches('/').split('/').next() {
        Some(segment) if !segment.is_empty() => segment,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_segment() {
        assert_eq!(locale_from_path("/en/dashboard", "en"), "en");
        assert_eq!(locale_from_path("/fr/reports/annual", "en"), "fr");
        assert_eq!(locale_from_path("/pt", "en"), "pt");
    }

    #[test]
    fn test_fallback_when_absent() {
        assert_eq!(locale_from_path("/", "en"), "en");
        assert_eq!(locale_from_path("", "en"), "en");
        assert_eq!(locale_from_path("//", "fr"), "fr");
    }

    #[test]
    fn test_no_leading_slash() {
        assert_eq!(locale_from_path("fr/reports", "en"), "fr");
    }
}
