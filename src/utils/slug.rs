use regex::Regex;
use std::sync::LazyLock;

static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9-]+$").expect("valid slug regex"));

/// Lowercases and trims, then checks the `[a-z0-9-]` alphabet.
pub fn normalize_slug(raw: &str) -> Option<String> {
    let slug = raw.trim().to_lowercase();
    SLUG_RE.is_match(&slug).then_some(slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_slug() {
        assert_eq!(normalize_slug(" Beach-Bar ").as_deref(), Some("beach-bar"));
        assert_eq!(normalize_slug("demo2").as_deref(), Some("demo2"));
        assert_eq!(normalize_slug(""), None);
        assert_eq!(normalize_slug("beach bar"), None);
        assert_eq!(normalize_slug("חוף"), None);
    }
}
