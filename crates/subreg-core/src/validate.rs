//! Subdomain sanitization and validation
//!
//! Normalizes raw subdomain input before it reaches the registry store.
//! The store trusts its callers to have run these; it does not re-validate.

/// Maximum length of a DNS label per RFC 1123
pub const MAX_LABEL_LEN: usize = 63;

/// Normalize raw subdomain input
///
/// Lowercases, strips every character outside `[a-z0-9-]`, strips leading and
/// trailing hyphens, and truncates to 63 characters. The result may still be
/// empty or invalid; callers must follow up with [`is_valid`].
pub fn sanitize(raw: &str) -> String {
    let cleaned: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect();

    let mut label: String = cleaned.trim_matches('-').to_string();
    label.truncate(MAX_LABEL_LEN);
    label
}

/// True iff the label is a valid RFC 1123 DNS label
///
/// Length 1-63, alphanumeric start and end, hyphens only interior.
pub fn is_valid(label: &str) -> bool {
    if label.is_empty() || label.len() > MAX_LABEL_LEN {
        return false;
    }
    if !label
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return false;
    }
    !label.starts_with('-') && !label.ends_with('-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_lowercases_and_strips() {
        assert_eq!(sanitize("My.Shop!"), "myshop");
        assert_eq!(sanitize("  shop_01 "), "shop01");
        assert_eq!(sanitize("shop-01"), "shop-01");
    }

    #[test]
    fn sanitize_trims_hyphens_and_truncates() {
        assert_eq!(sanitize("--shop--"), "shop");
        assert_eq!(sanitize("-"), "");

        let long = "a".repeat(100);
        assert_eq!(sanitize(&long).len(), MAX_LABEL_LEN);
    }

    #[test]
    fn valid_labels() {
        assert!(is_valid("shop"));
        assert!(is_valid("shop-01"));
        assert!(is_valid("a"));
        assert!(is_valid("0shop"));
        assert!(is_valid(&"a".repeat(63)));
    }

    #[test]
    fn invalid_labels() {
        assert!(!is_valid(""));
        assert!(!is_valid("-shop"));
        assert!(!is_valid("shop-"));
        assert!(!is_valid("Sh0p"));
        assert!(!is_valid("sh.op"));
        assert!(!is_valid(&"a".repeat(64)));
    }
}
