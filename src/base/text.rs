//! Character classes for tag names and identifiers.

/// Check if a character can continue an identifier.
///
/// Uses Unicode Standard Annex #31 rules, plus `$`.
#[inline]
pub fn is_ident_continue(c: char) -> bool {
    unicode_ident::is_xid_continue(c) || c == '$'
}

/// Check if a character can appear in a section tag name.
///
/// User tags may use dashes and dots (`{#my-tag}`, `{#ui.button}`).
#[inline]
pub fn is_tag_name_char(c: char) -> bool {
    is_ident_continue(c) || c == '-' || c == '.' || c == ':'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_continue() {
        assert!("_count1".chars().all(is_ident_continue));
        assert!("über$".chars().all(is_ident_continue));
        assert!(!is_ident_continue('.'));
    }

    #[test]
    fn test_tag_name_chars() {
        assert!("my-tag".chars().all(is_tag_name_char));
        assert!(!"if}".chars().all(is_tag_name_char));
    }
}
