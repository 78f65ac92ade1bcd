//! Deterministic slug derivation for post URLs.
//!
//! Titles arrive in Portuguese with diacritics and punctuation; the `slug`
//! crate handles lowercasing, diacritic stripping, and hyphen collapsing.
//! Derivation is total: a titleless post gets a fixed fallback slug.
//! Uniqueness is not checked here; the store's constraints (when configured)
//! are the only arbiter.

use slug::slugify;

/// Slug used when the source title is empty or unrepresentable.
pub const FALLBACK_SLUG: &str = "post-sem-titulo";

/// Derive the URL slug for a human title.
pub fn slug_for_title(title: &str) -> String {
    let candidate = slugify(title);
    if candidate.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_diacritics_and_punctuation() {
        assert_eq!(slug_for_title("Café Canastra!"), "cafe-canastra");
    }

    #[test]
    fn collapses_whitespace_runs_into_single_hyphens() {
        assert_eq!(
            slug_for_title("Métodos de preparo:   coado & prensa"),
            "metodos-de-preparo-coado-prensa"
        );
    }

    #[test]
    fn empty_title_falls_back() {
        assert_eq!(slug_for_title(""), FALLBACK_SLUG);
        assert_eq!(slug_for_title("   "), FALLBACK_SLUG);
        assert_eq!(slug_for_title("!!!"), FALLBACK_SLUG);
    }

    #[test]
    fn derivation_is_repeatable() {
        let first = slug_for_title("Torra média, doçura alta");
        let second = slug_for_title("Torra média, doçura alta");
        assert_eq!(first, second);
    }
}
