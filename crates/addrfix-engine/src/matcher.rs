//! Text normalization and option matching.

use crate::page::SelectOption;

/// Trims, collapses internal whitespace runs to one space, and lowercases.
///
/// Idempotent: `normalize(&normalize(x)) == normalize(x)`.
#[must_use]
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Index of the first option whose normalized text equals the normalized
/// `label`. A blank label matches nothing.
#[must_use]
pub fn find_match(options: &[SelectOption], label: &str) -> Option<usize> {
    let wanted = normalize(label);
    if wanted.is_empty() {
        return None;
    }
    options
        .iter()
        .position(|option| normalize(&option.text) == wanted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(texts: &[&str]) -> Vec<SelectOption> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| SelectOption::new(*text, format!("string:{i}")))
            .collect()
    }

    #[test]
    fn normalize_trims_collapses_and_lowercases() {
        assert_eq!(normalize("  Calle  10 "), normalize("calle 10"));
        assert_eq!(normalize("  Calle  10 "), "calle 10");
        assert_eq!(normalize("A\t\nB"), "a b");
    }

    #[test]
    fn normalize_is_idempotent() {
        for text in ["", "  ", " Av.  Siempre   Viva 742 ", "ÁRBOL  Grande", "x"] {
            let once = normalize(text);
            assert_eq!(normalize(&once), once, "not idempotent for {text:?}");
        }
    }

    #[test]
    fn find_match_ignores_spacing_and_case() {
        let opts = options(&["", "Calle 10", " av.  siempre viva   742 "]);
        assert_eq!(find_match(&opts, "Av. Siempre Viva 742"), Some(2));
    }

    #[test]
    fn find_match_prefers_first_occurrence() {
        let opts = options(&["Calle 10", "calle  10", "CALLE 10"]);
        assert_eq!(find_match(&opts, "calle 10"), Some(0));
    }

    #[test]
    fn find_match_requires_full_equality() {
        let opts = options(&["Calle 10 Norte", "Calle 1"]);
        assert_eq!(find_match(&opts, "Calle 10"), None);
    }

    #[test]
    fn find_match_blank_label_never_matches_blank_option() {
        let opts = options(&["", "Calle 10"]);
        assert_eq!(find_match(&opts, "   "), None);
    }

    #[test]
    fn find_match_empty_options() {
        assert_eq!(find_match(&[], "Calle 10"), None);
    }
}
