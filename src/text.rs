//! Text normalization for accent-insensitive search.

use unicode_normalization::UnicodeNormalization;

/// Strips diacritics from a string: NFD decomposition with combining marks
/// removed, plus the đ/Đ pair which does not decompose.
pub fn remove_accents(input: &str) -> String {
    input
        .nfd()
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .map(|c| match c {
            'đ' => 'd',
            'Đ' => 'D',
            other => other,
        })
        .collect()
}

/// Case- and accent-insensitive form used for substring matching.
pub fn search_key(input: &str) -> String {
    remove_accents(input).to_lowercase()
}

/// True when `haystack` contains `needle`, ignoring case and accents.
/// An empty needle matches everything.
pub fn matches_search(haystack: &str, needle: &str) -> bool {
    search_key(haystack).contains(&search_key(needle))
}
