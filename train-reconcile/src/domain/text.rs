//! Text normalization for comparing labels across datasets.
//!
//! The two feeds spell the same thing differently: diacritics come and go,
//! case differs, and station names use several abbreviations for the same
//! station type. Everything here folds those differences away.

use std::collections::BTreeSet;
use std::ops::RangeInclusive;
use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Shortest route code token considered.
pub const MIN_ROUTE_CODE_LEN: usize = 2;

/// Longest route code token considered.
pub const MAX_ROUTE_CODE_LEN: usize = 8;

/// Station-type spellings collapsed to "hl.n.", applied in order.
static MAIN_STATION_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\bhlavni\s+nadrazi\b",
        r"\bhlavni\s+n\.\b",
        r"hl\.\s*n\.",
        r"\bhl\.n\b",
        r"hl\.n\.+",
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).expect("valid station-type regex"))
    .collect()
});

const MAIN_STATION: &str = "hl.n.";

/// Strip diacritics and lowercase.
///
/// # Examples
///
/// ```
/// use train_reconcile::domain::fold_text;
///
/// assert_eq!(fold_text("  Plzeň Jižní Předměstí "), "plzen jizni predmesti");
/// assert_eq!(fold_text("Os"), "os");
/// ```
pub fn fold_text(text: &str) -> String {
    strip_diacritics(text).to_lowercase().trim().to_string()
}

fn strip_diacritics(text: &str) -> String {
    text.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Canonical form of a station name for cross-feed comparison.
///
/// Folds diacritics and case, treats `-` and `,` as spaces, collapses the
/// many spellings of "main station" to `hl.n.`, and squeezes whitespace.
///
/// # Examples
///
/// ```
/// use train_reconcile::domain::normalize_stop_name;
///
/// assert_eq!(normalize_stop_name("Plzeň hlavní nádraží"), "plzen hl.n.");
/// assert_eq!(normalize_stop_name("Plzeň hl. n."), "plzen hl.n.");
/// assert_eq!(normalize_stop_name("Praha-Smíchov"), "praha smichov");
/// ```
pub fn normalize_stop_name(name: &str) -> String {
    let mut text = strip_diacritics(name)
        .to_lowercase()
        .replace(['-', ','], " ");
    for rule in MAIN_STATION_RULES.iter() {
        text = rule.replace_all(&text, MAIN_STATION).into_owned();
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether a folded token looks like a line code ("p13", "s70", "xp20").
///
/// Tokens must be 2-8 ASCII letters/digits with at least one of each, so
/// plain words ("plzen") and bare numbers ("13") are rejected.
pub fn is_route_code_token(token: &str) -> bool {
    is_route_code_token_within(token, MIN_ROUTE_CODE_LEN..=MAX_ROUTE_CODE_LEN)
}

/// [`is_route_code_token`] with caller-chosen length bounds.
pub fn is_route_code_token_within(token: &str, len: RangeInclusive<usize>) -> bool {
    if !len.contains(&token.len()) {
        return false;
    }
    if !token
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
    {
        return false;
    }
    let has_alpha = token.bytes().any(|b| b.is_ascii_lowercase());
    let has_digit = token.bytes().any(|b| b.is_ascii_digit());
    has_alpha && has_digit
}

/// Extract the set of route code tokens from a free-text label.
///
/// The label is folded, then split on every character that is not an ASCII
/// lowercase letter or digit. Only whole tokens are kept, so "XP20" yields
/// `xp20` and never `p20` or `p2`.
///
/// # Examples
///
/// ```
/// use train_reconcile::domain::route_codes;
///
/// let codes = route_codes("P2/S70 Plzeň - Rokycany");
/// assert!(codes.contains("p2"));
/// assert!(codes.contains("s70"));
/// assert_eq!(codes.len(), 2);
/// ```
pub fn route_codes(label: &str) -> BTreeSet<String> {
    route_codes_within(label, MIN_ROUTE_CODE_LEN..=MAX_ROUTE_CODE_LEN)
}

/// [`route_codes`] with caller-chosen token length bounds.
pub fn route_codes_within(label: &str, len: RangeInclusive<usize>) -> BTreeSet<String> {
    fold_text(label)
        .split(|c: char| !(c.is_ascii_lowercase() || c.is_ascii_digit()))
        .filter(|token| is_route_code_token_within(token, len.clone()))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_strips_czech_diacritics() {
        assert_eq!(fold_text("ŘÍČANY"), "ricany");
        assert_eq!(fold_text("Ústí nad Labem"), "usti nad labem");
        assert_eq!(fold_text(""), "");
    }

    #[test]
    fn stop_name_main_station_variants() {
        for variant in [
            "Plzeň hlavní nádraží",
            "Plzeň hl. n.",
            "Plzeň hl.n.",
            "Plzeň hl.n",
            "Plzeň hl.n..",
            "PLZEŇ HL.  N.",
        ] {
            assert_eq!(normalize_stop_name(variant), "plzen hl.n.", "{variant}");
        }
    }

    #[test]
    fn stop_name_separators_and_whitespace() {
        assert_eq!(normalize_stop_name("Brno-Královo Pole"), "brno kralovo pole");
        assert_eq!(normalize_stop_name("Lysá n.L., zastávka"), "lysa n.l. zastavka");
        assert_eq!(normalize_stop_name("  Beroun   "), "beroun");
        assert_eq!(normalize_stop_name(""), "");
    }

    #[test]
    fn route_code_token_rules() {
        assert!(is_route_code_token("p13"));
        assert!(is_route_code_token("s7"));
        assert!(is_route_code_token("ab12cd34"));
        assert!(!is_route_code_token("p"));
        assert!(!is_route_code_token("ab12cd345"));
        assert!(!is_route_code_token("plzen"));
        assert!(!is_route_code_token("1234"));
        assert!(!is_route_code_token("P13"));
    }

    #[test]
    fn route_codes_whole_tokens_only() {
        let codes = route_codes("XP20 Plzen - Cheb");
        assert!(codes.contains("xp20"));
        assert!(!codes.contains("p20"));
        assert!(!codes.contains("p2"));
    }

    #[test]
    fn route_codes_ignores_plain_words_and_numbers() {
        assert!(route_codes("Os 7806").is_empty());
        assert!(route_codes("Plzeň - Radnice").is_empty());
        assert!(route_codes("").is_empty());
    }

    #[test]
    fn route_codes_with_narrower_bounds() {
        let codes = route_codes_within("S7 P13 XP20", 3..=3);
        assert_eq!(codes.into_iter().collect::<Vec<_>>(), ["p13"]);
        assert!(!is_route_code_token_within("s7", 3..=8));
        assert!(is_route_code_token_within("ab12cd345", 2..=9));
    }

    #[test]
    fn route_codes_folds_case_and_diacritics() {
        let codes = route_codes("Š5 / r12");
        assert!(codes.contains("s5"));
        assert!(codes.contains("r12"));
    }
}
