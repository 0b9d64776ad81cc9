//! Text folding shared by blog slugs, place-icon matching and location lookup.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

static NON_ALNUM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Lowercase and strip diacritics: "Béjaïa" -> "bejaia", "Œuvre" -> "oeuvre".
pub fn fold(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(|c| match c {
            'œ' | 'Œ' => "oe".chars().collect::<Vec<_>>(),
            'æ' | 'Æ' => "ae".chars().collect(),
            'ß' => "ss".chars().collect(),
            other => other.to_lowercase().collect(),
        })
        .collect()
}

/// URL-safe slug: folded, runs of anything else collapsed to a single `-`.
pub fn slugify(text: &str) -> String {
    NON_ALNUM
        .replace_all(&fold(text), "-")
        .trim_matches('-')
        .to_string()
}
