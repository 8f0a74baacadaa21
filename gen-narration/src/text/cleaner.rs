//! Text cleaning for synthesis and the minimum-length chapter filter.

use once_cell::sync::Lazy;
use regex::Regex;

/// Chapters whose trimmed content is this many characters or fewer are dropped.
pub const MIN_CHAPTER_CHARS: usize = 100;

/// Typographic characters mapped to the plain forms the provider accepts.
const TYPOGRAPHIC_CHARS: &[(char, &str)] = &[
    ('\u{2018}', "'"),   // Left single quote
    ('\u{2019}', "'"),   // Right single quote
    ('\u{201c}', "\""),  // Left double quote
    ('\u{201d}', "\""),  // Right double quote
    ('\u{2013}', "-"),   // En dash
    ('\u{2014}', "-"),   // Em dash
    ('\u{2026}', "..."), // Ellipsis
    ('\u{00a0}', " "),   // Non-breaking space
    ('\u{2011}', "-"),   // Non-breaking hyphen
    ('\u{2012}', "-"),   // Figure dash
    ('\u{2015}', "-"),   // Horizontal bar
    ('\u{2032}', "'"),   // Prime (feet)
    ('\u{2033}', "\""),  // Double prime (inches)
    ('\u{00ab}', "\""),  // Left-pointing double angle quote
    ('\u{00bb}', "\""),  // Right-pointing double angle quote
];

/// Anything that is not a word character, whitespace, or safe punctuation.
static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[^\w\s.,!?;:'"()\-]"#).expect("valid unsafe-char regex"));

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Prepare text for the synthesis provider.
///
/// Typographic quotes and dashes are first folded to ASCII so they survive,
/// then every character outside word characters, whitespace and
/// `.,!?;:'"()-` is removed and whitespace runs collapse to single spaces.
/// An empty result means there is nothing left to narrate.
pub fn sanitize_for_synthesis(text: &str) -> String {
    let folded = fold_typographic(text);
    let stripped = UNSAFE_CHARS.replace_all(&folded, "");
    WHITESPACE_RUN.replace_all(&stripped, " ").trim().to_string()
}

fn fold_typographic(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for c in text.chars() {
        match TYPOGRAPHIC_CHARS.iter().find(|(ch, _)| *ch == c) {
            Some((_, replacement)) => result.push_str(replacement),
            None => result.push(c),
        }
    }

    result
}

/// Whether a chapter has enough content to be worth narrating.
pub fn is_substantial(content: &str, min_chars: usize) -> bool {
    content.trim().chars().count() > min_chars
}
