use once_cell::sync::Lazy;
use regex::Regex;

use crate::metadata::Author;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePair {
    pub first: String,
    pub last: String,
}

/// Terms that mark a byline as something other than a person. The site name
/// being cited joins this list word by word, so "Stuff reporters" never
/// becomes an author on a Stuff article.
const SUSPICIOUS: &[&str] = &[
    "writer",
    "staff",
    "journalist",
    "reporter",
    "http",
    "national",
    "library",
];

const HONORIFICS: &[&str] = &[
    "mr", "mrs", "ms", "miss", "mx", "dr", "prof", "professor", "sir", "dame", "rev", "hon",
];

const SUFFIXES: &[&str] = &["jr", "sr", "ii", "iii", "iv", "phd", "md", "esq"];

/// Turns a scraped author field into up to two (first, last) pairs. Garbage
/// in means nothing out; a wrong split on genuinely ambiguous input is
/// accepted rather than guessed around.
pub fn split_author_field(author: &Author, context: &str) -> Vec<NamePair> {
    let candidates: Vec<String> = match author {
        // Two or more entries arrive pre-split; anything beyond the second
        // author has no slot in the template.
        Author::Multiple(list) if list.len() >= 2 => {
            list.iter().take(2).map(|s| strip_asides(s)).collect()
        }
        Author::Multiple(list) => list.first().map(|s| split_single(s)).unwrap_or_default(),
        Author::Single(s) => split_single(s),
    };
    let suspicion = suspicion_list(context);
    candidates
        .iter()
        .filter(|c| is_likely_name(c, &suspicion))
        .filter_map(|c| parse_full_name(c))
        .collect()
}

/// Splits a one-string byline on the usual joiners. At most two segments
/// survive; role annotations in parentheses or brackets go first.
fn split_single(raw: &str) -> Vec<String> {
    static SEP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r" and |&|,|;|\|| via ").unwrap());
    let cleaned = strip_asides(raw);
    SEP_RE
        .split(&cleaned)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(2)
        .map(String::from)
        .collect()
}

fn strip_asides(raw: &str) -> String {
    static ASIDE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([^)]*\)|\[[^\]]*\]").unwrap());
    ASIDE_RE.replace_all(raw, " ").trim().to_string()
}

fn suspicion_list(context: &str) -> Vec<String> {
    let mut words: Vec<String> = SUSPICIOUS.iter().map(|s| s.to_string()).collect();
    words.extend(
        context
            .split_whitespace()
            .map(|w| {
                w.trim_matches(|c: char| !c.is_alphanumeric())
                    .to_lowercase()
            })
            .filter(|w| !w.is_empty()),
    );
    words
}

fn is_likely_name(candidate: &str, suspicion: &[String]) -> bool {
    let lower = candidate.to_lowercase();
    !suspicion.iter().any(|word| lower.contains(word.as_str()))
}

/// Decomposes one candidate into (first, last). Handles "Last, First",
/// leading honorifics, and trailing suffixes; everything between the first
/// and last token counts as middle names and rides along with the first.
/// Single tokens and empty or quote-only strings yield nothing.
fn parse_full_name(raw: &str) -> Option<NamePair> {
    let cleaned = raw.trim_matches(|c: char| c == '"' || c == '\'' || c.is_whitespace());
    if cleaned.is_empty() {
        return None;
    }

    if let Some((last, first)) = cleaned.split_once(',') {
        let first = first.trim();
        let last = last.trim();
        if first.is_empty() || last.is_empty() {
            return None;
        }
        return Some(NamePair {
            first: first.to_string(),
            last: last.to_string(),
        });
    }

    let mut tokens: Vec<&str> = cleaned.split_whitespace().collect();
    if tokens.len() >= 2 && word_in(tokens[0], HONORIFICS) {
        tokens.remove(0);
    }
    while tokens.len() >= 2 && word_in(tokens[tokens.len() - 1], SUFFIXES) {
        tokens.pop();
    }
    if tokens.len() < 2 {
        return None;
    }
    let last = tokens.pop()?.to_string();
    let first = tokens.join(" ");
    if first.is_empty() || last.is_empty() {
        return None;
    }
    Some(NamePair { first, last })
}

fn word_in(token: &str, table: &[&str]) -> bool {
    let t = token.trim_end_matches('.').to_lowercase();
    table.contains(&t.as_str())
}
