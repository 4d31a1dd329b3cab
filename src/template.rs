use once_cell::sync::Lazy;
use regex::Regex;

use crate::citation::Citation;

/// Makes a value safe to embed in template text. The pipe and brace
/// characters are structural, so they become HTML entities; every run of
/// whitespace (including the non-breaking and zero-width kinds pages love to
/// hide in copy) collapses to a single ASCII space.
pub fn esc(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        // U+FEFF is not Unicode whitespace but behaves like it in page text.
        if ch.is_whitespace() || ch == '\u{feff}' {
            if !prev_space {
                out.push(' ');
            }
            prev_space = true;
            continue;
        }
        prev_space = false;
        match ch {
            '|' => out.push_str("&#124;"),
            '{' => out.push_str("&#123;"),
            '}' => out.push_str("&#125;"),
            _ => out.push(ch),
        }
    }
    out
}

/// `accessDate` -> `access-date`, `archiveURL` -> `archive-url`. A run of
/// capitals keeps one hyphen; snake_case and existing kebab-case pass through.
pub fn kebabize(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len() + 4);
    for (i, &ch) in chars.iter().enumerate() {
        if !ch.is_ascii_uppercase() {
            out.push(ch);
            continue;
        }
        let prev_upper = i > 0 && chars[i - 1].is_ascii_uppercase();
        let next_lower = chars.get(i + 1).is_some_and(|c| c.is_ascii_lowercase());
        if i > 0 && (!prev_upper || next_lower) {
            out.push('-');
        }
        out.push(ch.to_ascii_lowercase());
    }
    out
}

/// Inverse of [`kebabize`] for well-formed kebab keys: drops each hyphen and
/// upper-cases the character after it.
pub fn camelize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '-' && chars.peek().is_some() {
            if let Some(next) = chars.next() {
                out.extend(next.to_uppercase());
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// Renders a record as template text. Compact output is a single line;
/// pretty output puts each parameter on its own indented line, the way the
/// template is usually hand-edited. Keys go out in kebab-case, values
/// escaped; tombstoned fields are omitted entirely.
pub fn generate(citation: &Citation, ident: &str, pretty: bool) -> String {
    let mut out = String::from("{{");
    out.push_str(ident);
    for (key, value) in citation.entries() {
        if pretty {
            out.push_str("\n  |");
        } else {
            out.push('|');
        }
        out.push_str(&kebabize(key));
        out.push('=');
        out.push_str(&esc(value));
    }
    if pretty {
        out.push('\n');
    }
    out.push_str("}}");
    out
}

/// Parses template text back into a record. Scans for `|key=value` pairs in
/// either layout; the value runs to the next pipe, newline, or closing
/// braces and is trimmed, then passed through [`esc`] so a hand-typed raw
/// value ends up as safe as a generated one. Keys camel-case on the way in.
/// Unknown keys are kept; there is nothing to reject at this layer.
pub fn parse(text: &str) -> Citation {
    static PARAM_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\|\s*([A-Za-z][A-Za-z0-9_-]*)\s*=([^|{}\n]*)").unwrap());

    let mut citation = Citation::new();
    for cap in PARAM_RE.captures_iter(text) {
        let key = camelize(cap[1].trim());
        let value = esc(cap[2].trim());
        citation.set(&key, value);
    }
    citation
}
