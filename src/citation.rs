/// Every parameter a wiki citation template understands, camel-cased. Used
/// for advisory warnings only; the codec stores whatever keys it is given.
pub const KNOWN_PARAMS: &[&str] = &[
    "url",
    "title",
    "urlAccess",
    "work",
    "author",
    "last",
    "first",
    "date",
    "accessDate",
    "language",
    "archiveUrl",
    "archiveDate",
    "website",
    "authorLink",
    "last1",
    "first1",
    "last2",
    "first2",
    "authorLink2",
    "year",
    "origDate",
    "editorLast",
    "editorFirst",
    "editorLink",
    "editor2Last",
    "editor2First",
    "editor2Link",
    "department",
    "series",
    "publisher",
    "publicationPlace",
    "agency",
    "location",
    "volume",
    "issue",
    "journal",
    "page",
    "pages",
    "at",
    "scriptTitle",
    "transTitle",
    "type",
    "format",
    "arxiv",
    "asin",
    "bibcode",
    "doi",
    "doiBrokenDate",
    "isbn",
    "issn",
    "jfm",
    "jstor",
    "lccn",
    "mr",
    "oclc",
    "ol",
    "osti",
    "pmc",
    "pmid",
    "rfc",
    "ssrn",
    "zbl",
    "id",
    "urlStatus",
    "via",
    "quote",
    "ref",
    "postscript",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Set(String),
    /// Tombstone left by a replace-mode merge. Serialization skips it.
    Removed,
}

/// A citation record: camel-cased parameter names to values, in insertion
/// order. Overwriting keeps the original position so merged records stay
/// readable next to their sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Citation {
    fields: Vec<(String, FieldValue)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Overlay wins; base-only keys survive untouched.
    Keep,
    /// Overlay wins; base-only keys are marked removed.
    Replace,
}

impl Citation {
    pub fn new() -> Self {
        Citation::default()
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.put(key, FieldValue::Set(value.into()));
    }

    fn put(&mut self, key: &str, value: FieldValue) {
        if let Some(slot) = self.fields.iter_mut().find(|(k, _)| k == key) {
            slot.1 = value;
        } else {
            self.fields.push((key.to_string(), value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.iter().find_map(|(k, v)| match v {
            FieldValue::Set(s) if k == key => Some(s.as_str()),
            _ => None,
        })
    }

    /// True when the key holds any entry at all, a tombstone included;
    /// `contains` without `get` is how a removal is told apart from never-set.
    pub fn contains(&self, key: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == key)
    }

    /// Only the live entries, in record order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().filter_map(|(k, v)| match v {
            FieldValue::Set(s) => Some((k.as_str(), s.as_str())),
            FieldValue::Removed => None,
        })
    }
}

/// Field-wise merge of two records. Overlay entries always win and keep the
/// base's position when they overwrite; keys new to the overlay append in the
/// overlay's order. `Replace` additionally tombstones base keys the overlay
/// no longer carries, so a caller persisting the result can tell deliberate
/// removal apart from never-set.
pub fn merge(base: &Citation, overlay: &Citation, mode: MergeMode) -> Citation {
    let mut out = base.clone();
    if mode == MergeMode::Replace {
        for (key, value) in &mut out.fields {
            if !overlay.contains(key) {
                *value = FieldValue::Removed;
            }
        }
    }
    for (key, value) in &overlay.fields {
        out.put(key, value.clone());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> Citation {
        let mut c = Citation::new();
        for (k, v) in pairs {
            c.set(k, *v);
        }
        c
    }

    #[test]
    fn set_overwrites_in_place() {
        let mut c = record(&[("title", "Old"), ("url", "https://example.org")]);
        c.set("title", "New");
        let keys: Vec<&str> = c.entries().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["title", "url"]);
        assert_eq!(c.get("title"), Some("New"));
    }

    #[test]
    fn keep_merge_preserves_base_only_keys() {
        let base = record(&[("a", "1"), ("b", "2")]);
        let overlay = record(&[("a", "3"), ("c", "4")]);
        let merged = merge(&base, &overlay, MergeMode::Keep);
        assert_eq!(merged.get("a"), Some("3"));
        assert_eq!(merged.get("b"), Some("2"));
        assert_eq!(merged.get("c"), Some("4"));
        let keys: Vec<&str> = merged.entries().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn replace_merge_tombstones_dropped_keys() {
        let base = record(&[("a", "1"), ("b", "2")]);
        let overlay = record(&[("a", "3")]);
        let merged = merge(&base, &overlay, MergeMode::Replace);
        assert_eq!(merged.get("a"), Some("3"));
        // b holds a tombstone: present, but no longer readable.
        assert_eq!(merged.get("b"), None);
        assert!(merged.contains("b"));
        assert!(!merged.contains("c"));
    }

    #[test]
    fn tombstones_do_not_reach_live_iteration() {
        let base = record(&[("a", "1"), ("b", "2")]);
        let merged = merge(&base, &record(&[]), MergeMode::Replace);
        assert_eq!(merged.entries().count(), 0);
        assert!(merged.contains("a") && merged.contains("b"));
    }

    #[test]
    fn known_params_cover_the_assembled_fields() {
        for key in [
            "first1", "last1", "first2", "last2", "publicationPlace", "urlAccess", "accessDate",
            "archiveUrl", "archiveDate",
        ] {
            assert!(KNOWN_PARAMS.contains(&key), "missing {key}");
        }
    }
}
