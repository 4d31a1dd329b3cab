use serde_json::Value;

/// One byline string, or a list that already arrived split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Author {
    Single(String),
    Multiple(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlAccess {
    Subscription,
    Registration,
    Limited,
    Free,
}

impl UrlAccess {
    pub fn as_str(self) -> &'static str {
        match self {
            UrlAccess::Subscription => "subscription",
            UrlAccess::Registration => "registration",
            UrlAccess::Limited => "limited",
            UrlAccess::Free => "free",
        }
    }

    fn from_str(s: &str) -> Option<Self> {
        match s {
            "subscription" => Some(UrlAccess::Subscription),
            "registration" => Some(UrlAccess::Registration),
            "limited" => Some(UrlAccess::Limited),
            "free" => Some(UrlAccess::Free),
            _ => None,
        }
    }
}

/// What sort of work the page describes. Absent means a plain web page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    News,
    Journal,
    Book,
}

impl Kind {
    fn from_str(s: &str) -> Option<Self> {
        match s {
            "news" => Some(Kind::News),
            "journal" => Some(Kind::Journal),
            "book" => Some(Kind::Book),
            _ => None,
        }
    }
}

/// The normalized scrape result. Every field is optional; `None` always
/// means unknown, never a placeholder value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaData {
    pub title: Option<String>,
    pub provider: Option<String>,
    pub author: Option<Author>,
    pub language: Option<String>,
    pub published: Option<String>,
    pub year: Option<String>,
    pub journal: Option<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub isbn: Option<String>,
    pub issn: Option<String>,
    pub doi: Option<String>,
    pub pmid: Option<String>,
    pub publisher: Option<String>,
    pub location: Option<String>,
    pub page_number: Option<String>,
    pub pages: Option<String>,
    pub url_access: Option<UrlAccess>,
    pub via: Option<String>,
    pub kind: Option<Kind>,
    pub url: Option<String>,
}

impl MetaData {
    pub fn is_empty(&self) -> bool {
        *self == MetaData::default()
    }

    /// Right-biased field merge: wherever the overlay knows something, it
    /// wins; the base fills in the rest.
    pub fn merge(base: MetaData, overlay: MetaData) -> MetaData {
        MetaData {
            title: overlay.title.or(base.title),
            provider: overlay.provider.or(base.provider),
            author: overlay.author.or(base.author),
            language: overlay.language.or(base.language),
            published: overlay.published.or(base.published),
            year: overlay.year.or(base.year),
            journal: overlay.journal.or(base.journal),
            volume: overlay.volume.or(base.volume),
            issue: overlay.issue.or(base.issue),
            isbn: overlay.isbn.or(base.isbn),
            issn: overlay.issn.or(base.issn),
            doi: overlay.doi.or(base.doi),
            pmid: overlay.pmid.or(base.pmid),
            publisher: overlay.publisher.or(base.publisher),
            location: overlay.location.or(base.location),
            page_number: overlay.page_number.or(base.page_number),
            pages: overlay.pages.or(base.pages),
            url_access: overlay.url_access.or(base.url_access),
            via: overlay.via.or(base.via),
            kind: overlay.kind.or(base.kind),
            url: overlay.url.or(base.url),
        }
    }

    /// Reads a record handed over as plain JSON (the shape the page-scraping
    /// side produces). Unknown keys are ignored, wrong-typed values dropped.
    pub fn from_json(value: &Value) -> MetaData {
        let mut md = MetaData::default();
        let Some(obj) = value.as_object() else {
            return md;
        };
        md.title = string_like(obj.get("title"));
        md.provider = string_like(obj.get("provider"));
        md.author = obj.get("author").and_then(author_from_json);
        md.language = string_like(obj.get("language"));
        md.published = string_like(obj.get("published"));
        md.year = string_like(obj.get("year"));
        md.journal = string_like(obj.get("journal"));
        md.volume = string_like(obj.get("volume"));
        md.issue = string_like(obj.get("issue"));
        md.isbn = string_like(obj.get("isbn"));
        md.issn = string_like(obj.get("issn"));
        md.doi = string_like(obj.get("doi"));
        md.pmid = string_like(obj.get("pmid"));
        md.publisher = string_like(obj.get("publisher"));
        md.location = string_like(obj.get("location"));
        md.page_number = string_like(obj.get("pageNumber"));
        md.pages = string_like(obj.get("pages"));
        md.url_access = string_like(obj.get("urlAccess")).and_then(|s| UrlAccess::from_str(&s));
        md.via = string_like(obj.get("via"));
        md.kind = string_like(obj.get("type")).and_then(|s| Kind::from_str(&s));
        md.url = string_like(obj.get("url"));
        md
    }
}

/// Strings stay strings; numbers become their decimal form (years and
/// volumes are often bare numbers in scraped JSON). Everything else is None.
pub fn string_like(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn author_from_json(value: &Value) -> Option<Author> {
    match value {
        Value::String(s) => Some(Author::Single(s.clone())),
        Value::Array(items) => {
            let names: Vec<String> = items
                .iter()
                .filter_map(|v| string_like(Some(v)))
                .collect();
            if names.is_empty() {
                None
            } else {
                Some(Author::Multiple(names))
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_is_right_biased_per_field() {
        let base = MetaData {
            title: Some("Base".to_string()),
            provider: Some("Base Provider".to_string()),
            ..MetaData::default()
        };
        let overlay = MetaData {
            title: Some("Overlay".to_string()),
            url: Some("https://example.org".to_string()),
            ..MetaData::default()
        };
        let merged = MetaData::merge(base, overlay);
        assert_eq!(merged.title.as_deref(), Some("Overlay"));
        assert_eq!(merged.provider.as_deref(), Some("Base Provider"));
        assert_eq!(merged.url.as_deref(), Some("https://example.org"));
    }

    #[test]
    fn merge_with_empty_is_identity_both_ways() {
        let md = MetaData {
            title: Some("T".to_string()),
            kind: Some(Kind::News),
            ..MetaData::default()
        };
        assert_eq!(MetaData::merge(MetaData::default(), md.clone()), md);
        assert_eq!(MetaData::merge(md.clone(), MetaData::default()), md);
    }

    #[test]
    fn from_json_reads_the_record_shape() {
        let md = MetaData::from_json(&json!({
            "title": "A Story",
            "provider": "The Paper",
            "author": ["Jane Doe", "John Roe"],
            "pageNumber": "4",
            "urlAccess": "subscription",
            "type": "news",
            "year": 1998
        }));
        assert_eq!(md.title.as_deref(), Some("A Story"));
        assert_eq!(
            md.author,
            Some(Author::Multiple(vec![
                "Jane Doe".to_string(),
                "John Roe".to_string()
            ]))
        );
        assert_eq!(md.page_number.as_deref(), Some("4"));
        assert_eq!(md.url_access, Some(UrlAccess::Subscription));
        assert_eq!(md.kind, Some(Kind::News));
        assert_eq!(md.year.as_deref(), Some("1998"));
    }

    #[test]
    fn from_json_tolerates_junk() {
        assert!(MetaData::from_json(&json!("just a string")).is_empty());
        assert!(MetaData::from_json(&json!(null)).is_empty());
        let md = MetaData::from_json(&json!({
            "title": 42.5,
            "author": {"unexpected": "shape"},
            "type": "sonnet"
        }));
        assert_eq!(md.title.as_deref(), Some("42.5"));
        assert_eq!(md.author, None);
        assert_eq!(md.kind, None);
    }
}
