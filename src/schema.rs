use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::date;
use crate::metadata::{Author, Kind, MetaData, UrlAccess, string_like};

/// The structured-data types we know how to read. Everything else is
/// `Ignored`, a real variant so dispatch stays a closed match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    WebPage,
    ScholarlyArticle,
    NewsArticle,
    Book,
    Ignored,
}

pub fn classify(node: &Value) -> NodeKind {
    // Array-valued @type never matches; those nodes only survive as
    // wrappers around something more specific.
    match node.get("@type").and_then(Value::as_str) {
        Some("WebPage") => NodeKind::WebPage,
        Some("ScholarlyArticle") => NodeKind::ScholarlyArticle,
        Some("NewsArticle") => NodeKind::NewsArticle,
        Some("Book") => NodeKind::Book,
        _ => NodeKind::Ignored,
    }
}

/// Pulls every candidate node out of a structured-data document, in document
/// order. Understands the wrapping conventions pages actually use: arrays of
/// nodes, `@graph` containers, `DataFeed` feeds, and `workExample` /
/// `mainEntity` nesting where the wrapper and the nested detail both count.
/// A missing or wrong-typed container yields no candidates from that branch.
pub fn flatten(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().flat_map(flatten).collect(),
        Value::Object(obj) => {
            if let Some(graph) = obj.get("@graph") {
                return flatten(graph);
            }
            if obj.get("@type").and_then(Value::as_str) == Some("DataFeed") {
                return obj.get("dataFeedElement").map(flatten).unwrap_or_default();
            }
            if let Some(sub) = obj.get("workExample").or_else(|| obj.get("mainEntity")) {
                let mut out = vec![value];
                out.extend(flatten(sub));
                return out;
            }
            if classify(value) != NodeKind::Ignored {
                vec![value]
            } else {
                Vec::new()
            }
        }
        _ => Vec::new(),
    }
}

/// Maps one candidate node to the common record shape plus its
/// type-specific overlay.
pub fn map_node(node: &Value) -> MetaData {
    let mut md = common_features(node);
    match classify(node) {
        NodeKind::ScholarlyArticle => scholarly(node, &mut md),
        NodeKind::NewsArticle => md.kind = Some(Kind::News),
        NodeKind::Book => book(node, &mut md),
        NodeKind::WebPage => {}
        NodeKind::Ignored => return MetaData::default(),
    }
    md
}

fn common_features(node: &Value) -> MetaData {
    let mut md = MetaData::default();
    md.title = text(node, "headline").or_else(|| text(node, "name"));
    md.provider = ["publisher", "provider", "producer", "sourceOrganization"]
        .iter()
        .find_map(|key| name_of(node.get(*key)?));
    md.language = text(node, "inLanguage").map(|l| canonical_locale(&l));
    md.published = text(node, "datePublished").map(|d| date::normalize_instant(&d));
    md.url = text(node, "url");
    // The first credit-like key that is present at all claims the author,
    // even if its shape then yields nothing.
    md.author = ["author", "creator", "contributor", "accountablePerson"]
        .iter()
        .find_map(|key| node.get(*key).filter(|v| !v.is_null()))
        .and_then(parse_author);
    md.url_access = match node.get("isAccessibleForFree") {
        Some(Value::Bool(false)) => Some(UrlAccess::Subscription),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => {
            Some(UrlAccess::Subscription)
        }
        _ => None,
    };
    md
}

fn scholarly(node: &Value, md: &mut MetaData) {
    md.kind = Some(Kind::Journal);
    md.pages = text(node, "pagination").or_else(|| {
        match (scalar(node, "pageStart"), scalar(node, "pageEnd")) {
            (Some(start), Some(end)) => Some(format!("{start}-{end}")),
            _ => None,
        }
    });
    if let Some(part) = node.get("isPartOf") {
        md.journal = name_of(part);
        md.issn = match part.get("issn") {
            Some(Value::Array(items)) => items.first().and_then(|v| string_like(Some(v))),
            Some(single) => string_like(Some(single)),
            None => None,
        };
        md.volume = scalar(part, "volumeNumber");
    }
    if let Some(same) = node.get("sameAs").and_then(Value::as_str)
        && let Some(doi) = same.strip_prefix("https://doi.org/")
    {
        md.doi = Some(doi.to_string());
    }
}

fn book(node: &Value, md: &mut MetaData) {
    md.kind = Some(Kind::Book);
    md.isbn = scalar(node, "isbn");
}

fn text(node: &Value, key: &str) -> Option<String> {
    node.get(key).and_then(Value::as_str).map(str::to_string)
}

fn scalar(node: &Value, key: &str) -> Option<String> {
    string_like(node.get(key))
}

fn name_of(value: &Value) -> Option<String> {
    text(value, "name")
}

fn parse_author(value: &Value) -> Option<Author> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(Author::Single(s.clone())),
        Value::Object(_) => name_of(value).map(Author::Single),
        Value::Array(items) => {
            let mut names: Vec<String> = items.iter().filter_map(credited_name).collect();
            match names.len() {
                0 => None,
                1 => names.pop().map(Author::Single),
                _ => Some(Author::Multiple(names)),
            }
        }
        _ => None,
    }
}

fn credited_name(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Object(_) => name_of(value),
        _ => None,
    }
}

/// `en_US` -> `en-US`, `eng` -> `en`. Underscores become hyphens, subtags
/// take their conventional casing, and the common bibliographic three-letter
/// language codes collapse to their two-letter equivalents.
fn canonical_locale(raw: &str) -> String {
    static TWO_LETTER: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
        HashMap::from([
            ("eng", "en"),
            ("fre", "fr"),
            ("fra", "fr"),
            ("ger", "de"),
            ("deu", "de"),
            ("spa", "es"),
            ("ita", "it"),
            ("dut", "nl"),
            ("nld", "nl"),
            ("por", "pt"),
            ("rus", "ru"),
            ("jpn", "ja"),
            ("chi", "zh"),
            ("zho", "zh"),
            ("ara", "ar"),
            ("hin", "hi"),
            ("kor", "ko"),
            ("mao", "mi"),
            ("mri", "mi"),
            ("swe", "sv"),
            ("nor", "no"),
            ("dan", "da"),
            ("fin", "fi"),
            ("pol", "pl"),
            ("tur", "tr"),
            ("gre", "el"),
            ("ell", "el"),
            ("heb", "he"),
            ("lat", "la"),
        ])
    });

    let tag = raw.trim().replace('_', "-");
    let mut parts = tag.split('-').filter(|p| !p.is_empty());
    let Some(first) = parts.next() else {
        return tag;
    };
    let lang = first.to_ascii_lowercase();
    let mut out = TWO_LETTER
        .get(lang.as_str())
        .map(|s| s.to_string())
        .unwrap_or(lang);
    for part in parts {
        out.push('-');
        out.push_str(&subtag_case(part));
    }
    out
}

fn subtag_case(part: &str) -> String {
    let alpha = part.chars().all(|c| c.is_ascii_alphabetic());
    if alpha && part.len() == 2 {
        part.to_ascii_uppercase()
    } else if alpha && part.len() == 4 {
        let mut chars = part.chars();
        match chars.next() {
            Some(first) => {
                first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
            }
            None => String::new(),
        }
    } else {
        part.to_ascii_lowercase()
    }
}

/// One structured-data blob to one record. Bad JSON is simply an empty
/// record; nothing at this layer errors.
pub fn scrape(blob: &str) -> MetaData {
    match serde_json::from_str::<Value>(blob) {
        Ok(value) => scrape_value(&value),
        Err(_) => MetaData::default(),
    }
}

pub fn scrape_value(value: &Value) -> MetaData {
    flatten(value)
        .into_iter()
        .filter(|node| classify(node) != NodeKind::Ignored)
        .map(map_node)
        .fold(MetaData::default(), MetaData::merge)
}

/// Several blobs from one page: each scraped independently (a broken one
/// contributes nothing), combined right-biased in document order.
pub fn scrape_all<I, S>(blobs: I) -> MetaData
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    blobs
        .into_iter()
        .map(|blob| scrape(blob.as_ref()))
        .fold(MetaData::default(), MetaData::merge)
}

static SCRIPT_LD_JSON_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<script\b[^>]*type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .unwrap()
});

/// Lifts the `application/ld+json` payloads out of raw HTML, in page order.
/// Comment markers and NULs inside the payload are stripped; decoding is
/// left to [`scrape`] so one bad blob cannot hide the rest.
pub fn harvest(html: &str) -> Vec<String> {
    SCRIPT_LD_JSON_RE
        .captures_iter(html)
        .filter_map(|c| c.get(1))
        .map(|m| {
            m.as_str()
                .trim()
                .replace("<!--", "")
                .replace("-->", "")
                .replace('\u{0000}', "")
        })
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SPRINGER: &str = r##"{"mainEntity":{"headline":"Nuclear Weapons Tests and Environmental Consequences: A Global Perspective","description":"The beginning of the atomic age marked the outset of nuclear weapons testing.","datePublished":"2014-02-22T00:00:00Z","dateModified":"2014-02-22T00:00:00Z","pageStart":"729","pageEnd":"744","sameAs":"https://doi.org/10.1007/s13280-014-0491-1","keywords":["Environment","general","Ecology"],"isPartOf":{"name":"AMBIO","issn":["1654-7209","0044-7447"],"volumeNumber":"43","@type":["Periodical","PublicationVolume"]},"publisher":{"name":"Springer Netherlands","logo":{"url":"https://www.springernature.com/app-sn/public/images/logo-springernature.png","@type":"ImageObject"},"@type":"Organization"},"author":[{"name":"Remus Prăvălie","affiliation":[{"name":"Bucharest University","@type":"Organization"}],"email":"pravalie_remus@yahoo.com","@type":"Person"}],"isAccessibleForFree":false,"hasPart":{"isAccessibleForFree":false,"cssSelector":".main-content","@type":"WebPageElement"},"@type":"ScholarlyArticle"},"@context":"https://schema.org","@type":"WebPage"}"##;

    const WSJ: &str = r##"[{"@context":"https://schema.org","@type":"VideoObject","contentUrl":"https://m.wsj.net/video/20240102/manifest-hd-wifi.m3u8","description":"Harvard University President Claudine Gay resigned.","duration":"PT2M1S","name":"Claudine Gay Resigns as Harvard President"},{"@context":"https://schema.org","@type":"ImageObject","caption":"Applications for early admission to Harvard fell this cycle.","contentUrl":"https://images.wsj.net/im-907499","creator":{"@type":"Person","name":"Steven Senne/Associated Press"}},{"@context":"https://schema.org","@type":"WebPage","dateCreated":"2024-01-03T10:30:00.000Z","dateModified":"2024-01-03T23:45:00.000Z","datePublished":"2024-01-03T10:30:00.000Z","description":"University must find a new president and address rifts among faculty, students and donors","inLanguage":"en_US","publisher":{"@id":"https://www.wsj.com/#publisher"}},{"@context":"https://schema.org","@type":"NewsArticle","articleSection":"US","author":[{"@type":"Person","name":"Melissa Korn","sameAs":"https://www.wsj.com/news/author/melissa-korn"}],"dateCreated":"2024-01-03T10:30:00.000Z","dateModified":"2024-01-03T23:45:00.000Z","datePublished":"2024-01-03T10:30:00.000Z","description":"University must find a new president and address rifts among faculty, students and donors","hasPart":{"@type":"WebPageElement","cssSelector":".paywall","isAccessibleForFree":false},"isPartOf":{"@type":["CreativeWork","Product"],"name":"The Wall Street Journal","productID":"wsj.com:WSJ-SwG-AllAccessDigital"},"headline":"Where Does Harvard Go From Here as Claudine Gay Is Out as President?","isAccessibleForFree":false,"keywords":["North America","United States","Education"],"mainEntityOfPage":{"@id":"https://www.wsj.com/us-news/education/claudine-gay-is-out-as-president-where-does-harvard-go-from-here-ea9b9fde","@type":"WebPage"},"publisher":{"@id":"wsj.com","@type":"NewsMediaOrganization","logo":{"@type":"ImageObject","height":60,"url":"https://s.wsj.net/media/wsj_amp_masthead_lg.png","width":576},"name":"The Wall Street Journal"},"thumbnailUrl":"https://images.wsj.net/im-907499?width=1280&size=1","url":"https://www.wsj.com/us-news/education/claudine-gay-is-out-as-president-where-does-harvard-go-from-here-ea9b9fde"},{"@context":"https://schema.org","@type":"BreadcrumbList","itemListElement":[{"@type":"ListItem","item":"https://www.wsj.com/us-news?mod=breadcrumb","name":"U.S.","position":1},{"@type":"ListItem","item":"https://www.wsj.com/us-news/education?mod=breadcrumb","name":"U.S. Education News","position":2}]}]"##;

    const THE_PRESS: &str = r##"{"@context":"https://schema.org","@type":"NewsArticle","articleSection":"NZ news","author":{"@type":"Person","name":"Liz McDonald"},"dateModified":"2024-01-04T16:00:00Z","datePublished":"2024-01-04T16:00:00Z","description":"The 163-year-old Victorian timber building is for sale.","headline":"Heritage mansion Eliza's Manor to be sold at auction","inLanguage":"en","isAccessibleForFree":"False","keywords":["Christchurch","New Zealand","Wānaka","Eliza's Manor","Harold Williams"],"mainEntityOfPage":{"@type":"WebPage","@id":"https://www.thepress.co.nz/nz-news/350141274/heritage-mansion-elizas-manor-be-sold-auction"},"publisher":{"@type":"Organization","name":"The Press"},"url":"https://www.thepress.co.nz/nz-news/350141274/heritage-mansion-elizas-manor-be-sold-auction","wordCount":2667}"##;

    const WORLDCAT: &str = r##"{
      "@context":"https://schema.org",
      "@type":"DataFeed",
      "dataFeedElement": [
        {
          "@context": "https://schema.org",
          "@id": "https://search.worldcat.org/title/156749714",
          "@type": "Book",
          "author": {
            "@type": "Person",
            "name": "D. A. Hills,Helen Hills"
          },
          "name": "Settling near the Styx River",
          "url": "https://search.worldcat.org/title/156749714",
          "workExample": [
            {
              "@id": "https://search.worldcat.org/title/156749714",
              "@type": "Book",
              "bookFormat": "https://schema.org/Hardcover",
              "inLanguage": "eng",
              "isbn": "9780473111342",
              "bookEdition": "null",
              "datePublished": "c2006",
              "identifier": {
                "@type": "PropertyValue",
                "propertyID": "OCLC_NUMBER",
                "value": 156749714
              },
              "url": "https://search.worldcat.org/title/156749714"
            }
          ]
        }
      ]
    }"##;

    #[test]
    fn springer_journal_article() {
        let md = scrape(SPRINGER);
        assert_eq!(md.kind, Some(Kind::Journal));
        assert_eq!(
            md.title.as_deref(),
            Some("Nuclear Weapons Tests and Environmental Consequences: A Global Perspective")
        );
        assert_eq!(md.provider.as_deref(), Some("Springer Netherlands"));
        assert_eq!(md.published.as_deref(), Some("2014-02-22T00:00:00.000Z"));
        assert_eq!(
            md.author,
            Some(Author::Single("Remus Prăvălie".to_string()))
        );
        assert_eq!(md.url_access, Some(UrlAccess::Subscription));
        assert_eq!(md.pages.as_deref(), Some("729-744"));
        assert_eq!(md.journal.as_deref(), Some("AMBIO"));
        assert_eq!(md.issn.as_deref(), Some("1654-7209"));
        assert_eq!(md.volume.as_deref(), Some("43"));
        assert_eq!(md.doi.as_deref(), Some("10.1007/s13280-014-0491-1"));
    }

    #[test]
    fn wsj_news_article() {
        let md = scrape(WSJ);
        assert_eq!(md.language.as_deref(), Some("en-US"));
        assert_eq!(md.published.as_deref(), Some("2024-01-03T10:30:00.000Z"));
        assert_eq!(md.kind, Some(Kind::News));
        assert_eq!(
            md.title.as_deref(),
            Some("Where Does Harvard Go From Here as Claudine Gay Is Out as President?")
        );
        assert_eq!(md.provider.as_deref(), Some("The Wall Street Journal"));
        assert_eq!(
            md.url.as_deref(),
            Some("https://www.wsj.com/us-news/education/claudine-gay-is-out-as-president-where-does-harvard-go-from-here-ea9b9fde")
        );
        assert_eq!(md.author, Some(Author::Single("Melissa Korn".to_string())));
    }

    #[test]
    fn the_press_news_article() {
        let md = scrape(THE_PRESS);
        assert_eq!(
            md.title.as_deref(),
            Some("Heritage mansion Eliza's Manor to be sold at auction")
        );
        assert_eq!(md.provider.as_deref(), Some("The Press"));
        assert_eq!(md.language.as_deref(), Some("en"));
        assert_eq!(md.published.as_deref(), Some("2024-01-04T16:00:00.000Z"));
        assert_eq!(md.author, Some(Author::Single("Liz McDonald".to_string())));
        assert_eq!(md.kind, Some(Kind::News));
        assert_eq!(md.url_access, Some(UrlAccess::Subscription));
    }

    #[test]
    fn worldcat_data_feed_book() {
        let md = scrape(WORLDCAT);
        assert_eq!(md.title.as_deref(), Some("Settling near the Styx River"));
        assert_eq!(
            md.url.as_deref(),
            Some("https://search.worldcat.org/title/156749714")
        );
        assert_eq!(
            md.author,
            Some(Author::Single("D. A. Hills,Helen Hills".to_string()))
        );
        assert_eq!(md.kind, Some(Kind::Book));
        assert_eq!(md.language.as_deref(), Some("en"));
        assert_eq!(md.published.as_deref(), Some("c2006"));
        assert_eq!(md.isbn.as_deref(), Some("9780473111342"));
    }

    #[test]
    fn empty_and_broken_input_yield_empty_records() {
        assert!(scrape("").is_empty());
        assert!(scrape("not a json string").is_empty());
        assert!(scrape("{\"unterminated\": ").is_empty());
    }

    #[test]
    fn unknown_types_yield_nothing() {
        let blob = r#"{"@context":"https://schema.org","@type":"WebSite","url":"","potentialAction":{"@type":"SearchAction","target":"","query-input":"required name=search_term"}}"#;
        assert!(scrape(blob).is_empty());
    }

    #[test]
    fn graph_containers_are_unwrapped() {
        let doc = json!({
            "@context": "https://schema.org",
            "@graph": [
                {"@type": "Organization", "name": "Nobody"},
                {"@type": "NewsArticle", "headline": "Graph Story"}
            ]
        });
        let md = scrape_value(&doc);
        assert_eq!(md.title.as_deref(), Some("Graph Story"));
        assert_eq!(md.kind, Some(Kind::News));
    }

    #[test]
    fn missing_feed_elements_are_not_an_error() {
        let md = scrape_value(&json!({"@type": "DataFeed"}));
        assert!(md.is_empty());
        let md = scrape_value(&json!({"@type": "DataFeed", "dataFeedElement": "oops"}));
        assert!(md.is_empty());
    }

    #[test]
    fn array_valued_type_is_ignored() {
        let md = scrape_value(&json!({"@type": ["NewsArticle", "Article"], "headline": "X"}));
        assert!(md.is_empty());
    }

    #[test]
    fn wrapper_without_known_type_still_exposes_its_main_entity() {
        let doc = json!({
            "@type": "Recipe",
            "name": "Irrelevant",
            "mainEntity": {"@type": "Book", "name": "The Real Thing", "isbn": "123"}
        });
        let md = scrape_value(&doc);
        assert_eq!(md.title.as_deref(), Some("The Real Thing"));
        assert_eq!(md.isbn.as_deref(), Some("123"));
    }

    #[test]
    fn later_nodes_win_overlapping_fields() {
        let doc = json!([
            {"@type": "WebPage", "name": "Outer", "datePublished": "2020-01-01"},
            {"@type": "NewsArticle", "headline": "Inner"}
        ]);
        let md = scrape_value(&doc);
        assert_eq!(md.title.as_deref(), Some("Inner"));
        // The earlier node's fields survive where the later one is silent.
        assert_eq!(md.published.as_deref(), Some("2020-01-01T00:00:00.000Z"));
    }

    #[test]
    fn blobs_combine_in_document_order() {
        let first = r#"{"@type":"WebPage","name":"First Title","inLanguage":"en"}"#;
        let second = r#"{"@type":"NewsArticle","headline":"Second Title"}"#;
        let md = scrape_all([first, second]);
        assert_eq!(md.title.as_deref(), Some("Second Title"));
        assert_eq!(md.language.as_deref(), Some("en"));

        let md = scrape_all([second, first]);
        assert_eq!(md.title.as_deref(), Some("First Title"));
    }

    #[test]
    fn one_broken_blob_does_not_suppress_the_rest() {
        let md = scrape_all(["{{{", r#"{"@type":"WebPage","name":"Survivor"}"#]);
        assert_eq!(md.title.as_deref(), Some("Survivor"));
    }

    #[test]
    fn locale_canonicalization() {
        assert_eq!(canonical_locale("en_US"), "en-US");
        assert_eq!(canonical_locale("eng"), "en");
        assert_eq!(canonical_locale("EN"), "en");
        assert_eq!(canonical_locale("mi"), "mi");
        assert_eq!(canonical_locale("en-latn-us"), "en-Latn-US");
        assert_eq!(canonical_locale("tlh"), "tlh");
    }

    #[test]
    fn harvest_lifts_script_payloads_in_page_order() {
        let html = r#"<html><head>
            <script type="application/ld+json">{"@type":"WebPage","name":"A"}</script>
            <script src="/app.js"></script>
            <script type="application/ld+json">
            <!-- {"@type":"NewsArticle","headline":"B"} -->
            </script>
            </head><body></body></html>"#;
        let blobs = harvest(html);
        assert_eq!(blobs.len(), 2);
        assert!(blobs[0].contains("\"A\""));
        let md = scrape_all(&blobs);
        assert_eq!(md.title.as_deref(), Some("B"));
        assert_eq!(md.kind, Some(Kind::News));
    }

    #[test]
    fn harvest_of_plain_html_is_empty() {
        assert!(harvest("<html><body><p>hello</p></body></html>").is_empty());
    }

    #[test]
    fn scraping_arbitrary_json_never_panics() {
        proptest::proptest!(|(s in "\\PC{0,80}")| {
            let _ = scrape(&s);
        })
    }
}
