use chrono::{NaiveDate, Utc};

use crate::citation::{Citation, MergeMode, merge};
use crate::date;
use crate::metadata::{Kind, MetaData};
use crate::name;
use crate::overrides;

/// Builds the citation record from a scrape, stamped with today's date.
pub fn to_citation(metadata: &MetaData) -> Citation {
    to_citation_at(metadata, Utc::now().date_naive())
}

/// The full precedence transform, with the access date injected so tests
/// stay deterministic. Later derivations overwrite earlier ones, which is
/// how a date found inside the title loses to explicit publication data.
pub fn to_citation_at(metadata: &MetaData, today: NaiveDate) -> Citation {
    let mut citation = Citation::new();

    if let Some(title) = trimmed(&metadata.title) {
        citation.set("title", title.clone());
        if let Some(found) = date::date_from_title(&title) {
            citation.set("date", found);
        }
    }
    if let Some(page) = trimmed(&metadata.page_number) {
        citation.set("page", page);
    }
    if let Some(pages) = trimmed(&metadata.pages) {
        citation.set("pages", pages);
    }
    if let Some(language) = trimmed(&metadata.language) {
        citation.set("language", language);
    }

    // Books put the provider in the publisher slot; journal articles cite
    // the journal as the work with the provider publishing it; everything
    // else cites the provider as the work itself.
    if metadata.kind == Some(Kind::Book) {
        if let Some(provider) = trimmed(&metadata.provider) {
            citation.set("publisher", provider);
        }
    } else if let Some(journal) = trimmed(&metadata.journal) {
        citation.set("work", journal);
        if let Some(provider) = trimmed(&metadata.provider) {
            citation.set("publisher", provider);
        }
    } else if let Some(provider) = trimmed(&metadata.provider) {
        citation.set("work", provider);
    }

    for (key, value) in [
        ("publisher", &metadata.publisher),
        ("isbn", &metadata.isbn),
        ("issn", &metadata.issn),
        ("doi", &metadata.doi),
        ("volume", &metadata.volume),
        ("publicationPlace", &metadata.location),
    ] {
        if let Some(v) = trimmed(value) {
            citation.set(key, v);
        }
    }
    if let Some(access) = metadata.url_access {
        citation.set("urlAccess", access.as_str());
    }
    for (key, value) in [
        ("issue", &metadata.issue),
        ("pmid", &metadata.pmid),
        ("via", &metadata.via),
    ] {
        if let Some(v) = trimmed(value) {
            citation.set(key, v);
        }
    }

    if let Some(author) = &metadata.author {
        let context = citation
            .get("work")
            .or_else(|| citation.get("publisher"))
            .unwrap_or("")
            .to_string();
        let mut pairs = name::split_author_field(author, &context).into_iter();
        if let Some(first) = pairs.next() {
            citation.set("last1", first.last);
            citation.set("first1", first.first);
        }
        if let Some(second) = pairs.next() {
            citation.set("last2", second.last);
            citation.set("first2", second.first);
        }
    }

    if let Some(year) = trimmed(&metadata.year) {
        citation.set("date", year);
    } else if let Some(published) = &metadata.published {
        citation.set("date", published.chars().take(10).collect::<String>());
    }

    // Always freshly stamped, never carried over from an earlier record.
    citation.set("accessDate", today.to_string());

    citation
}

/// Final overlay: fixed per-host fields keyed on the page URL's host.
pub fn apply_site_overrides(citation: Citation, page_url: &str) -> Citation {
    let Some(host) = url::Url::parse(page_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
    else {
        return citation;
    };
    match overrides::for_host(&host) {
        Some(overlay) => merge(&citation, &overlay, MergeMode::Keep),
        None => citation,
    }
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
