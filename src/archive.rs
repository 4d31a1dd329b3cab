use std::time::Duration;

use anyhow::Context;
use serde_json::Value;
use url::Url;

use crate::citation::Citation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub url: String,
    /// 14-digit `YYYYMMDDhhmmss` capture timestamp.
    pub timestamp: String,
}

/// Asks the Wayback Machine availability API for the capture closest to
/// now. `Ok(None)` means the archive holds nothing for that URL; `Err` is
/// transport trouble.
pub fn closest_snapshot(target: &str) -> anyhow::Result<Option<Snapshot>> {
    let mut endpoint =
        Url::parse("https://archive.org/wayback/available").context("availability endpoint")?;
    endpoint.query_pairs_mut().append_pair("url", target);

    let cfg = ureq::Agent::config_builder()
        .timeout_connect(Some(Duration::from_secs(5)))
        .timeout_global(Some(Duration::from_secs(15)))
        .build();
    let agent = ureq::Agent::new_with_config(cfg);
    let body = agent
        .get(endpoint.as_str())
        .header(
            "User-Agent",
            "Mozilla/5.0 (compatible; wikicite/0.1; +https://example.org)",
        )
        .call()
        .with_context(|| format!("availability lookup for {target}"))?
        .into_body()
        .read_to_string()
        .context("read availability body")?;

    Ok(parse_availability(&body))
}

fn parse_availability(body: &str) -> Option<Snapshot> {
    let value: Value = serde_json::from_str(body).ok()?;
    let closest = value.get("archived_snapshots")?.get("closest")?;
    if !closest.get("available").and_then(Value::as_bool).unwrap_or(false) {
        return None;
    }
    Some(Snapshot {
        url: closest.get("url")?.as_str()?.to_string(),
        timestamp: closest.get("timestamp")?.as_str()?.to_string(),
    })
}

/// The archive parameters a snapshot contributes, ready to merge over an
/// assembled record.
pub fn citation_fields(snapshot: &Snapshot) -> Citation {
    let mut overlay = Citation::new();
    overlay.set("archiveUrl", snapshot.url.as_str());
    let ts = &snapshot.timestamp;
    if ts.len() >= 8 && ts.chars().take(8).all(|ch| ch.is_ascii_digit()) {
        overlay.set(
            "archiveDate",
            format!("{}-{}-{}", &ts[0..4], &ts[4..6], &ts[6..8]),
        );
    }
    overlay
}
