use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

const MONTH_PAT: &str = r"Jan(?:uary)?|Feb(?:ruary)?|Mar(?:ch)?|Apr(?:il)?|May|Jun(?:e)?|Jul(?:y)?|Aug(?:ust)?|Sep(?:t(?:ember)?)?|Oct(?:ober)?|Nov(?:ember)?|Dec(?:ember)?";

/// Headlines often carry the publication date when nothing else does. Looks
/// for a named-month date in either order, an ISO date, or an MM/DD/YYYY
/// numeric date (American order only; a day-first numeric that fails
/// validation is rejected rather than reinterpreted). Ordinal suffixes are
/// tolerated. Returns `YYYY-MM-DD`.
pub fn date_from_title(title: &str) -> Option<String> {
    static DAY_MONTH_YEAR: Lazy<Regex> = Lazy::new(|| {
        Regex::new(&format!(
            r"(?i)\b(\d{{1,2}})(?:st|nd|rd|th)?\s+({MONTH_PAT})\.?,?\s+(\d{{4}})\b"
        ))
        .unwrap()
    });
    static MONTH_DAY_YEAR: Lazy<Regex> = Lazy::new(|| {
        Regex::new(&format!(
            r"(?i)\b({MONTH_PAT})\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?\s*,?\s+(\d{{4}})\b"
        ))
        .unwrap()
    });
    static ISO: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").unwrap());
    static NUMERIC: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b").unwrap());

    if let Some(c) = ISO.captures(title)
        && let Some(d) = ymd(&c[1], &c[2], &c[3])
    {
        return Some(d.to_string());
    }
    if let Some(c) = DAY_MONTH_YEAR.captures(title)
        && let Some(m) = month_number(&c[2])
        && let Some(d) = ymd_nums(&c[3], m, &c[1])
    {
        return Some(d.to_string());
    }
    if let Some(c) = MONTH_DAY_YEAR.captures(title)
        && let Some(m) = month_number(&c[1])
        && let Some(d) = ymd_nums(&c[3], m, &c[2])
    {
        return Some(d.to_string());
    }
    if let Some(c) = NUMERIC.captures(title)
        && let Some(d) = ymd(&c[3], &c[1], &c[2])
    {
        return Some(d.to_string());
    }
    None
}

fn ymd(y: &str, m: &str, d: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y.parse().ok()?, m.parse().ok()?, d.parse().ok()?)
}

fn ymd_nums(y: &str, month: u32, d: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y.parse().ok()?, month, d.parse().ok()?)
}

fn month_number(name: &str) -> Option<u32> {
    let key = name.get(..3)?.to_ascii_lowercase();
    let n = match key.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(n)
}

/// Reads any recognizable date or date-time as UTC and formats it as a full
/// millisecond-precision instant. Anything unrecognizable comes back
/// unchanged so the raw value survives downstream.
pub fn normalize_instant(raw: &str) -> String {
    let t = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(t) {
        return utc_instant(dt.with_timezone(&Utc));
    }
    // Offsets without a colon, which strict RFC 3339 parsing may refuse.
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%z"] {
        if let Ok(dt) = DateTime::parse_from_str(t, fmt) {
            return utc_instant(dt.with_timezone(&Utc));
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(t, fmt) {
            return utc_instant(naive.and_utc());
        }
    }
    if let Some(naive) = partial_date(t)
        && let Some(midnight) = naive.and_hms_opt(0, 0, 0)
    {
        return utc_instant(midnight.and_utc());
    }
    raw.to_string()
}

// Date-only forms, laddered from full to bare-year like page metadata tends
// to degrade.
fn partial_date(t: &str) -> Option<NaiveDate> {
    static YMD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").unwrap());
    static YM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4})-(\d{2})$").unwrap());
    static Y: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4})$").unwrap());
    if let Some(c) = YMD.captures(t) {
        return ymd(&c[1], &c[2], &c[3]);
    }
    if let Some(c) = YM.captures(t) {
        return ymd(&c[1], &c[2], "1");
    }
    if let Some(c) = Y.captures(t) {
        return ymd(&c[1], "1", "1");
    }
    None
}

fn utc_instant(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}
