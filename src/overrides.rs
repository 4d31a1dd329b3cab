use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::citation::Citation;

/// Hosts whose citations always carry the same fixed fields, whatever the
/// page itself declares. Applied last, over the assembled record.
static SITE_OVERRIDES: Lazy<HashMap<&'static str, &'static [(&'static str, &'static str)]>> =
    Lazy::new(|| {
        HashMap::from([
            (
                "paperspast.natlib.govt.nz",
                &[("via", "PapersPast")] as &[_],
            ),
            ("www.pressreader.com", &[("via", "PressReader")] as &[_]),
            ("stuff.pressreader.com", &[("via", "PressReader")] as &[_]),
            (
                "www.heritage.org.nz",
                &[("work", "Heritage New Zealand")] as &[_],
            ),
            (
                "www.beehive.govt.nz",
                &[("publisher", "New Zealand Government")] as &[_],
            ),
            (
                "www.health.govt.nz",
                &[
                    ("work", "Ministry of Health"),
                    ("publisher", "New Zealand Government"),
                ] as &[_],
            ),
        ])
    });

/// The override record for a host, if any.
pub fn for_host(host: &str) -> Option<Citation> {
    SITE_OVERRIDES.get(host).map(|pairs| {
        let mut overlay = Citation::new();
        for (key, value) in pairs.iter() {
            overlay.set(key, *value);
        }
        overlay
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_hosts_have_overrides() {
        let c = for_host("paperspast.natlib.govt.nz").expect("override");
        assert_eq!(c.get("via"), Some("PapersPast"));

        let c = for_host("www.health.govt.nz").expect("override");
        assert_eq!(c.get("work"), Some("Ministry of Health"));
        assert_eq!(c.get("publisher"), Some("New Zealand Government"));
    }

    #[test]
    fn unknown_hosts_have_none() {
        assert!(for_host("example.org").is_none());
        assert!(for_host("natlib.govt.nz").is_none());
    }
}
