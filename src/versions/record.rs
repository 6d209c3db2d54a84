// Manifest entry model

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use std::cmp::Ordering;
use std::fmt;

/// One entry of a version manifest. Never mutated after the store loads it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionRecord {
    pub id: String,
    #[serde(rename = "type", default)]
    pub version_type: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub release_time: Option<String>,
    /// Descriptor or archive location: a URL or a path relative to the working directory.
    #[serde(default)]
    pub url: Option<String>,
    /// Secondary bundle (config resources, or a mod distribution archive).
    #[serde(default)]
    pub resources: Option<String>,
    #[serde(default)]
    pub range: Option<String>,
    #[serde(default)]
    pub server_versions: Option<Vec<String>>,
    #[serde(default)]
    pub game_versions: Option<Vec<String>>,
}

impl VersionRecord {
    #[cfg(test)]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version_type: None,
            time: None,
            release_time: None,
            url: None,
            resources: None,
            range: None,
            server_versions: None,
            game_versions: None,
        }
    }

    /// Parsed `releaseTime`; `None` when absent or not an ISO-8601 instant.
    pub fn released_at(&self) -> Option<DateTime<FixedOffset>> {
        self.release_time
            .as_deref()
            .and_then(|t| parse_instant(t.trim()))
    }

    fn is_type(&self, t: &str) -> bool {
        self.version_type.as_deref() == Some(t)
    }
}

/// RFC 3339, or an ISO-8601 instant without seconds such as `2011-11-14T00:00Z`.
fn parse_instant(text: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(text)
        .or_else(|_| DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M%#z"))
        .ok()
}

/// Recency order: records without a parsable release time come first, then newest
/// to oldest. Ties fall back to the id so the order is total.
pub fn compare_by_recency(a: &VersionRecord, b: &VersionRecord) -> Ordering {
    match (a.released_at(), b.released_at()) {
        (None, None) => a.id.cmp(&b.id),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(ta), Some(tb)) => tb.cmp(&ta).then_with(|| a.id.cmp(&b.id)),
    }
}

impl fmt::Display for VersionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.id.as_str();
        let (kind, name) = if id.starts_with("rd") && self.is_type("old_alpha") {
            ("Pre-Classic".to_string(), id)
        } else if let Some(rest) = id.strip_prefix('c').filter(|_| self.is_type("old_alpha")) {
            ("Classic".to_string(), rest)
        } else if let Some(rest) = id.strip_prefix("inf-") {
            ("Infdev".to_string(), rest)
        } else if let Some(rest) = id.strip_prefix("in-") {
            ("Indev".to_string(), rest)
        } else if let Some(rest) = id.strip_prefix('a').filter(|_| self.is_type("old_alpha")) {
            ("Alpha".to_string(), rest)
        } else if let Some(rest) = id.strip_prefix('b') {
            ("Beta".to_string(), rest)
        } else {
            (capitalize(self.version_type.as_deref().unwrap_or("unknown")), id)
        };
        write!(f, "{} {}", kind, name)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, version_type: &str, release_time: Option<&str>) -> VersionRecord {
        VersionRecord {
            version_type: Some(version_type.to_string()),
            release_time: release_time.map(String::from),
            ..VersionRecord::new(id)
        }
    }

    #[test]
    fn test_deserialize_manifest_entry() {
        let json = r#"{
            "id": "b1.7.3",
            "type": "old_beta",
            "releaseTime": "2011-07-08T00:00:00+00:00",
            "url": "versions/b1.7.3.json",
            "serverVersions": ["b1.7.3"]
        }"#;
        let entry: VersionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(entry.id, "b1.7.3");
        assert_eq!(entry.version_type.as_deref(), Some("old_beta"));
        assert_eq!(entry.server_versions, Some(vec!["b1.7.3".to_string()]));
        assert!(entry.game_versions.is_none());
        assert!(entry.released_at().is_some());
    }

    #[test]
    fn test_malformed_release_time_is_unparsed() {
        assert!(record("a", "release", Some("last tuesday")).released_at().is_none());
        assert!(record("a", "release", None).released_at().is_none());
    }

    #[test]
    fn test_release_time_without_seconds_parses() {
        let short = record("b1.1_02", "old_beta", Some("2011-11-14T00:00Z"));
        let full = record("b1.1_01", "old_beta", Some("2011-11-13T00:00:00+00:00"));
        assert!(short.released_at().is_some());
        assert!(record("a", "release", Some("2011-11-14T00:00+02:00")).released_at().is_some());
        assert_eq!(compare_by_recency(&short, &full), Ordering::Less);
    }

    #[test]
    fn test_unparsable_dates_sort_first() {
        let old = record("a1.0.4", "old_alpha", Some("2010-07-09T00:00:00Z"));
        let new = record("b1.0", "old_beta", Some("2010-12-20T00:00:00Z"));
        let broken = record("c0.30", "old_alpha", Some("not a date"));

        assert_eq!(compare_by_recency(&broken, &new), Ordering::Less);
        assert_eq!(compare_by_recency(&new, &old), Ordering::Less);
        assert_eq!(compare_by_recency(&old, &broken), Ordering::Greater);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(record("rd-132211", "old_alpha", None).to_string(), "Pre-Classic rd-132211");
        assert_eq!(record("c0.0.13a", "old_alpha", None).to_string(), "Classic 0.0.13a");
        assert_eq!(record("inf-20100618", "old_alpha", None).to_string(), "Infdev 20100618");
        assert_eq!(record("in-20100223", "old_alpha", None).to_string(), "Indev 20100223");
        assert_eq!(record("a1.2.6", "old_alpha", None).to_string(), "Alpha 1.2.6");
        assert_eq!(record("b1.7.3", "old_beta", None).to_string(), "Beta 1.7.3");
        assert_eq!(record("1.0", "release", None).to_string(), "Release 1.0");
    }
}
