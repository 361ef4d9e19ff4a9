//! Data model shared by every stage of the refresh pipeline

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single servable line, tagged with where it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffirmationItem {
    /// Display text, never blank
    pub line: String,

    /// Topic (feed identifier) the line was pulled from
    pub source_topic: String,

    /// Absolute URL of the original post
    pub permalink: String,

    /// Upvote-equivalent score, only used to break duplicate ties
    #[serde(default)]
    pub popularity: u64,
}

impl AffirmationItem {
    /// Create a new item with zero popularity
    pub fn new(
        line: impl Into<String>,
        source_topic: impl Into<String>,
        permalink: impl Into<String>,
    ) -> Self {
        Self {
            line: line.into(),
            source_topic: source_topic.into(),
            permalink: permalink.into(),
            popularity: 0,
        }
    }

    /// Set the popularity score
    pub fn with_popularity(mut self, popularity: u64) -> Self {
        self.popularity = popularity;
        self
    }

    /// Key under which two items count as duplicates
    pub fn dedupe_key(&self) -> String {
        self.line.to_lowercase()
    }
}

/// One post record as delivered by a feed, before any filtering
///
/// Every field is optional on the wire. Missing strings become empty,
/// missing flags become `false` and a missing score becomes `0`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawItem {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,

    /// Body text
    #[serde(deserialize_with = "null_as_default")]
    pub selftext: String,

    /// Permalink relative to the feed's base URL
    #[serde(deserialize_with = "null_as_default")]
    pub permalink: String,

    #[serde(deserialize_with = "null_as_default")]
    pub url: String,

    /// Link target when the post points somewhere other than `url`
    #[serde(deserialize_with = "null_as_default")]
    pub url_overridden_by_dest: String,

    #[serde(deserialize_with = "null_as_default")]
    pub is_gallery: bool,

    #[serde(deserialize_with = "null_as_default")]
    pub is_video: bool,

    /// Content classification hint, e.g. `image` or `hosted:video`
    #[serde(deserialize_with = "null_as_default")]
    pub post_hint: String,

    /// Negative scores clamp to zero
    #[serde(deserialize_with = "score_or_zero")]
    pub ups: u64,
}

impl RawItem {
    /// URL the post primarily points at
    pub fn primary_url(&self) -> &str {
        if self.url_overridden_by_dest.is_empty() {
            &self.url
        } else {
            &self.url_overridden_by_dest
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn score_or_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let score = Option::<serde_json::Value>::deserialize(deserializer)?;
    // Float-to-int casts saturate: negatives and NaN land on 0
    Ok(score
        .and_then(|v| v.as_u64().or_else(|| v.as_f64().map(|f| f as u64)))
        .unwrap_or(0))
}

/// Time window a feed's "top" listing is computed over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Hour,
    Day,
    Week,
    #[default]
    Month,
    Year,
    All,
}

impl Timeframe {
    /// Wire name of the timeframe
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Hour => "hour",
            Timeframe::Day => "day",
            Timeframe::Week => "week",
            Timeframe::Month => "month",
            Timeframe::Year => "year",
            Timeframe::All => "all",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Timeframe {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hour" => Ok(Timeframe::Hour),
            "day" => Ok(Timeframe::Day),
            "week" => Ok(Timeframe::Week),
            "month" => Ok(Timeframe::Month),
            "year" => Ok(Timeframe::Year),
            "all" => Ok(Timeframe::All),
            other => Err(crate::Error::config(format!(
                "Unknown timeframe '{}'. Valid: hour, day, week, month, year, all",
                other
            ))),
        }
    }
}

/// Read-only view of the cache for health checks
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Health {
    pub item_count: usize,
    /// Seconds since the last refresh attempt
    pub age_seconds: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_item_defaults_missing_fields() {
        let item: RawItem = serde_json::from_str(r#"{"title": "hello"}"#).unwrap();
        assert_eq!(item.title, "hello");
        assert_eq!(item.selftext, "");
        assert_eq!(item.ups, 0);
        assert!(!item.is_gallery);
    }

    #[test]
    fn test_raw_item_null_fields() {
        let item: RawItem = serde_json::from_str(
            r#"{"title": null, "is_gallery": null, "ups": null, "post_hint": null}"#,
        )
        .unwrap();
        assert_eq!(item, RawItem::default());
    }

    #[test]
    fn test_raw_item_negative_and_float_scores() {
        let neg: RawItem = serde_json::from_str(r#"{"ups": -4}"#).unwrap();
        assert_eq!(neg.ups, 0);

        let float: RawItem = serde_json::from_str(r#"{"ups": 12.0}"#).unwrap();
        assert_eq!(float.ups, 12);
    }

    #[test]
    fn test_raw_item_score_beyond_i64_range() {
        let huge: RawItem = serde_json::from_str(r#"{"ups": 18446744073709551615}"#).unwrap();
        assert_eq!(huge.ups, u64::MAX);

        let above_i64: RawItem = serde_json::from_str(r#"{"ups": 9223372036854775808}"#).unwrap();
        assert_eq!(above_i64.ups, 9_223_372_036_854_775_808);

        let neg_float: RawItem = serde_json::from_str(r#"{"ups": -3.5}"#).unwrap();
        assert_eq!(neg_float.ups, 0);
    }

    #[test]
    fn test_primary_url_prefers_override() {
        let mut item = RawItem {
            url: "https://example.com/a".to_string(),
            ..Default::default()
        };
        assert_eq!(item.primary_url(), "https://example.com/a");

        item.url_overridden_by_dest = "https://i.example.com/b.png".to_string();
        assert_eq!(item.primary_url(), "https://i.example.com/b.png");
    }

    #[test]
    fn test_timeframe_parse_and_display() {
        assert_eq!("Month".parse::<Timeframe>().unwrap(), Timeframe::Month);
        assert_eq!(Timeframe::All.to_string(), "all");
        assert!("fortnight".parse::<Timeframe>().is_err());
        assert_eq!(Timeframe::default(), Timeframe::Month);
    }

    #[test]
    fn test_dedupe_key_ignores_case() {
        let a = AffirmationItem::new("Hello There", "t", "p");
        let b = AffirmationItem::new("hello there", "t", "p");
        assert_eq!(a.dedupe_key(), b.dedupe_key());
    }
}
