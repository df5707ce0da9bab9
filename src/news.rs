// src/news.rs
// News row shape as served by the row store, plus the lenient helpers the
// dashboard needs: one-or-many annotation decoding, sentiment labels and
// relative timestamps.

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Immutable snapshot of one ingested article at fetch time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewsRecord {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "nullable_list")]
    pub tickers: Vec<String>,
    #[serde(default, deserialize_with = "nullable_list")]
    pub keywords: Vec<String>,
    /// Source publication time, semantically UTC.
    pub published_utc: Option<String>,
    /// Ingestion time, semantically UTC.
    pub created_at: Option<String>,
    pub article_url: Option<String>,
    /// Per-ticker sentiment annotations. The store may deliver these as
    /// absent, a bare object, a keyed map or an array; all shapes flatten
    /// into one list.
    #[serde(default, deserialize_with = "one_or_many")]
    pub insights: Vec<Insight>,
    /// Model-level sentiment annotations, same shape leniency as `insights`.
    #[serde(default, deserialize_with = "one_or_many")]
    pub sentiment_insights: Vec<SentimentInsight>,
}

impl NewsRecord {
    pub fn has_ai_analysis(&self) -> bool {
        !self.sentiment_insights.is_empty()
    }
}

/// Rule-derived per-ticker annotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    pub ticker: String,
    pub sentiment: String,
    #[serde(default)]
    pub sentiment_reasoning: String,
}

impl Insight {
    pub fn label(&self) -> Sentiment {
        Sentiment::parse(&self.sentiment)
    }
}

/// Model-derived per-ticker annotation with confidences and a score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentInsight {
    pub ticker: String,
    pub base_sentiment: String,
    #[serde(default)]
    pub conf_model: f64,
    #[serde(default)]
    pub conf_rule: f64,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub index: i64,
}

impl SentimentInsight {
    pub fn label(&self) -> Sentiment {
        Sentiment::parse(&self.base_sentiment)
    }
}

/// Normalized sentiment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
    Unknown,
}

impl Sentiment {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "positive" => Sentiment::Positive,
            "negative" => Sentiment::Negative,
            "neutral" => Sentiment::Neutral,
            _ => Sentiment::Unknown,
        }
    }

    /// Classify a numeric sentiment score the way the detail view renders it.
    pub fn from_score(score: f64) -> Self {
        if score > 0.6 {
            Sentiment::Positive
        } else if score < 0.4 {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }
}

/// `null` array columns decode to an empty list.
fn nullable_list<'de, D>(d: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(d)?.unwrap_or_default())
}

fn one_or_many<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let v = Option::<Value>::deserialize(d)?.unwrap_or(Value::Null);
    Ok(flatten_annotations(v))
}

/// Flatten the annotation column shapes into one list:
/// null → empty, array → elements, bare record → one element,
/// keyed map → flattened values (recursively, values may again be
/// one-or-many). Unparseable entries are dropped.
fn flatten_annotations<T: DeserializeOwned>(v: Value) -> Vec<T> {
    match v {
        Value::Array(items) => items
            .into_iter()
            .flat_map(flatten_annotations::<T>)
            .collect(),
        Value::Object(map) => {
            let direct = serde_json::from_value::<T>(Value::Object(map.clone()));
            match direct {
                Ok(one) => vec![one],
                Err(_) => map
                    .into_iter()
                    .flat_map(|(_, v)| flatten_annotations::<T>(v))
                    .collect(),
            }
        }
        _ => Vec::new(),
    }
}

/// Parse a store timestamp leniently: RFC 3339 first, then a naive
/// `YYYY-MM-DD[T ]HH:MM:SS[.frac]` assumed to be UTC (Postgres emits
/// `created_at` without a zone suffix).
pub fn parse_timestamp_utc(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    None
}

/// Human relative age of a timestamp, as shown in the list view.
pub fn time_ago(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(ts);
    if diff < TimeDelta::minutes(1) {
        return "just now".to_string();
    }
    if diff < TimeDelta::hours(1) {
        return format!("{}m ago", diff.num_minutes());
    }
    if diff < TimeDelta::days(1) {
        return format!("{}h ago", diff.num_hours());
    }
    if diff < TimeDelta::days(7) {
        return format!("{}d ago", diff.num_days());
    }
    ts.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: Value) -> NewsRecord {
        serde_json::from_value(v).expect("valid news record json")
    }

    #[test]
    fn absent_and_null_annotations_decode_empty() {
        let r = record(json!({ "id": "n1" }));
        assert!(r.insights.is_empty());
        assert!(r.sentiment_insights.is_empty());
        assert!(r.tickers.is_empty());

        let r = record(json!({ "id": "n2", "insights": null, "tickers": null }));
        assert!(r.insights.is_empty());
        assert!(r.tickers.is_empty());
    }

    #[test]
    fn bare_object_annotation_becomes_one_element_list() {
        let r = record(json!({
            "id": "n1",
            "insights": { "ticker": "AAPL", "sentiment": "positive" }
        }));
        assert_eq!(r.insights.len(), 1);
        assert_eq!(r.insights[0].ticker, "AAPL");
        assert_eq!(r.insights[0].label(), Sentiment::Positive);
    }

    #[test]
    fn keyed_map_annotations_flatten_values() {
        let r = record(json!({
            "id": "n1",
            "insights": {
                "AAPL": { "ticker": "AAPL", "sentiment": "negative" },
                "TSLA": [
                    { "ticker": "TSLA", "sentiment": "neutral" },
                    { "ticker": "TSLA", "sentiment": "positive" }
                ]
            }
        }));
        assert_eq!(r.insights.len(), 3);
    }

    #[test]
    fn array_annotations_decode_in_order() {
        let r = record(json!({
            "id": "n1",
            "sentiment_insights": [
                { "ticker": "MSFT", "base_sentiment": "positive", "score": 0.8 },
                { "ticker": "MSFT", "base_sentiment": "weird" }
            ]
        }));
        assert_eq!(r.sentiment_insights.len(), 2);
        assert_eq!(r.sentiment_insights[0].label(), Sentiment::Positive);
        assert_eq!(r.sentiment_insights[1].label(), Sentiment::Unknown);
        assert!(r.has_ai_analysis());
    }

    #[test]
    fn score_classification_matches_detail_view() {
        assert_eq!(Sentiment::from_score(0.85), Sentiment::Positive);
        assert_eq!(Sentiment::from_score(0.2), Sentiment::Negative);
        assert_eq!(Sentiment::from_score(0.5), Sentiment::Neutral);
    }

    #[test]
    fn timestamps_without_zone_are_read_as_utc() {
        let a = parse_timestamp_utc("2026-08-20T09:30:00Z").unwrap();
        let b = parse_timestamp_utc("2026-08-20T09:30:00").unwrap();
        let c = parse_timestamp_utc("2026-08-20 09:30:00.123456").unwrap();
        assert_eq!(a, b);
        assert_eq!(b.date_naive(), c.date_naive());
        assert!(parse_timestamp_utc("not a time").is_none());
    }

    #[test]
    fn time_ago_buckets() {
        let now = parse_timestamp_utc("2026-08-23T12:00:00Z").unwrap();
        let at = |s: &str| parse_timestamp_utc(s).unwrap();
        assert_eq!(time_ago(at("2026-08-23T11:59:40Z"), now), "just now");
        assert_eq!(time_ago(at("2026-08-23T11:15:00Z"), now), "45m ago");
        assert_eq!(time_ago(at("2026-08-23T06:00:00Z"), now), "6h ago");
        assert_eq!(time_ago(at("2026-08-20T12:00:00Z"), now), "3d ago");
        assert_eq!(time_ago(at("2026-07-01T12:00:00Z"), now), "2026-07-01");
    }
}
