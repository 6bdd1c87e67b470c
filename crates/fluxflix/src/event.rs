use chrono::{DateTime, Utc};

/// A single observation emitted by an [`EventStream`](crate::EventStream).
///
/// Events are created fresh on every emission and never persisted. When the
/// `serde` feature is enabled they serialize as
/// `{"movieId": "...", "observedAt": "2025-01-01T00:00:00.000Z"}`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct MovieEvent {
    movie_id: String,
    #[cfg_attr(feature = "serde", serde(with = "rfc3339_millis"))]
    observed_at: DateTime<Utc>,
}

impl MovieEvent {
    /// Builds an event from a movie id and a timestamp in milliseconds since
    /// the Unix epoch.
    ///
    /// Timestamps beyond what [`DateTime`] can represent saturate to the
    /// epoch.
    pub fn new(movie_id: impl Into<String>, observed_at_millis: u64) -> Self {
        let observed_at = i64::try_from(observed_at_millis)
            .ok()
            .and_then(DateTime::from_timestamp_millis)
            .unwrap_or_default();
        Self {
            movie_id: movie_id.into(),
            observed_at,
        }
    }

    pub fn movie_id(&self) -> &str {
        &self.movie_id
    }

    pub const fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }

    /// Milliseconds since the Unix epoch at which the event was produced.
    pub fn observed_at_millis(&self) -> u64 {
        self.observed_at.timestamp_millis().max(0) as u64
    }
}

#[cfg(feature = "serde")]
mod rfc3339_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
