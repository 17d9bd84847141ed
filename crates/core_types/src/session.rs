use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The server-assigned context binding a set of uploaded documents to
/// subsequent questions. Exactly one session is live at a time; it is
/// created on a successful upload and destroyed on reset or when the
/// backend no longer recognises it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub uploaded_files: Vec<String>,
    pub qa_history: Vec<QaEntry>,
}

impl Session {
    pub fn new(id: impl Into<String>, uploaded_files: Vec<String>) -> Self {
        Self {
            id: id.into(),
            created_at: Utc::now(),
            uploaded_files,
            qa_history: Vec::new(),
        }
    }

    /// Trailing eight characters of the session id, for display.
    pub fn short_id(&self) -> &str {
        match self.id.char_indices().nth_back(7) {
            Some((index, _)) => &self.id[index..],
            None => &self.id,
        }
    }
}

/// One recorded question/answer exchange. Append-only; entries are
/// never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(with = "loose_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub references: Vec<Reference>,
}

/// A source document excerpt cited as evidence for an answer, with a
/// relevance score in [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reference {
    pub chunk: String,
    pub score: f32,
}

/// The backend emits naive ISO 8601 timestamps without an offset;
/// accept those as UTC while still accepting proper RFC 3339.
pub mod loose_timestamp {
    use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        if let Ok(with_offset) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(with_offset.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| Utc.from_utc_datetime(&naive))
            .map_err(serde::de::Error::custom)
    }
}
