use jiff::Timestamp;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub genre: String,
    pub release_year: i32,
    pub duration_minutes: i32,
    pub rating: f64,
    pub thumbnail_url: String,
    pub video_url: String,
    pub is_featured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: Timestamp,
    #[serde(with = "timestamp")]
    pub updated_at: Timestamp,
    #[serde(flatten)]
    pub metadata: ExternalMetadata,
}

/// Extra fields only the OMDb sync fills in.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ExternalMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actors: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub writer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub awards: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metascore: Option<String>,
    #[serde(rename = "imdb_votes", skip_serializing_if = "Option::is_none")]
    pub vote_count: Option<String>,
}

/// Typed field values accepted from a client. `None` leaves a field untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MovieChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub release_year: Option<i32>,
    pub duration_minutes: Option<i32>,
    pub rating: Option<f64>,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub is_featured: Option<bool>,
    pub imdb_id: Option<Option<String>>,
}

impl MovieChanges {
    pub fn apply_to(self, movie: &mut Movie) {
        if let Some(title) = self.title {
            movie.title = title;
        }
        if let Some(description) = self.description {
            movie.description = description;
        }
        if let Some(genre) = self.genre {
            movie.genre = genre;
        }
        if let Some(year) = self.release_year {
            movie.release_year = year;
        }
        if let Some(minutes) = self.duration_minutes {
            movie.duration_minutes = minutes;
        }
        if let Some(rating) = self.rating {
            movie.rating = rating;
        }
        if let Some(url) = self.thumbnail_url {
            movie.thumbnail_url = url;
        }
        if let Some(url) = self.video_url {
            movie.video_url = url;
        }
        if let Some(featured) = self.is_featured {
            movie.is_featured = featured;
        }
        if let Some(imdb_id) = self.imdb_id {
            movie.imdb_id = imdb_id;
        }
    }
}

impl Movie {
    pub fn create(id: i64, changes: MovieChanges, now: Timestamp) -> Self {
        let mut movie = Self {
            id,
            title: String::new(),
            description: String::new(),
            genre: String::new(),
            release_year: 0,
            duration_minutes: 0,
            rating: 0.0,
            thumbnail_url: String::new(),
            video_url: String::new(),
            is_featured: false,
            imdb_id: None,
            created_at: now,
            updated_at: now,
            metadata: ExternalMetadata::default(),
        };
        changes.apply_to(&mut movie);
        movie
    }

    /// Marks the record as modified, never moving `updated_at` before `created_at`.
    pub fn touch(&mut self, now: Timestamp) {
        self.updated_at = now.max(self.created_at);
    }

    /// Reads one stored record field by field. Missing or mistyped fields fall
    /// back to defaults; only a record without a usable integer `id` is rejected.
    /// Absent timestamps borrow from each other, then from `now`.
    pub fn from_record(record: &Value, now: Timestamp) -> Option<Self> {
        let obj = record.as_object()?;
        let id = obj.get("id").and_then(loose_int)?;

        let created_at = obj.get("created_at").and_then(loose_timestamp);
        let updated_at = obj.get("updated_at").and_then(loose_timestamp);
        let created_at = created_at.or(updated_at).unwrap_or(now);
        let updated_at = updated_at.unwrap_or(created_at).max(created_at);

        let text = |field: &str| field_text(obj, field).unwrap_or_default();
        let int = |field: &str| {
            obj.get(field).and_then(loose_int).and_then(|n| i32::try_from(n).ok()).unwrap_or(0)
        };

        Some(Self {
            id,
            title: text("title"),
            description: text("description"),
            genre: text("genre"),
            release_year: int("release_year"),
            duration_minutes: int("duration_minutes"),
            rating: obj.get("rating").and_then(loose_float).unwrap_or(0.0),
            thumbnail_url: text("thumbnail_url"),
            video_url: text("video_url"),
            is_featured: obj.get("is_featured").and_then(loose_bool).unwrap_or(false),
            imdb_id: field_text(obj, "imdb_id").filter(|s| !s.trim().is_empty()),
            created_at,
            updated_at,
            metadata: ExternalMetadata {
                director: field_text(obj, "director"),
                actors: field_text(obj, "actors"),
                writer: field_text(obj, "writer"),
                language: field_text(obj, "language"),
                country: field_text(obj, "country"),
                awards: field_text(obj, "awards"),
                metascore: field_text(obj, "metascore"),
                vote_count: field_text(obj, "imdb_votes"),
            },
        })
    }
}

fn field_text(obj: &Map<String, Value>, field: &str) -> Option<String> {
    match obj.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn loose_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && f.abs() < 1e15).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn loose_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|f: &f64| f.is_finite())
}

fn loose_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        Value::String(s) => Some(matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")),
        _ => None,
    }
}

fn loose_timestamp(value: &Value) -> Option<Timestamp> {
    value.as_str().and_then(|raw| timestamp::parse(raw.trim()).ok())
}

/// RFC 3339 on write; offset-less ISO 8601 datetimes are read as UTC.
pub(crate) mod timestamp {
    use jiff::{Timestamp, civil::DateTime, tz::TimeZone};
    use serde::Serializer;

    pub fn serialize<S>(ts: &Timestamp, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(ts)
    }

    pub fn parse(raw: &str) -> Result<Timestamp, jiff::Error> {
        if let Ok(ts) = raw.parse::<Timestamp>() {
            return Ok(ts);
        }
        let naive: DateTime = raw.parse()?;
        Ok(naive.to_zoned(TimeZone::UTC)?.timestamp())
    }
}
