//! Field-level validation of client-supplied movie bodies.
//!
//! Every rule runs independently so a single response lists every problem
//! with the candidate, keyed by field name.

use std::{collections::BTreeMap, fmt};

use serde::Serialize;
use serde_json::{Map, Value};
use url::Url;

use crate::models::{Movie, MovieChanges};

pub const MIN_RELEASE_YEAR: i64 = 1888;
pub const MAX_RELEASE_YEAR: i64 = 2100;
pub const MAX_DURATION_MINUTES: i64 = 600;
pub const MAX_RATING: f64 = 10.0;

const TITLE_MAX_LEN: usize = 200;
const GENRE_MAX_LEN: usize = 100;
const URL_MAX_LEN: usize = 500;
const URL_SCHEMES: [&str; 4] = ["http", "https", "ftp", "ftps"];

const REQUIRED: &str = "this field is required";
const BLANK: &str = "this field may not be blank";
const NULL: &str = "this field may not be null";

/// Error messages grouped by the field they refer to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn extend(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Checks a candidate body. `partial` relaxes the required-field rule (PATCH).
/// An empty result means the candidate is acceptable.
pub fn validate(candidate: &Value, partial: bool) -> FieldErrors {
    parse(candidate, partial).err().unwrap_or_default()
}

/// Validates and converts a candidate body into typed changes.
pub fn parse(candidate: &Value, partial: bool) -> Result<MovieChanges, FieldErrors> {
    let Some(obj) = candidate.as_object() else {
        return Err(FieldErrors::single("non_field_errors", "expected a JSON object"));
    };

    let mut v = Validator { obj, partial, errors: FieldErrors::new() };

    let changes = MovieChanges {
        title: v.text("title", Some(TITLE_MAX_LEN)),
        description: v.text("description", None),
        genre: v.text("genre", Some(GENRE_MAX_LEN)),
        release_year: v.integer("release_year", MIN_RELEASE_YEAR, MAX_RELEASE_YEAR),
        duration_minutes: v.integer("duration_minutes", 1, MAX_DURATION_MINUTES),
        rating: v.rating("rating"),
        thumbnail_url: v.url("thumbnail_url"),
        video_url: v.url("video_url"),
        is_featured: v.flag("is_featured"),
        imdb_id: v.external_id("imdb_id"),
    };

    v.errors.into_result(changes)
}

/// Rejects an external id already carried by a movie other than `current`.
pub fn ensure_unique_external_id(
    movies: &[Movie],
    imdb_id: &str,
    current: Option<i64>,
) -> Result<(), FieldErrors> {
    let taken =
        movies.iter().any(|m| m.imdb_id.as_deref() == Some(imdb_id) && Some(m.id) != current);
    if taken {
        Err(FieldErrors::single("imdb_id", "movie with this imdb_id already exists"))
    } else {
        Ok(())
    }
}

struct Validator<'a> {
    obj: &'a Map<String, Value>,
    partial: bool,
    errors: FieldErrors,
}

impl<'a> Validator<'a> {
    /// Looks up a field, recording required/null errors. Returns the value only
    /// when there is something to type-check.
    fn present(&mut self, field: &str) -> Option<&'a Value> {
        let obj = self.obj;
        match obj.get(field) {
            None => {
                if !self.partial {
                    self.errors.add(field, REQUIRED);
                }
                None
            },
            Some(Value::Null) => {
                self.errors.add(field, NULL);
                None
            },
            Some(value) => Some(value),
        }
    }

    fn text(&mut self, field: &str, max_len: Option<usize>) -> Option<String> {
        let value = self.present(field)?;
        let Value::String(s) = value else {
            self.errors.add(field, "must be a string");
            return None;
        };
        let s = s.trim().to_string();
        if s.is_empty() {
            self.errors.add(field, BLANK);
            return None;
        }
        if let Some(max) = max_len.filter(|max| s.chars().count() > *max) {
            self.errors.add(field, format!("ensure this field has no more than {max} characters"));
            return None;
        }
        Some(s)
    }

    fn integer(&mut self, field: &str, min: i64, max: i64) -> Option<i32> {
        let value = self.present(field)?;
        let parsed = match value {
            Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64().filter(|f| f.fract() == 0.0 && f.abs() < 1e15).map(|f| f as i64)
            }),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        let Some(n) = parsed else {
            self.errors.add(field, "must be a valid integer");
            return None;
        };
        if n < min || n > max {
            self.errors.add(field, format!("must be between {min} and {max}"));
            return None;
        }
        i32::try_from(n).ok()
    }

    fn rating(&mut self, field: &str) -> Option<f64> {
        let value = self.present(field)?;
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|f| f.is_finite());
        let Some(rating) = parsed else {
            self.errors.add(field, "must be a valid number");
            return None;
        };
        if !(0.0..=MAX_RATING).contains(&rating) {
            self.errors.add(field, "must be between 0 and 10");
            return None;
        }
        Some(rating)
    }

    fn url(&mut self, field: &str) -> Option<String> {
        let raw = self.text(field, Some(URL_MAX_LEN))?;
        if is_valid_url(&raw) {
            Some(raw)
        } else {
            self.errors.add(field, "must be a valid URL");
            None
        }
    }

    fn flag(&mut self, field: &str) -> Option<bool> {
        let obj = self.obj;
        let parsed = match obj.get(field)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Some(true),
                "false" | "0" | "no" => Some(false),
                _ => None,
            },
            _ => None,
        };
        if parsed.is_none() {
            self.errors.add(field, "must be a valid boolean");
        }
        parsed
    }

    fn external_id(&mut self, field: &str) -> Option<Option<String>> {
        let obj = self.obj;
        match obj.get(field)? {
            Value::Null => Some(None),
            Value::String(s) => {
                let s = s.trim();
                Some((!s.is_empty()).then(|| s.to_string()))
            },
            _ => {
                self.errors.add(field, "must be a string");
                None
            },
        }
    }
}

fn is_valid_url(raw: &str) -> bool {
    Url::parse(raw)
        .map(|u| URL_SCHEMES.contains(&u.scheme()) && u.host_str().is_some_and(|h| !h.is_empty()))
        .unwrap_or(false)
}
