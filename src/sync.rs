//! One-shot import of OMDb metadata into the movie store.
//!
//! Titles are fetched one at a time. A failed or unknown id is logged and
//! counted, never fatal; the collection is saved once at the end.

use jiff::Timestamp;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    models::{ExternalMetadata, Movie, MovieChanges},
    omdb::{MetadataSource, OmdbLookup, OmdbTitle},
    store::{MovieRepository, StoreError, next_id},
};

pub const DEFAULT_IMDB_IDS: [&str; 19] = [
    "tt0848228", // The Avengers
    "tt0816692", // Interstellar
    "tt0133093", // The Matrix
    "tt1375666", // Inception
    "tt4154796", // Avengers: Endgame
    "tt2488496", // Star Wars: The Force Awakens
    "tt4154756", // Avengers: Infinity War
    "tt1877830", // The Batman
    "tt0499549", // Avatar
    "tt1630029", // Avatar: The Way of Water
    "tt0468569", // The Dark Knight
    "tt2975590", // Batman v Superman: Dawn of Justice
    "tt3606756", // Jungle Book
    "tt0381061", // Casino Royale
    "tt0167260", // The Lord of the Rings: The Return of the King
    "tt0120737", // The Lord of the Rings: The Fellowship of the Ring
    "tt3749900", // The Nice Guys
    "tt0107290", // Jurassic Park
    "tt0110413", // Léon: The Professional
];

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
    pub errors: usize,
    /// Records in the store after saving.
    pub total: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Upsert {
    Created(i64),
    Updated(i64),
}

pub async fn run<S: MetadataSource>(
    source: &S,
    store: &dyn MovieRepository,
    imdb_ids: &[String],
) -> Result<SyncReport, StoreError> {
    let mut movies = store.load();
    let mut report = SyncReport::default();

    info!(ids = imdb_ids.len(), existing = movies.len(), "starting OMDb sync");

    for imdb_id in imdb_ids {
        match source.lookup(imdb_id).await {
            Ok(OmdbLookup::Found(payload)) => {
                let (changes, metadata) = map_title(imdb_id, payload);
                let title = changes.title.clone().unwrap_or_default();
                match upsert(&mut movies, imdb_id, changes, metadata, Timestamp::now()) {
                    Upsert::Created(id) => {
                        report.created += 1;
                        info!(%imdb_id, id, %title, "added");
                    },
                    Upsert::Updated(id) => {
                        report.updated += 1;
                        info!(%imdb_id, id, %title, "updated");
                    },
                }
            },
            Ok(OmdbLookup::NotFound(reason)) => {
                report.errors += 1;
                warn!(%imdb_id, %reason, "title not found on OMDb");
            },
            Err(err) => {
                report.errors += 1;
                warn!(%imdb_id, error = %err, "failed to fetch title");
            },
        }
    }

    store.save(&movies)?;
    report.total = movies.len();

    info!(
        created = report.created,
        updated = report.updated,
        errors = report.errors,
        total = report.total,
        "OMDb sync finished"
    );
    Ok(report)
}

/// Inserts a new record or merges into the one already carrying `imdb_id`.
/// Featured flag and video URL of an existing record are left alone.
pub fn upsert(
    movies: &mut Vec<Movie>,
    imdb_id: &str,
    changes: MovieChanges,
    metadata: ExternalMetadata,
    now: Timestamp,
) -> Upsert {
    if let Some(existing) = movies.iter_mut().find(|m| m.imdb_id.as_deref() == Some(imdb_id)) {
        changes.apply_to(existing);
        existing.metadata = metadata;
        existing.touch(now);
        return Upsert::Updated(existing.id);
    }

    let id = next_id(movies);
    let mut movie = Movie::create(id, changes, now);
    movie.imdb_id = Some(imdb_id.to_string());
    movie.metadata = metadata;
    movies.push(movie);
    Upsert::Created(id)
}

pub fn map_title(imdb_id: &str, payload: OmdbTitle) -> (MovieChanges, ExternalMetadata) {
    let duration = payload.runtime.as_deref().map(parse_runtime).unwrap_or(0);
    let year = payload.year.as_deref().map(parse_year).unwrap_or(0);
    let rating = payload.imdb_rating.as_deref().map(parse_rating).unwrap_or(0.0);

    if payload.imdb_id.as_deref().is_some_and(|id| id != imdb_id) {
        debug!(requested = %imdb_id, returned = ?payload.imdb_id, "OMDb returned a different id");
    }

    let changes = MovieChanges {
        title: Some(payload.title.unwrap_or_default()),
        description: Some(payload.plot.unwrap_or_default()),
        genre: Some(payload.genre.unwrap_or_default()),
        release_year: Some(year),
        duration_minutes: Some(duration),
        rating: Some(rating),
        thumbnail_url: Some(payload.poster.unwrap_or_default()),
        video_url: None,
        is_featured: None,
        imdb_id: Some(Some(imdb_id.to_string())),
    };

    let metadata = ExternalMetadata {
        director: Some(payload.director.unwrap_or_default()),
        actors: Some(payload.actors.unwrap_or_default()),
        writer: Some(payload.writer.unwrap_or_default()),
        language: Some(payload.language.unwrap_or_default()),
        country: Some(payload.country.unwrap_or_default()),
        awards: Some(payload.awards.unwrap_or_default()),
        metascore: Some(payload.metascore.unwrap_or_default()),
        vote_count: Some(payload.imdb_votes.unwrap_or_default()),
    };

    (changes, metadata)
}

/// `"136 min"` -> 136. Anything else is 0.
pub fn parse_runtime(raw: &str) -> i32 {
    let raw = raw.trim();
    raw.strip_suffix("min").unwrap_or(raw).trim().parse().unwrap_or(0)
}

/// First year of `"2003"`, `"2003–2004"` or `"2003–"`. Anything else is 0.
pub fn parse_year(raw: &str) -> i32 {
    raw.split(['–', '-']).next().unwrap_or_default().trim().parse().unwrap_or(0)
}

pub fn parse_rating(raw: &str) -> f64 {
    raw.trim().parse::<f64>().ok().filter(|r| r.is_finite()).unwrap_or(0.0)
}
