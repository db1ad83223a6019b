use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::Movie;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode movie document: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Whole-collection persistence for movies.
///
/// Writers follow load -> mutate -> save. Nothing serializes two writers, so
/// concurrent saves can drop each other's changes.
pub trait MovieRepository: Send + Sync {
    /// Returns every stored movie in insertion order. Never fails: an absent
    /// or unparseable document is an empty catalog.
    fn load(&self) -> Vec<Movie>;

    /// Replaces the stored collection with `movies`.
    fn save(&self, movies: &[Movie]) -> Result<(), StoreError>;

    fn find_by_id(&self, id: i64) -> Option<Movie> {
        self.load().into_iter().find(|m| m.id == id)
    }

    fn find_by_external_id(&self, imdb_id: &str) -> Option<Movie> {
        self.load().into_iter().find(|m| m.imdb_id.as_deref() == Some(imdb_id))
    }
}

/// Next free id: one past the largest id in use.
pub fn next_id(movies: &[Movie]) -> i64 {
    movies.iter().map(|m| m.id).max().unwrap_or(0) + 1
}

#[derive(Serialize)]
struct DocumentRef<'a> {
    movies: &'a [Movie],
}

/// Records stay untyped here so one bad entry cannot sink the rest.
#[derive(Deserialize)]
struct Document {
    #[serde(default)]
    movies: Vec<Value>,
}

/// A single JSON document of the form `{"movies": [...]}`.
#[derive(Clone, Debug)]
pub struct JsonMovieStore {
    path: PathBuf,
}

impl JsonMovieStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: io::Error) -> StoreError {
        StoreError::Io { path: self.path.clone(), source }
    }
}

impl MovieRepository for JsonMovieStore {
    fn load(&self) -> Vec<Movie> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "movie document absent");
                return Vec::new();
            },
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "failed to read movie document");
                return Vec::new();
            },
        };

        let doc = match serde_json::from_slice::<Document>(&raw) {
            Ok(doc) => doc,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "malformed movie document");
                return Vec::new();
            },
        };

        let now = Timestamp::now();
        doc.movies
            .iter()
            .enumerate()
            .filter_map(|(index, record)| {
                let movie = Movie::from_record(record, now);
                if movie.is_none() {
                    warn!(path = %self.path.display(), index, "skipping movie record without an id");
                }
                movie
            })
            .collect()
    }

    fn save(&self, movies: &[Movie]) -> Result<(), StoreError> {
        let body = serde_json::to_vec_pretty(&DocumentRef { movies })?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| self.io_err(e))?;
        }

        // Write beside the target and rename so readers never see a partial document.
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let write = || -> io::Result<()> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&body)?;
            file.write_all(b"\n")?;
            file.sync_all()?;
            fs::rename(&tmp, &self.path)
        };

        write().map_err(|e| {
            let _ = fs::remove_file(&tmp);
            self.io_err(e)
        })?;

        debug!(path = %self.path.display(), count = movies.len(), "saved movie document");
        Ok(())
    }
}
