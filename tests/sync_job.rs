//! SyncJob against an in-memory metadata source.

use std::collections::HashMap;

use movie_catalog::{
    omdb::{MetadataSource, OmdbError, OmdbLookup, OmdbTitle},
    store::{JsonMovieStore, MovieRepository},
    sync,
};

/// Serves canned titles. Ids listed in `broken` fail with a decode error.
#[derive(Default)]
struct FakeOmdb {
    titles: HashMap<String, OmdbTitle>,
    broken: Vec<String>,
}

impl FakeOmdb {
    fn with_title(mut self, imdb_id: &str, title: &str, runtime: &str, year: &str) -> Self {
        self.titles.insert(
            imdb_id.to_string(),
            OmdbTitle {
                title: Some(title.to_string()),
                plot: Some(format!("{title} plot")),
                genre: Some("Action".to_string()),
                year: Some(year.to_string()),
                runtime: Some(runtime.to_string()),
                poster: Some("https://img.example.com/p.jpg".to_string()),
                imdb_rating: Some("8.0".to_string()),
                imdb_id: Some(imdb_id.to_string()),
                director: Some("Someone".to_string()),
                ..Default::default()
            },
        );
        self
    }
}

impl MetadataSource for FakeOmdb {
    async fn lookup(&self, imdb_id: &str) -> Result<OmdbLookup, OmdbError> {
        if self.broken.iter().any(|id| id == imdb_id) {
            return Err(serde_json::from_str::<serde_json::Value>("<html>").unwrap_err().into());
        }
        Ok(match self.titles.get(imdb_id) {
            Some(title) => OmdbLookup::Found(title.clone()),
            None => OmdbLookup::NotFound("Incorrect IMDb ID.".to_string()),
        })
    }
}

fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn second_run_updates_instead_of_duplicating() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonMovieStore::new(dir.path().join("movies.json"));
    let source = FakeOmdb::default()
        .with_title("tt0133093", "The Matrix", "136 min", "1999")
        .with_title("tt0816692", "Interstellar", "169 min", "2014");
    let wanted = ids(&["tt0133093", "tt0816692"]);

    let first = sync::run(&source, &store, &wanted).await.unwrap();
    assert_eq!((first.created, first.updated, first.errors, first.total), (2, 0, 0, 2));

    let second = sync::run(&source, &store, &wanted).await.unwrap();
    assert_eq!((second.created, second.updated, second.errors, second.total), (0, 2, 0, 2));

    let movies = store.load();
    assert_eq!(movies.len(), 2);
    let matrix = store.find_by_external_id("tt0133093").unwrap();
    assert_eq!(matrix.duration_minutes, 136);
    assert_eq!(matrix.release_year, 1999);
    assert_eq!(matrix.metadata.director.as_deref(), Some("Someone"));
    assert!(matrix.updated_at >= matrix.created_at);
}

#[tokio::test]
async fn failures_are_counted_and_do_not_abort() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonMovieStore::new(dir.path().join("movies.json"));
    let mut source = FakeOmdb::default().with_title("tt1375666", "Inception", "N/A", "2010–2011");
    source.broken.push("tt0468569".to_string());

    let report = sync::run(&source, &store, &ids(&["tt0000000", "tt0468569", "tt1375666"]))
        .await
        .unwrap();
    assert_eq!((report.created, report.updated, report.errors), (1, 0, 2));

    let inception = store.find_by_external_id("tt1375666").unwrap();
    assert_eq!(inception.duration_minutes, 0);
    assert_eq!(inception.release_year, 2010);
    assert_eq!(inception.video_url, "");
    assert!(!inception.is_featured);
}

#[tokio::test]
async fn new_records_get_ids_after_existing_ones() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("movies.json");
    std::fs::write(
        &path,
        r#"{"movies": [{
            "id": 41, "title": "Handmade", "description": "d", "genre": "Drama",
            "release_year": 2001, "duration_minutes": 90, "rating": 6.0,
            "thumbnail_url": "https://a.example.com/x.jpg", "video_url": "https://a.example.com/x.mp4",
            "is_featured": true,
            "created_at": "2023-05-01T09:00:00", "updated_at": "2023-05-01T09:00:00"
        }]}"#,
    )
    .unwrap();
    let store = JsonMovieStore::new(&path);
    let source = FakeOmdb::default().with_title("tt0107290", "Jurassic Park", "127 min", "1993");

    let report = sync::run(&source, &store, &ids(&["tt0107290"])).await.unwrap();
    assert_eq!(report.total, 2);

    let movies = store.load();
    assert_eq!(movies[0].title, "Handmade");
    assert_eq!(movies[1].id, 42);
}

#[tokio::test]
async fn save_failure_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"x").unwrap();
    let store = JsonMovieStore::new(blocker.join("movies.json"));

    let source = FakeOmdb::default().with_title("tt0107290", "Jurassic Park", "127 min", "1993");
    assert!(sync::run(&source, &store, &ids(&["tt0107290"])).await.is_err());
}
