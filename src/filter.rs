use serde::Deserialize;

use crate::{models::Movie, validation::FieldErrors};

/// Raw list query parameters as they arrive on the URL.
#[derive(Debug, Default, Deserialize)]
pub struct FilterParams {
    pub search: Option<String>,
    pub genre: Option<String>,
    pub min_rating: Option<String>,
    pub year: Option<String>,
    pub featured: Option<String>,
}

/// Conjunction of optional predicates over a movie collection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MovieFilter {
    search: Option<String>,
    genre: Option<String>,
    min_rating: Option<f64>,
    year: Option<i32>,
    featured: Option<bool>,
}

/// `"true"`, `"1"` and `"yes"` (any case) are truthy; everything else is false.
pub fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

fn non_empty(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl MovieFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the filter, rejecting numeric parameters that do not parse.
    pub fn from_params(params: &FilterParams) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();

        let min_rating = non_empty(&params.min_rating).and_then(|raw| {
            let parsed = raw.parse::<f64>().ok().filter(|r| r.is_finite());
            if parsed.is_none() {
                errors.add("min_rating", "must be a valid number");
            }
            parsed
        });

        let year = non_empty(&params.year).and_then(|raw| {
            let parsed = raw.parse::<i32>().ok();
            if parsed.is_none() {
                errors.add("year", "must be a valid integer");
            }
            parsed
        });

        let filter = Self {
            search: non_empty(&params.search).map(str::to_lowercase),
            genre: non_empty(&params.genre).map(str::to_lowercase),
            min_rating,
            year,
            featured: params.featured.as_deref().map(parse_flag),
        };
        errors.into_result(filter)
    }

    pub fn search(mut self, text: &str) -> Self {
        self.search = Some(text.to_lowercase());
        self
    }

    pub fn genre(mut self, genre: &str) -> Self {
        self.genre = Some(genre.to_lowercase());
        self
    }

    pub fn min_rating(mut self, rating: f64) -> Self {
        self.min_rating = Some(rating);
        self
    }

    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn featured(mut self, featured: bool) -> Self {
        self.featured = Some(featured);
        self
    }

    pub fn matches(&self, movie: &Movie) -> bool {
        if let Some(needle) = &self.search {
            let hit = movie.title.to_lowercase().contains(needle)
                || movie.description.to_lowercase().contains(needle);
            if !hit {
                return false;
            }
        }
        if self.genre.as_ref().is_some_and(|genre| movie.genre.to_lowercase() != *genre) {
            return false;
        }
        if self.min_rating.is_some_and(|min| movie.rating < min) {
            return false;
        }
        if self.year.is_some_and(|year| movie.release_year != year) {
            return false;
        }
        if self.featured.is_some_and(|featured| movie.is_featured != featured) {
            return false;
        }
        true
    }

    pub fn apply(&self, movies: Vec<Movie>) -> Vec<Movie> {
        movies.into_iter().filter(|m| self.matches(m)).collect()
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;

    use super::*;
    use crate::models::MovieChanges;

    fn movie(id: i64, title: &str, genre: &str, year: i32, rating: f64, featured: bool) -> Movie {
        Movie::create(
            id,
            MovieChanges {
                title: Some(title.to_string()),
                description: Some(format!("About {title}")),
                genre: Some(genre.to_string()),
                release_year: Some(year),
                rating: Some(rating),
                is_featured: Some(featured),
                ..Default::default()
            },
            Timestamp::now(),
        )
    }

    fn catalog() -> Vec<Movie> {
        vec![
            movie(1, "The Dark Knight", "Action", 2008, 9.0, true),
            movie(2, "Whiplash", "Drama", 2014, 8.5, false),
            movie(3, "Inception", "Action", 2010, 8.8, false),
            movie(4, "Moonlight", "Drama", 2016, 7.4, true),
        ]
    }

    fn ids(movies: &[Movie]) -> Vec<i64> {
        movies.iter().map(|m| m.id).collect()
    }

    #[test]
    fn genre_is_case_insensitive_exact() {
        for genre in ["action", "ACTION", "Action"] {
            let out = MovieFilter::new().genre(genre).apply(catalog());
            assert_eq!(ids(&out), vec![1, 3]);
        }
        assert!(MovieFilter::new().genre("act").apply(catalog()).is_empty());
    }

    #[test]
    fn search_matches_title_or_description() {
        assert_eq!(ids(&MovieFilter::new().search("KNIGHT").apply(catalog())), vec![1]);
        assert_eq!(ids(&MovieFilter::new().search("about moon").apply(catalog())), vec![4]);
    }

    #[test]
    fn predicates_compose() {
        let out = MovieFilter::new().min_rating(8.5).featured(false).apply(catalog());
        assert_eq!(ids(&out), vec![2, 3]);

        let out = MovieFilter::new().genre("drama").year(2016).apply(catalog());
        assert_eq!(ids(&out), vec![4]);
    }

    #[test]
    fn min_rating_is_inclusive() {
        assert_eq!(ids(&MovieFilter::new().min_rating(8.8).apply(catalog())), vec![1, 3]);
    }

    #[test]
    fn from_params_parses_and_rejects() {
        let params = FilterParams {
            min_rating: Some("8".into()),
            year: Some(" ".into()),
            featured: Some("Yes".into()),
            ..Default::default()
        };
        let filter = MovieFilter::from_params(&params).unwrap();
        assert_eq!(filter, MovieFilter::new().min_rating(8.0).featured(true));

        let params = FilterParams {
            min_rating: Some("high".into()),
            year: Some("2010.5".into()),
            ..Default::default()
        };
        let errors = MovieFilter::from_params(&params).unwrap_err();
        assert!(errors.contains("min_rating"));
        assert!(errors.contains("year"));
    }

    #[test]
    fn featured_tokens() {
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("no"));
        assert!(!parse_flag(""));
    }
}
