//! Represents a movie record and the input shapes accepted for it.
//!
//! `Movie` is the stored row and the response body. `MovieCreate` and
//! `MovieUpdate` are request bodies; both are checked with `validator`
//! before they reach `MovieService`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use sqlx::FromRow;
use validator::{Validate, ValidationError};

pub const TITLE_MAX_LEN: u64 = 200;
pub const DIRECTOR_MAX_LEN: u64 = 100;
pub const GENRE_MAX_LEN: u64 = 50;
pub const YEAR_MIN: i32 = 1888;
pub const YEAR_MAX: i32 = 2100;
pub const RATING_MIN: f64 = 0.0;
pub const RATING_MAX: f64 = 10.0;

/// A single movie as stored in the `movies` table.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq)]
pub struct Movie {
    /// Store-assigned primary key. Never reused.
    pub id: i64,

    pub title: String,

    pub director: Option<String>,

    /// Release year.
    pub year: Option<i32>,

    pub genre: Option<String>,

    /// Score between 0.0 and 10.0.
    pub rating: Option<f64>,

    /// Free-form synopsis, no length limit.
    pub description: Option<String>,

    /// Set by the store at insertion; never changes afterwards.
    pub created_at: DateTime<Utc>,

    /// Set by the store on every update. `None` until the first one.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body of `POST /api/movies`.
#[derive(Deserialize, Validate, Clone, Debug, Default)]
pub struct MovieCreate {
    #[validate(length(min = 1, max = TITLE_MAX_LEN))]
    pub title: String,

    #[validate(length(max = DIRECTOR_MAX_LEN))]
    pub director: Option<String>,

    #[validate(range(min = YEAR_MIN, max = YEAR_MAX))]
    pub year: Option<i32>,

    #[validate(length(max = GENRE_MAX_LEN))]
    pub genre: Option<String>,

    #[validate(range(min = RATING_MIN, max = RATING_MAX))]
    pub rating: Option<f64>,

    pub description: Option<String>,
}

/// Body of `PUT /api/movies/{id}`.
///
/// Every field is tri-state: `None` when the key is absent from the body,
/// `Some(None)` when it is an explicit `null`, `Some(Some(v))` otherwise.
/// Only present keys are applied by [`MovieUpdate::merge_into`].
#[derive(Deserialize, Validate, Clone, Debug, Default)]
#[validate(schema(function = "reject_null_title"))]
pub struct MovieUpdate {
    #[serde(default, with = "double_option")]
    #[validate(length(min = 1, max = TITLE_MAX_LEN))]
    pub title: Option<Option<String>>,

    #[serde(default, with = "double_option")]
    #[validate(length(max = DIRECTOR_MAX_LEN))]
    pub director: Option<Option<String>>,

    #[serde(default, with = "double_option")]
    #[validate(range(min = YEAR_MIN, max = YEAR_MAX))]
    pub year: Option<Option<i32>>,

    #[serde(default, with = "double_option")]
    #[validate(length(max = GENRE_MAX_LEN))]
    pub genre: Option<Option<String>>,

    #[serde(default, with = "double_option")]
    #[validate(range(min = RATING_MIN, max = RATING_MAX))]
    pub rating: Option<Option<f64>>,

    #[serde(default, with = "double_option")]
    pub description: Option<Option<String>>,
}

/// The title column is NOT NULL, so an explicit `"title": null` is refused
/// instead of being treated as absent.
fn reject_null_title(update: &MovieUpdate) -> Result<(), ValidationError> {
    if matches!(update.title, Some(None)) {
        return Err(
            ValidationError::new("title_null").with_message("title cannot be null".into())
        );
    }
    Ok(())
}

impl MovieUpdate {
    /// Apply the fields present in this update on top of `existing` and
    /// return the resulting record. Identity and timestamps are carried over
    /// untouched; the store refreshes `updated_at` when the row is written.
    pub fn merge_into(self, existing: Movie) -> Movie {
        let Movie {
            id,
            title,
            director,
            year,
            genre,
            rating,
            description,
            created_at,
            updated_at,
        } = existing;

        Movie {
            id,
            title: self.title.flatten().unwrap_or(title),
            director: self.director.unwrap_or(director),
            year: self.year.unwrap_or(year),
            genre: self.genre.unwrap_or(genre),
            rating: self.rating.unwrap_or(rating),
            description: self.description.unwrap_or(description),
            created_at,
            updated_at,
        }
    }

    /// Names of the keys present in the body, in column order.
    pub fn present_fields(&self) -> Vec<&'static str> {
        [
            ("title", self.title.is_some()),
            ("director", self.director.is_some()),
            ("year", self.year.is_some()),
            ("genre", self.genre.is_some()),
            ("rating", self.rating.is_some()),
            ("description", self.description.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, present)| present.then_some(name))
        .collect()
    }
}
