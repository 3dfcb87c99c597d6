use serde::{Deserialize, Serialize};

/// Listing order requested from the remote API.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SortMode {
    Popularity,
    Rating,
}

impl SortMode {
    /// Sync order: popularity first, then rating.
    pub const ALL: [SortMode; 2] = [SortMode::Popularity, SortMode::Rating];

    pub fn as_api_path(self) -> &'static str {
        match self {
            SortMode::Popularity => "popular",
            SortMode::Rating => "top_rated",
        }
    }

    pub fn collection(self) -> Collection {
        match self {
            SortMode::Popularity => Collection::Popular,
            SortMode::Rating => Collection::TopRated,
        }
    }
}

impl std::fmt::Display for SortMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_api_path())
    }
}

/// Logical partition of the movie store.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Popular,
    TopRated,
    /// Declared for the read path; the sync pipeline never writes here.
    Favorite,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Popular => "popular",
            Collection::TopRated => "top_rated",
            Collection::Favorite => "favorite",
        }
    }

    pub fn from_id(s: &str) -> Option<Self> {
        match s {
            "popular" => Some(Collection::Popular),
            "top_rated" => Some(Collection::TopRated),
            "favorite" => Some(Collection::Favorite),
            _ => None,
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One movie as decoded from a listing page. Image paths are the API's
/// relative paths; `None` when the API sent `null` or the string `"null"`.
#[derive(Clone, Debug, PartialEq)]
pub struct MovieRecord {
    pub id: i64,
    pub title: String,
    pub poster_path: Option<String>,
    pub thumb_path: Option<String>,
    pub release_date: String,
    pub synopsis: String,
    pub rating: f64,
    pub popularity: f64,
}

/// A persisted movie with absolute image URLs.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MovieRow {
    pub movie_id: i64,
    pub title: String,
    pub release_date: String,
    pub synopsis: String,
    pub rating: f64,
    pub popularity: f64,
    pub poster_url: String,
    pub thumb_url: Option<String>,
}

/// Caller-specified read order.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovieOrder {
    #[default]
    Inserted,
    #[serde(alias = "popularity")]
    PopularityDesc,
    #[serde(alias = "rating")]
    RatingDesc,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub order: MovieOrder,
}
