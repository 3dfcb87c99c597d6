use std::{num::NonZeroU32, sync::Arc};

use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::{
    error::FetchError,
    models::{MovieRecord, SortMode},
};

/// Fetches listing pages from the movie database API.
pub struct TmdbClient {
    client: wreq::Client,
    api_key: String,
    base_url: String,
    max_pages: u32,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl TmdbClient {
    pub fn new(
        client: wreq::Client,
        api_key: String,
        base_url: String,
        max_pages: u32,
        rps: u32,
    ) -> Self {
        if api_key.trim().is_empty() {
            tracing::warn!("no TMDB_API_KEY provided, listing requests will be rejected upstream");
        }

        let quota = Quota::per_second(NonZeroU32::new(rps).unwrap_or(NonZeroU32::MIN));
        let limiter = Arc::new(RateLimiter::direct(quota));
        Self { client, api_key, base_url, max_pages, limiter }
    }

    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    /// Endpoint for a sort mode; the page and key go in the query string.
    pub fn listing_url(&self, sort: SortMode) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), sort.as_api_path())
    }

    /// Fetches and decodes one page. Pages outside `1..=max_pages` yield an
    /// empty list without a request being made.
    pub async fn fetch_page(
        &self,
        sort: SortMode,
        page: u32,
    ) -> Result<Vec<MovieRecord>, FetchError> {
        if page == 0 || page > self.max_pages {
            debug!(sort = %sort, page, max_pages = self.max_pages, "page outside quota, skipping request");
            return Ok(Vec::new());
        }

        self.limiter.until_ready().await;

        let page_param = page.to_string();
        let body = self
            .client
            .get(self.listing_url(sort))
            .query(&[("api_key", self.api_key.as_str()), ("page", page_param.as_str())])
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        if body.is_empty() {
            return Err(FetchError::EmptyResponse);
        }

        let movies = decode_page(&body)?;
        debug!(sort = %sort, page, movies = movies.len(), "fetched listing page");
        Ok(movies)
    }
}

/// Strict decode of a listing envelope. Any element missing a required
/// field fails the whole page.
pub fn decode_page(body: &[u8]) -> Result<Vec<MovieRecord>, serde_json::Error> {
    let resp: ListingResponse = serde_json::from_slice(body)?;
    if let Some(total_pages) = resp.total_pages {
        debug!(total_pages, "listing reports total pages");
    }
    Ok(resp.results.into_iter().map(MovieRecord::from).collect())
}

#[derive(Debug, Deserialize)]
struct ListingResponse {
    results: Vec<ListingMovie>,
    #[serde(default)]
    total_pages: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ListingMovie {
    id: i64,
    #[serde(deserialize_with = "nullable_text")]
    original_title: String,
    // Required key, nullable value.
    #[serde(deserialize_with = "image_path")]
    poster_path: Option<String>,
    #[serde(default, deserialize_with = "image_path")]
    backdrop_path: Option<String>,
    #[serde(deserialize_with = "nullable_text")]
    release_date: String,
    #[serde(deserialize_with = "nullable_text")]
    overview: String,
    vote_average: f64,
    popularity: f64,
}

impl From<ListingMovie> for MovieRecord {
    fn from(m: ListingMovie) -> Self {
        Self {
            id: m.id,
            title: m.original_title,
            poster_path: m.poster_path,
            thumb_path: m.backdrop_path,
            release_date: m.release_date,
            synopsis: m.overview,
            rating: m.vote_average,
            popularity: m.popularity,
        }
    }
}

/// The API sometimes sends the string `"null"` instead of JSON `null`.
fn image_path<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|p| p != "null"))
}

/// Required key whose value may be JSON `null`, kept as the text `"null"`.
fn nullable_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.unwrap_or_else(|| "null".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie_json(poster: &str, backdrop: &str) -> String {
        format!(
            r#"{{"id":550,"original_title":"Fight Club","poster_path":{poster},
            "backdrop_path":{backdrop},"release_date":"1999-10-15",
            "overview":"An insomniac office worker.","vote_average":8.433,"popularity":61.416}}"#
        )
    }

    #[test]
    fn decodes_listing_fields() {
        let body = format!(
            r#"{{"page":1,"results":[{}],"total_pages":500}}"#,
            movie_json(r#""/poster.jpg""#, r#""/backdrop.jpg""#)
        );
        let movies = decode_page(body.as_bytes()).unwrap();
        assert_eq!(
            movies,
            vec![MovieRecord {
                id: 550,
                title: "Fight Club".to_string(),
                poster_path: Some("/poster.jpg".to_string()),
                thumb_path: Some("/backdrop.jpg".to_string()),
                release_date: "1999-10-15".to_string(),
                synopsis: "An insomniac office worker.".to_string(),
                rating: 8.433,
                popularity: 61.416,
            }]
        );
    }

    #[test]
    fn null_string_and_json_null_paths_are_absent() {
        let body = format!(
            r#"{{"results":[{},{}]}}"#,
            movie_json(r#""null""#, r#""null""#),
            movie_json("null", "null")
        );
        let movies = decode_page(body.as_bytes()).unwrap();
        assert_eq!(movies.len(), 2);
        assert!(movies.iter().all(|m| m.poster_path.is_none() && m.thumb_path.is_none()));
    }

    #[test]
    fn missing_backdrop_is_tolerated() {
        let body = r#"{"results":[{"id":1,"original_title":"A","poster_path":"/a.jpg",
            "release_date":"2020-01-01","overview":"","vote_average":7.0,"popularity":1.5}]}"#;
        let movies = decode_page(body.as_bytes()).unwrap();
        assert_eq!(movies[0].thumb_path, None);
    }

    #[test]
    fn missing_required_field_fails_whole_page() {
        let body = format!(
            r#"{{"results":[{},{{"id":2,"original_title":"No Rating","poster_path":"/b.jpg",
            "release_date":"2020-01-01","overview":"","popularity":1.0}}]}}"#,
            movie_json(r#""/a.jpg""#, "null")
        );
        assert!(decode_page(body.as_bytes()).is_err());
    }

    #[test]
    fn null_text_fields_keep_the_movie() {
        let body = format!(
            r#"{{"results":[{},{{"id":2,"original_title":null,"poster_path":"/b.jpg",
            "release_date":null,"overview":null,"vote_average":6.1,"popularity":3.0}}]}}"#,
            movie_json(r#""/a.jpg""#, "null")
        );
        let movies = decode_page(body.as_bytes()).unwrap();
        assert_eq!(movies.len(), 2);
        assert_eq!(movies[1].title, "null");
        assert_eq!(movies[1].release_date, "null");
        assert_eq!(movies[1].synopsis, "null");
        assert_eq!(movies[1].poster_path.as_deref(), Some("/b.jpg"));
    }

    #[test]
    fn missing_overview_key_fails() {
        let body = r#"{"results":[{"id":1,"original_title":"A","poster_path":"/a.jpg",
            "release_date":"2020-01-01","vote_average":7.0,"popularity":1.5}]}"#;
        assert!(decode_page(body.as_bytes()).is_err());
    }

    #[test]
    fn missing_poster_key_fails() {
        let body = r#"{"results":[{"id":1,"original_title":"A","release_date":"2020-01-01",
            "overview":"","vote_average":7.0,"popularity":1.5}]}"#;
        assert!(decode_page(body.as_bytes()).is_err());
    }

    #[test]
    fn envelope_without_results_fails() {
        assert!(decode_page(br#"{"status_code":7,"status_message":"Invalid API key"}"#).is_err());
        assert!(decode_page(b"not json").is_err());
    }

    #[tokio::test]
    async fn listing_url_appends_sort_path() {
        let client = TmdbClient::new(
            wreq::Client::builder().build().unwrap(),
            "key".to_string(),
            "https://api.example.test/3/movie/".to_string(),
            10,
            4,
        );
        assert_eq!(client.listing_url(SortMode::Popularity), "https://api.example.test/3/movie/popular");
        assert_eq!(client.listing_url(SortMode::Rating), "https://api.example.test/3/movie/top_rated");
    }
}
