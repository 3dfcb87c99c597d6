use std::sync::Arc;

use tracing::debug;

use crate::{
    error::StoreError,
    models::{MovieRecord, MovieRow, SortMode},
    store::MovieStore,
};

/// Prefixes joined onto the API's relative image paths.
#[derive(Clone, Debug)]
pub struct ImageBase {
    pub poster: String,
    pub thumb: String,
}

/// Turns decoded listing records into store rows and appends them.
pub struct Importer<S> {
    store: Arc<S>,
    images: ImageBase,
}

impl<S: MovieStore> Importer<S> {
    pub fn new(store: Arc<S>, images: ImageBase) -> Self {
        Self { store, images }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Drops records without a poster and maps the rest field-for-field.
    /// Image URLs are plain concatenation of base and relative path.
    pub fn to_rows(&self, records: Vec<MovieRecord>) -> Vec<MovieRow> {
        records
            .into_iter()
            .filter_map(|r| {
                let poster = r.poster_path?;
                Some(MovieRow {
                    movie_id: r.id,
                    title: r.title,
                    release_date: r.release_date,
                    synopsis: r.synopsis,
                    rating: r.rating,
                    popularity: r.popularity,
                    poster_url: format!("{}{}", self.images.poster, poster),
                    thumb_url: r.thumb_path.map(|t| format!("{}{}", self.images.thumb, t)),
                })
            })
            .collect()
    }

    /// One bulk insert into the collection backing `sort`. No dedup: the
    /// same movie imported twice yields two rows.
    pub async fn import(
        &self,
        sort: SortMode,
        records: Vec<MovieRecord>,
    ) -> Result<u64, StoreError> {
        let received = records.len();
        let rows = self.to_rows(records);
        debug!(sort = %sort, received, kept = rows.len(), "mapped listing records");

        if rows.is_empty() {
            return Ok(0);
        }
        self.store.bulk_insert(sort.collection(), rows).await
    }
}
