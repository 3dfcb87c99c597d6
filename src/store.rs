use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::{
    entities::movie_entry,
    error::StoreError,
    models::{Collection, MovieOrder, MovieRow},
};

/// Row store partitioned by collection. Writes only ever append.
#[async_trait]
pub trait MovieStore: Send + Sync {
    /// Appends `rows` to `collection` in a single call and returns how many
    /// were written. An empty batch is a no-op returning 0.
    async fn bulk_insert(&self, collection: Collection, rows: Vec<MovieRow>)
    -> Result<u64, StoreError>;

    async fn list(
        &self,
        collection: Collection,
        order: MovieOrder,
    ) -> Result<Vec<MovieRow>, StoreError>;

    /// First row stored for `movie_id`; duplicates from repeated syncs are possible.
    async fn find(
        &self,
        collection: Collection,
        movie_id: i64,
    ) -> Result<Option<MovieRow>, StoreError>;
}

#[derive(Clone)]
pub struct SqliteMovieStore {
    db: DatabaseConnection,
}

impl SqliteMovieStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MovieStore for SqliteMovieStore {
    async fn bulk_insert(
        &self,
        collection: Collection,
        rows: Vec<MovieRow>,
    ) -> Result<u64, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let now = now_sec();
        let models = rows.into_iter().map(|row| movie_entry::ActiveModel {
            id: Default::default(),
            collection: Set(collection.as_str().to_string()),
            movie_id: Set(row.movie_id),
            title: Set(row.title),
            release_date: Set(row.release_date),
            synopsis: Set(row.synopsis),
            rating: Set(row.rating),
            popularity: Set(row.popularity),
            poster_url: Set(row.poster_url),
            thumb_url: Set(row.thumb_url),
            inserted_at: Set(now),
        });

        let txn = self.db.begin().await.map_err(StoreError::Write)?;
        let inserted = movie_entry::Entity::insert_many(models)
            .exec_without_returning(&txn)
            .await
            .map_err(StoreError::Write)?;
        txn.commit().await.map_err(StoreError::Write)?;

        Ok(inserted)
    }

    async fn list(
        &self,
        collection: Collection,
        order: MovieOrder,
    ) -> Result<Vec<MovieRow>, StoreError> {
        let query = movie_entry::Entity::find()
            .filter(movie_entry::Column::Collection.eq(collection.as_str()));

        let query = match order {
            MovieOrder::Inserted => query,
            MovieOrder::PopularityDesc => query.order_by_desc(movie_entry::Column::Popularity),
            MovieOrder::RatingDesc => query.order_by_desc(movie_entry::Column::Rating),
        };

        let rows = query
            .order_by_asc(movie_entry::Column::Id)
            .all(&self.db)
            .await
            .map_err(StoreError::Read)?;

        Ok(rows.into_iter().map(MovieRow::from).collect())
    }

    async fn find(
        &self,
        collection: Collection,
        movie_id: i64,
    ) -> Result<Option<MovieRow>, StoreError> {
        let row = movie_entry::Entity::find()
            .filter(movie_entry::Column::Collection.eq(collection.as_str()))
            .filter(movie_entry::Column::MovieId.eq(movie_id))
            .order_by_asc(movie_entry::Column::Id)
            .one(&self.db)
            .await
            .map_err(StoreError::Read)?;

        Ok(row.map(MovieRow::from))
    }
}

impl From<movie_entry::Model> for MovieRow {
    fn from(m: movie_entry::Model) -> Self {
        Self {
            movie_id: m.movie_id,
            title: m.title,
            release_date: m.release_date,
            synopsis: m.synopsis,
            rating: m.rating,
            popularity: m.popularity,
            poster_url: m.poster_url,
            thumb_url: m.thumb_url,
        }
    }
}

fn now_sec() -> i64 {
    jiff::Timestamp::now().as_second()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn row(movie_id: i64, rating: f64, popularity: f64) -> MovieRow {
        MovieRow {
            movie_id,
            title: format!("Movie {movie_id}"),
            release_date: "2015-06-09".to_string(),
            synopsis: String::new(),
            rating,
            popularity,
            poster_url: format!("http://img.test/w185/{movie_id}.jpg"),
            thumb_url: None,
        }
    }

    async fn store() -> (SqliteMovieStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("store.db").display());
        let db = db::connect_and_migrate(&url).await.unwrap();
        (SqliteMovieStore::new(db), dir)
    }

    #[tokio::test]
    async fn bulk_insert_is_scoped_to_collection() {
        let (store, _dir) = store().await;

        let n = store
            .bulk_insert(Collection::Popular, vec![row(1, 7.1, 30.0), row(2, 8.2, 10.0)])
            .await
            .unwrap();
        assert_eq!(n, 2);

        let popular = store.list(Collection::Popular, MovieOrder::Inserted).await.unwrap();
        let top = store.list(Collection::TopRated, MovieOrder::Inserted).await.unwrap();
        assert_eq!(popular.len(), 2);
        assert!(top.is_empty());
    }

    #[tokio::test]
    async fn empty_batch_writes_nothing() {
        let (store, _dir) = store().await;
        assert_eq!(store.bulk_insert(Collection::TopRated, Vec::new()).await.unwrap(), 0);
        assert!(store.list(Collection::TopRated, MovieOrder::Inserted).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_honours_requested_order() {
        let (store, _dir) = store().await;
        store
            .bulk_insert(
                Collection::Popular,
                vec![row(1, 6.0, 50.0), row(2, 9.0, 5.0), row(3, 7.5, 20.0)],
            )
            .await
            .unwrap();

        let ids = |rows: Vec<MovieRow>| rows.into_iter().map(|r| r.movie_id).collect::<Vec<_>>();

        let inserted = store.list(Collection::Popular, MovieOrder::Inserted).await.unwrap();
        assert_eq!(ids(inserted), vec![1, 2, 3]);
        let by_rating = store.list(Collection::Popular, MovieOrder::RatingDesc).await.unwrap();
        assert_eq!(ids(by_rating), vec![2, 3, 1]);
        let by_popularity =
            store.list(Collection::Popular, MovieOrder::PopularityDesc).await.unwrap();
        assert_eq!(ids(by_popularity), vec![1, 3, 2]);
    }

    #[tokio::test]
    async fn rating_keeps_full_precision() {
        let (store, _dir) = store().await;
        store.bulk_insert(Collection::TopRated, vec![row(9, 8.456789123, 1.0)]).await.unwrap();

        let found = store.find(Collection::TopRated, 9).await.unwrap().unwrap();
        assert_eq!(found.rating, 8.456789123);
        assert!(store.find(Collection::Popular, 9).await.unwrap().is_none());
    }
}
