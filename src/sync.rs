use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    error::SyncError,
    importer::Importer,
    models::SortMode,
    store::MovieStore,
    tmdb::TmdbClient,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageStats {
    pub pages_attempted: u32,
    pub pages_succeeded: u32,
    pub pages_failed: u32,
    pub rows_inserted: u64,
}

impl PageStats {
    pub fn merge(&mut self, other: &PageStats) {
        self.pages_attempted += other.pages_attempted;
        self.pages_succeeded += other.pages_succeeded;
        self.pages_failed += other.pages_failed;
        self.rows_inserted += other.rows_inserted;
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub popular: PageStats,
    pub top_rated: PageStats,
}

impl SyncReport {
    pub fn for_sort(&self, sort: SortMode) -> &PageStats {
        match sort {
            SortMode::Popularity => &self.popular,
            SortMode::Rating => &self.top_rated,
        }
    }

    fn for_sort_mut(&mut self, sort: SortMode) -> &mut PageStats {
        match sort {
            SortMode::Popularity => &mut self.popular,
            SortMode::Rating => &mut self.top_rated,
        }
    }

    pub fn total(&self) -> PageStats {
        let mut total = self.popular.clone();
        total.merge(&self.top_rated);
        total
    }
}

/// Fetch-then-import over every sort mode and page.
pub struct SyncService<S> {
    tmdb: Arc<TmdbClient>,
    importer: Importer<S>,
}

impl<S: MovieStore> SyncService<S> {
    pub fn new(tmdb: Arc<TmdbClient>, importer: Importer<S>) -> Self {
        Self { tmdb, importer }
    }

    /// One fetch and one import. Errors are returned, never retried.
    pub async fn sync_page(&self, sort: SortMode, page: u32) -> Result<u64, SyncError> {
        let records = self.tmdb.fetch_page(sort, page).await?;
        let inserted = self.importer.import(sort, records).await?;
        Ok(inserted)
    }

    /// Walks pages `1..=max_pages` for each sort mode in order. A failed
    /// page is logged and skipped; the run always reaches the last page.
    pub async fn run_once(&self) -> SyncReport {
        let mut report = SyncReport::default();
        let max_pages = self.tmdb.max_pages();

        for sort in SortMode::ALL {
            debug!(sort = %sort, max_pages, "syncing sort mode");
            for page in 1..=max_pages {
                let stats = report.for_sort_mut(sort);
                stats.pages_attempted += 1;
                match self.sync_page(sort, page).await {
                    Ok(rows) => {
                        stats.pages_succeeded += 1;
                        stats.rows_inserted += rows;
                    },
                    Err(err) => {
                        stats.pages_failed += 1;
                        warn!(sort = %sort, page, kind = err.kind(), error = %err, "skipping page");
                    },
                }
            }
        }

        let total = report.total();
        info!(
            pages = total.pages_attempted,
            failed = total.pages_failed,
            rows = total.rows_inserted,
            "sync finished"
        );
        report
    }
}
