pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod importer;
pub mod models;
pub mod routes;
pub mod scheduler;
pub mod store;
pub mod sync;
pub mod tmdb;

use std::sync::Arc;

use crate::{scheduler::Scheduler, store::MovieStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MovieStore>,
    pub scheduler: Arc<dyn Scheduler>,
}
