use std::sync::Arc;

use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use popmovies::{
    AppState,
    config::Config,
    db,
    importer::{ImageBase, Importer},
    routes,
    scheduler::{Scheduler, TokioScheduler},
    store::SqliteMovieStore,
    sync::SyncService,
    tmdb::TmdbClient,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,popmovies=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Config::from_env()?;

    let http = wreq::Client::builder().timeout(config.http_timeout).build()?;

    let db = db::connect_and_migrate(&config.database_url).await?;
    let store = Arc::new(SqliteMovieStore::new(db));

    let tmdb = TmdbClient::new(
        http,
        config.tmdb_api_key.clone(),
        config.tmdb_base_url.clone(),
        config.max_pages,
        config.tmdb_rps,
    );
    let importer = Importer::new(
        store.clone(),
        ImageBase { poster: config.poster_base_url.clone(), thumb: config.thumb_base_url.clone() },
    );
    let sync = Arc::new(SyncService::new(Arc::new(tmdb), importer));

    let scheduler = Arc::new(TokioScheduler::spawn(move || {
        let sync = sync.clone();
        async move {
            sync.run_once().await;
        }
    }));
    scheduler.register_periodic(config.sync_interval, config.sync_flex);
    if config.sync_on_start {
        scheduler.trigger_now();
    }

    let state = AppState { store, scheduler };

    let app = routes::create_app(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
