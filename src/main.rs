use axum::{Router, routing::get};
use sound::{AppState, auth, db, friends, index, messages, profiles, res, rooms, settings};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, cookie::SameSite};
use tracing::info;

const UPLOAD_DIR: &str = "static/uploads";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let database_url =
        dotenv::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://sound.db?mode=rwc".to_owned());
    let db_pool = db::connect(&database_url).await.unwrap();
    db::init(&db_pool).await.unwrap();

    // avatar files referenced from user records land here
    std::fs::create_dir_all(UPLOAD_DIR).unwrap();

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(30)));

    let app_state = AppState { db_pool };

    let app = Router::new()
        .route("/", get(index::index))
        .route("/style.css", get(res::style))
        .merge(auth::router())
        .merge(profiles::router())
        .merge(friends::router())
        .merge(messages::router())
        .merge(rooms::router())
        .merge(settings::router())
        .with_state(app_state)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await.unwrap();
    info!("listening on {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.unwrap();
}
