use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, patch, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use postdeck_api::auth::{self, AppState, AppStateInner};
use postdeck_api::middleware::require_auth;
use postdeck_api::{
    accounts, activities, analytics, automations, categories, library, media, posts, users,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "postdeck=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("POSTDECK_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("POSTDECK_DB_PATH").ok().map(PathBuf::from);
    let host = std::env::var("POSTDECK_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("POSTDECK_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Pick the backing store once, up front
    let storage = postdeck_db::connect(db_path.as_deref());

    // Shared state
    let app_state: AppState = Arc::new(AppStateInner {
        storage,
        jwt_secret,
    });

    // Routes
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .with_state(app_state.clone());

    let protected_routes = Router::new()
        .route("/api/me", get(users::me).patch(users::update_profile))
        .route("/api/me/password", put(users::change_password))
        .route("/api/posts", get(posts::list_posts).post(posts::create_post))
        .route("/api/posts/upcoming", get(posts::upcoming_posts))
        .route("/api/posts/top", get(posts::top_posts))
        .route(
            "/api/posts/{id}",
            patch(posts::update_post).delete(posts::delete_post),
        )
        .route(
            "/api/posts/{id}/comments",
            get(posts::list_comments).post(posts::create_comment),
        )
        .route(
            "/api/accounts",
            get(accounts::list_accounts).post(accounts::connect_account),
        )
        .route("/api/accounts/{id}/connection", patch(accounts::set_connected))
        .route("/api/accounts/{id}", delete(accounts::delete_account))
        .route(
            "/api/automations",
            get(automations::list_automations).post(automations::create_automation),
        )
        .route("/api/automations/{id}", patch(automations::update_automation))
        .route("/api/automations/{id}/toggle", post(automations::toggle_automation))
        .route(
            "/api/analytics",
            get(analytics::list_analytics).post(analytics::record_analytics),
        )
        .route("/api/analytics/summary", get(analytics::summary))
        .route(
            "/api/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/api/categories/{id}",
            patch(categories::update_category).delete(categories::delete_category),
        )
        .route("/api/media", get(media::list_media).post(media::create_media))
        .route(
            "/api/media/{id}",
            patch(media::update_media).delete(media::delete_media),
        )
        .route(
            "/api/library",
            get(library::list_items).post(library::create_item),
        )
        .route("/api/activities", get(activities::recent))
        .layer(middleware::from_fn(require_auth))
        .with_state(app_state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("postdeck server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
