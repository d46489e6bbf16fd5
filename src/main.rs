use axum::{routing::get, routing::patch, routing::post, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use taskhub_api::config;
use taskhub_api::database::Database;
use taskhub_api::handlers;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::info!("Starting Taskhub API in {:?} mode", config.environment);

    // The server still starts when the datastore is down; /health reports
    // degraded until migrations can be applied.
    if let Err(e) = Database::migrate().await {
        tracing::error!("Could not apply migrations at startup: {}", e);
    }

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("TASKHUB_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("Taskhub API listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(handlers::health::health_get))
        // Resource routes
        .merge(user_routes())
        .merge(team_routes())
        .merge(project_routes())
        .merge(task_routes())
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn user_routes() -> Router {
    use taskhub_api::handlers::user;

    Router::new()
        // Session management
        .route("/user/register", post(user::register))
        .route("/user/login", post(user::login))
        .route("/user/logout", post(user::logout))
        .route("/user/me", get(user::me))
        // Scoped listing and admin-only membership/role management
        .route("/user/", get(user::list))
        .route(
            "/user/:user_id/team",
            patch(user::assign_team).delete(user::remove_from_team),
        )
        .route("/user/:user_id/role", patch(user::assign_role))
}

fn team_routes() -> Router {
    use taskhub_api::handlers::team;

    Router::new()
        .route("/team/create", post(team::create))
        .route("/team/", get(team::list))
        .route("/team/:team_id", patch(team::update).delete(team::delete))
        .route("/team/:team_id/members", get(team::members))
}

fn project_routes() -> Router {
    use taskhub_api::handlers::project;

    Router::new().route("/project/create", post(project::create))
}

fn task_routes() -> Router {
    use taskhub_api::handlers::task;

    Router::new().route("/task/create", post(task::create))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Taskhub API",
            "version": version,
            "description": "Role-based project and task management API built with Rust (Axum)",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "session": "/user/register, /user/login, /user/logout (public)",
                "user": "/user/me, /user/, /user/:id/team, /user/:id/role (session)",
                "team": "/team/create, /team/, /team/:id, /team/:id/members (session)",
                "project": "/project/create (session)",
                "task": "/task/create (session)",
            }
        }
    }))
}
