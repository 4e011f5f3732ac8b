use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use dotenvy::dotenv;
use http::header::{HeaderValue, CACHE_CONTROL};
use sqlx::sqlite::SqlitePoolOptions;
use std::env;
use std::net::SocketAddr;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use matchday::services::notifier_service::Notifier;
use matchday::services::sweep_service;
use matchday::web::middleware::auth as auth_middleware;
use matchday::web::routes::{activity, admin, AppState};

#[tokio::main]
async fn main() {
    dotenv().ok();

    // 1. Start logging
    tracing_subscriber::fmt::init();
    info!("matchday build {}", env!("MATCHDAY_BUILD_ID"));

    // 2. Connect to the database and apply migrations
    let db_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set in .env");
    let pool = SqlitePoolOptions::new()
        .connect(&db_url)
        .await
        .expect("Cannot connect to DB");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Cannot run migrations");

    let state = AppState {
        pool: pool.clone(),
        notifier: Notifier::from_env(),
    };

    // 3. Periodic payment-deadline sweep
    let sweep_interval: u64 = env::var("SWEEP_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(300);
    tokio::spawn(sweep_service::run_periodic(
        pool.clone(),
        state.notifier.clone(),
        sweep_interval,
    ));

    // 4. Protected routes under one middleware layer
    let protected_routes = Router::new()
        .route("/activities/:activity_id", get(activity::roster_handler))
        .route(
            "/activities/:activity_id/register",
            post(activity::register_handler),
        )
        .route(
            "/activities/:activity_id/cancel",
            post(activity::cancel_handler),
        )
        .route(
            "/activities/:activity_id/waitlist",
            get(activity::waitlist_handler),
        )
        .route(
            "/activities/:activity_id/payment/mark",
            post(activity::mark_payment_handler),
        )
        .route(
            "/activities/:activity_id/registrations/:registration_id/verify",
            post(admin::verify_payment_handler),
        )
        .route(
            "/activities/:activity_id/registrations/:registration_id",
            delete(admin::remove_registration_handler),
        )
        .layer(middleware::from_fn(auth_middleware::require_auth));

    // 5. Build the whole application
    let app = Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .merge(protected_routes)
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .with_state(state);

    // 6. Start the server (with fallback port)
    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .expect("Cannot parse host/port");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!(
                "Could not bind {}: {}. Trying fallback {}:{}",
                addr,
                e,
                host,
                port + 1
            );
            let fallback: SocketAddr = format!("{}:{}", host, port + 1)
                .parse()
                .expect("Cannot parse fallback");
            tokio::net::TcpListener::bind(fallback)
                .await
                .expect("Cannot bind fallback port")
        }
    };

    let bound_addr = listener.local_addr().unwrap();
    info!("server listening on http://{}", bound_addr);

    axum::serve(listener, app).await.unwrap();
}
