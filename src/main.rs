use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod auth;
mod config;
mod db;
mod error;
mod handlers;
mod models;
mod services;

use auth::rate_limit::RateLimitState;
use config::Config;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub rate_limiter: RateLimitState,
}

fn build_router(state: AppState) -> Router {
    // Auth routes with rate limiting
    let auth_routes = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/refresh", post(handlers::auth::refresh))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::rate_limit::rate_limit_auth,
        ));

    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .merge(auth_routes);

    let protected_routes = Router::new()
        .route("/api/me", get(handlers::auth::me))
        .route("/api/auth/password", put(handlers::auth::update_password))
        .route("/api/auth/logout", post(handlers::auth::logout))
        // Pain entries
        .route("/api/entries", post(handlers::entries::upsert_entry))
        .route("/api/entries", get(handlers::entries::list_entries))
        .route("/api/entries/:date", get(handlers::entries::get_entry))
        .route("/api/symptoms", get(handlers::entries::list_symptoms))
        // Medications
        .route(
            "/api/medications",
            get(handlers::medications::list_medications),
        )
        .route(
            "/api/medications",
            post(handlers::medications::create_medication),
        )
        .route(
            "/api/medications/:id",
            delete(handlers::medications::delete_medication),
        )
        // Trends & report export
        .route("/api/trends", get(handlers::trends::get_trends))
        .route("/api/trends/report", get(handlers::report::download_report))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    let allowed_origins: Vec<axum::http::HeaderValue> = {
        let mut origins = vec![state
            .config
            .frontend_url
            .parse::<axum::http::HeaderValue>()
            .expect("FRONTEND_URL must be a valid origin")];
        // In dev, also allow LAN access (e.g. testing from another device)
        if let Ok(extra) = std::env::var("CORS_EXTRA_ORIGINS") {
            for o in extra.split(',') {
                if let Ok(hv) = o.trim().parse::<axum::http::HeaderValue>() {
                    origins.push(hv);
                }
            }
        }
        origins
    };
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        .allow_credentials(true);

    let api = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors);

    // The confirmation-email endpoint keeps the original function's contract:
    // callable from any origin, so it gets its own permissive CORS layer.
    let email_routes = Router::new()
        .route(
            "/api/send-entry-confirmation",
            post(handlers::email::send_confirmation),
        )
        .layer(CorsLayer::permissive());

    Router::new()
        .merge(api)
        .merge(email_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "paintrack_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env());

    // Database
    let db = db::create_pool(&config.database_url).await;

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations applied");

    let rate_limiter = RateLimitState::new();

    // Evict stale rate-limit windows in the background
    {
        let limiter = rate_limiter.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
            loop {
                interval.tick().await;
                limiter.cleanup().await;
            }
        });
    }

    let state = AppState {
        db,
        config: config.clone(),
        rate_limiter,
    };

    let app = build_router(state);

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    // Use into_make_service_with_connect_info to provide client IP for rate limiting
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let config = Config {
            database_url: "postgres://localhost/paintrack_test".into(),
            host: "127.0.0.1".into(),
            port: 0,
            frontend_url: "http://localhost:3000".into(),
            jwt_secret: "test-secret-not-for-production".into(),
            jwt_access_ttl_secs: 900,
            jwt_refresh_ttl_secs: 604_800,
            resend_api_key: String::new(),
            email_from: "Pain Tracker <onboarding@resend.dev>".into(),
        };
        // Lazy pool: never connects for routes that do not touch the DB
        let db = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .expect("lazy pool");
        AppState {
            db,
            config: Arc::new(config),
            rate_limiter: RateLimitState::new(),
        }
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = build_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["service"], "paintrack-api");
    }

    #[tokio::test]
    async fn test_protected_routes_require_auth() {
        for uri in [
            "/api/entries",
            "/api/medications",
            "/api/trends",
            "/api/trends/report",
            "/api/me",
        ] {
            let app = build_router(test_state());
            let response = app
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(
                response.status(),
                StatusCode::UNAUTHORIZED,
                "{} should be gated",
                uri
            );
        }
    }

    #[tokio::test]
    async fn test_garbage_bearer_token_is_rejected() {
        let app = build_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/trends")
                    .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_send_confirmation_requires_email() {
        for payload in [r#"{}"#, r#"{"email": ""}"#, r#"{"email": "   "}"#] {
            let app = build_router(test_state());
            let response = app
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/api/send-entry-confirmation")
                        .header(header::CONTENT_TYPE, "application/json")
                        .body(Body::from(payload))
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);

            let body = response.into_body().collect().await.unwrap().to_bytes();
            let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(json["error"], "Email is required");
        }
    }

    #[tokio::test]
    async fn test_send_confirmation_skips_without_api_key() {
        // No RESEND_API_KEY in the test config: the send is skipped, the
        // endpoint still reports success
        let app = build_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/send-entry-confirmation")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"email": "user@example.com"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
