pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::{PasswordHasher, TokenService};
use crate::config::{AppConfig, SecurityConfig};
use crate::database::Store;
use crate::handlers::{protected, public};
use crate::services::UserService;

/// Shared per-process state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub tokens: Arc<TokenService>,
    pub users: Arc<UserService>,
    pub cookie_secure: bool,
}

impl AppState {
    /// Build the hasher and token service from configuration. Bad work
    /// factors or an empty secret fail here, before the server binds.
    pub fn new(store: Store, security: &SecurityConfig) -> anyhow::Result<Self> {
        let hasher = PasswordHasher::new(&security.password)?;
        let tokens = TokenService::from_config(security)?;
        let users = UserService::new(&store, hasher)?;

        Ok(Self {
            store,
            tokens: Arc::new(tokens),
            users: Arc::new(users),
            cookie_secure: security.cookie_secure,
        })
    }
}

/// The full HTTP surface: public routes, session-protected routes and the
/// global middleware stack
pub fn app(state: AppState, config: &AppConfig) -> Router {
    let router = Router::new()
        .merge(public_routes())
        .merge(private_routes(state.clone()))
        .layer(TimeoutLayer::new(Duration::from_secs(config.api.request_timeout_secs)))
        .layer(RequestBodyLimitLayer::new(config.api.max_request_size_bytes))
        .layer(axum::middleware::map_response(middleware::envelope_bare_errors))
        .layer(cors_layer(&config.security.cors_origins))
        .with_state(state);

    if config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(public::root::root))
        .route("/health", get(public::root::health))
        .route(
            "/organizations",
            get(public::organization::list).post(public::organization::create),
        )
        .route("/auth/login", post(public::auth::login))
        .route("/auth/signup", post(public::auth::signup))
}

fn private_routes(state: AppState) -> Router<AppState> {
    use protected::{auth, operator, organization, preset, sensor, thing, user};

    Router::new()
        // Session
        .route("/auth/whoami", get(auth::whoami))
        .route("/auth/logout", post(auth::logout))
        // Caller's organization
        .route(
            "/organization",
            get(organization::get)
                .put(organization::update)
                .delete(organization::delete),
        )
        // Users
        .route("/users", get(user::list).post(user::create).put(user::update))
        .route("/users/promote", put(user::promote))
        .route("/users/:userId", get(user::get).delete(user::delete))
        // Things
        .route("/things", get(thing::list).post(thing::create))
        .route(
            "/things/:thingId",
            get(thing::get).put(thing::update).delete(thing::delete),
        )
        // Sensors
        .route("/sensors", post(sensor::create))
        .route(
            "/sensors/sensorId/:sensorId",
            get(sensor::get).put(sensor::update).delete(sensor::delete),
        )
        .route("/sensors/thingId/:thingId", get(sensor::list_by_thing))
        .route(
            "/sensors/thingId/:thingId/lastUpdate/:lastUpdate",
            get(sensor::list_updated_since),
        )
        // Presets
        .route("/chartpresets", post(preset::create_chart))
        .route("/chartpresets/thingId/:thingId", get(preset::list_charts))
        .route(
            "/chartpresets/:presetId",
            put(preset::update_chart).delete(preset::delete_chart),
        )
        .route("/rawdatapresets", post(preset::create_raw))
        .route("/rawdatapresets/thingId/:thingId", get(preset::list_raw))
        .route(
            "/rawdatapresets/:presetId",
            put(preset::update_raw).delete(preset::delete_raw),
        )
        // Operators
        .route("/operators", get(operator::list).post(operator::create))
        .route(
            "/operators/:operatorId",
            put(operator::update).delete(operator::delete),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::require_session,
        ))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
