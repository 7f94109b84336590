use axum::{
    Router,
    extract::FromRef,
    http::{HeaderName, HeaderValue, Method, header},
    middleware,
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod password;
pub mod slug;
pub mod stores;
pub mod token;

// Routers split by access level (public, authenticated).
pub mod routes;
use routes::{authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::{ApiError, ApiResult};
pub use stores::{
    ArticleStoreState, AuthorStoreState, ImageStoreState, PgArticleStore, PgAuthorStore,
    PgImageStore, PgUserStore, UserStoreState,
};
pub use token::{TokenError, TokenService};

/// ApiDoc
///
/// OpenAPI description of the HTTP surface, served at `/api-docs/openapi.json`
/// and browsable under `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::login, handlers::auth::register, handlers::auth::get_current_user,
        handlers::authors::get_authors, handlers::authors::get_author,
        handlers::authors::create_author, handlers::authors::update_author,
        handlers::authors::delete_author,
        handlers::images::get_image, handlers::images::create_image,
        handlers::images::delete_image,
        handlers::articles::get_articles, handlers::articles::get_article,
        handlers::articles::create_article, handlers::articles::update_article,
        handlers::articles::delete_article, handlers::articles::get_article_images,
        handlers::articles::attach_article_image
    ),
    components(
        schemas(
            models::Author, models::Article, models::Image, models::UserResponse,
            models::LoginRequest, models::RegisterRequest, models::AuthResponse,
            models::AuthorCreate, models::AuthorUpdate, models::ArticleCreate,
            models::ArticleUpdate, models::ImageCreate, models::AttachImageRequest,
            models::MessageResponse, models::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "skinny-cms", description = "Articles, authors and images")
    )
)]
struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// AppState
///
/// Shared, cheaply clonable container for the stores, the token service and the
/// configuration. Handlers take `State<AppState>`; extractors pull single parts via `FromRef`.
#[derive(Clone)]
pub struct AppState {
    pub users: UserStoreState,
    pub authors: AuthorStoreState,
    pub articles: ArticleStoreState,
    pub images: ImageStoreState,
    pub tokens: TokenService,
    pub config: AppConfig,
}

impl AppState {
    /// Assembles the state, building the token service from the configuration.
    pub fn new(
        users: UserStoreState,
        authors: AuthorStoreState,
        articles: ArticleStoreState,
        images: ImageStoreState,
        config: AppConfig,
    ) -> Result<Self, TokenError> {
        let tokens = TokenService::new(&config)?;
        Ok(Self {
            users,
            authors,
            articles,
            images,
            tokens,
            config,
        })
    }

    /// State backed by Postgres stores sharing one pool.
    pub fn postgres(pool: sqlx::PgPool, config: AppConfig) -> Result<Self, TokenError> {
        Self::new(
            std::sync::Arc::new(PgUserStore::new(pool.clone())),
            std::sync::Arc::new(PgAuthorStore::new(pool.clone())),
            std::sync::Arc::new(PgArticleStore::new(pool.clone())),
            std::sync::Arc::new(PgImageStore::new(pool)),
            config,
        )
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for TokenService {
    fn from_ref(app_state: &AppState) -> TokenService {
        app_state.tokens.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// cors_layer
///
/// The one CORS policy for the whole API: the configured origin only, with
/// credentials. Preflight requests are answered by the layer itself.
pub fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origin = match HeaderValue::from_str(&config.cors_origin) {
        Ok(origin) => AllowOrigin::list([origin]),
        Err(_) => {
            tracing::warn!(origin = %config.cors_origin, "invalid CORS origin, cross-origin requests disabled");
            AllowOrigin::list(Vec::<HeaderValue>::new())
        }
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// create_router
///
/// Assembles routes, middleware and state into the service.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::auth_middleware,
            )),
        )
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(
                    x_request_id.clone(),
                    MakeRequestUuid,
                ))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// Request span carrying method, uri and the `x-request-id` assigned above,
/// so every log line of a request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
