//! HTTP server wiring for sadbin (routes, middleware, and shared state).

/// HTTP error mapping for handlers.
pub mod error;
/// HTTP handlers for paste endpoints.
pub mod handlers;
/// Background sweeping of expired store entries.
pub mod maintenance;

pub use sadbin_core::{config, constants, models, AppError, Config, PasteService, PasteStore};

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use sadbin_core::language::{LanguageResolver, LexerCatalog};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

/// Extra body allowance for form encoding on top of the content limit.
///
/// URL-encoding can triple the size of non-ASCII content, and the other form
/// fields add their own bytes.
const FORM_OVERHEAD_BYTES: usize = 16 * 1024;

/// Shared state passed to HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PasteService>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Build the paste service over `store` with the bundled lexer catalog.
    pub fn new(config: Config, store: Arc<dyn PasteStore>) -> Self {
        let languages = Arc::new(LanguageResolver::new(LexerCatalog::shared()));
        let service = PasteService::new(&config, store, languages);
        Self {
            service: Arc::new(service),
            config: Arc::new(config),
        }
    }
}

/// Create the application router with all routes and middleware.
pub fn create_app(state: AppState) -> Router {
    let cors_port = state.config.port;
    create_app_with_cors_port(state, cors_port)
}

/// Resolve the listener address from env var overrides and security policy.
///
/// # Returns
/// A socket address that stays on loopback unless public access is enabled.
pub fn resolve_bind_address(config: &Config) -> SocketAddr {
    let default_bind = SocketAddr::from(([127, 0, 0, 1], config.port));
    let requested = match std::env::var("BIND") {
        Ok(value) => match value.trim().parse::<SocketAddr>() {
            Ok(addr) => addr,
            Err(err) => {
                tracing::warn!(
                    "Invalid BIND='{}': {}. Falling back to {}",
                    value,
                    err,
                    default_bind
                );
                default_bind
            }
        },
        Err(_) => default_bind,
    };

    if config.allow_public_access || requested.ip().is_loopback() {
        return requested;
    }

    tracing::warn!(
        "Non-loopback bind {} requested without ALLOW_PUBLIC_ACCESS; forcing 127.0.0.1",
        requested
    );
    SocketAddr::from(([127, 0, 0, 1], requested.port()))
}

fn local_origins(port: u16) -> Vec<HeaderValue> {
    [
        format!("http://localhost:{}", port),
        format!("http://127.0.0.1:{}", port),
    ]
    .into_iter()
    .filter_map(|origin| HeaderValue::from_str(&origin).ok())
    .collect()
}

fn create_app_with_cors_port(state: AppState, cors_port: u16) -> Router {
    let methods = [Method::GET, Method::POST];
    let cors = if state.config.allow_public_access {
        CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(methods)
            .allow_headers(tower_http::cors::Any)
    } else {
        CorsLayer::new()
            .allow_origin(local_origins(cors_port))
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
    };
    let body_limit = state
        .config
        .max_paste_size
        .saturating_mul(3)
        .saturating_add(FORM_OVERHEAD_BYTES);

    Router::new()
        .route(
            "/",
            get(handlers::paste::new_paste).post(handlers::paste::submit_paste),
        )
        .route("/api/preview", post(handlers::paste::preview_paste))
        .route("/api/languages", get(handlers::paste::list_languages))
        .route("/api/durations", get(handlers::paste::list_durations))
        .route(
            "/:id",
            get(handlers::paste::show_paste).post(handlers::paste::resubmit_paste),
        )
        .with_state(state)
        .layer(
            tower::ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(body_limit))
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors)
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_FRAME_OPTIONS,
                    HeaderValue::from_static("DENY"),
                )),
        )
}

fn listener_cors_port(listener: &tokio::net::TcpListener, fallback_port: u16) -> u16 {
    listener
        .local_addr()
        .map(|addr| addr.port())
        .unwrap_or(fallback_port)
}

/// Run the Axum server with graceful shutdown support.
///
/// # Errors
/// Returns any I/O error produced by `axum::serve`.
pub async fn serve_router(
    listener: tokio::net::TcpListener,
    state: AppState,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    let cors_port = listener_cors_port(&listener, state.config.port);
    let app = create_app_with_cors_port(state, cors_port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
}

#[cfg(test)]
mod tests {
    use super::{listener_cors_port, local_origins, resolve_bind_address};
    use sadbin_core::constants::DEFAULT_PORT;
    use sadbin_core::env::{env_lock, EnvGuard};
    use sadbin_core::Config;
    use std::net::SocketAddr;

    fn config_on_port(port: u16) -> Config {
        Config {
            port,
            ..Config::default()
        }
    }

    fn with_bind_env<T>(value: Option<&str>, check: impl FnOnce() -> T) -> T {
        let _lock = env_lock().lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let _bind = match value {
            Some(value) => EnvGuard::set("BIND", value),
            None => EnvGuard::remove("BIND"),
        };
        check()
    }

    #[tokio::test]
    async fn listener_cors_port_uses_bound_listener_port() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener");
        let expected = listener.local_addr().expect("listener addr").port();
        let resolved = listener_cors_port(&listener, DEFAULT_PORT);
        assert_eq!(resolved, expected);
    }

    #[test]
    fn resolve_bind_address_enforces_loopback_when_public_access_disabled() {
        let config = config_on_port(4040);
        let resolved = with_bind_env(Some("0.0.0.0:4040"), || resolve_bind_address(&config));
        assert_eq!(resolved.ip().to_string(), "127.0.0.1");
        assert_eq!(resolved.port(), 4040);
    }

    #[test]
    fn resolve_bind_address_honors_public_access() {
        let config = Config {
            allow_public_access: true,
            ..config_on_port(4042)
        };
        let resolved = with_bind_env(Some("0.0.0.0:4042"), || resolve_bind_address(&config));
        assert_eq!(resolved, SocketAddr::from(([0, 0, 0, 0], 4042)));
    }

    #[test]
    fn resolve_bind_address_allows_loopback_and_invalid_fallback() {
        let config = config_on_port(4041);
        let loopback = with_bind_env(None, || resolve_bind_address(&config));
        assert_eq!(loopback, SocketAddr::from(([127, 0, 0, 1], 4041)));

        let fallback = with_bind_env(Some("bad:host"), || resolve_bind_address(&config));
        assert_eq!(fallback, SocketAddr::from(([127, 0, 0, 1], 4041)));
    }

    #[test]
    fn bind_override_is_restored_after_each_check() {
        let before = {
            let _lock = env_lock().lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            std::env::var("BIND").ok()
        };
        let seen = with_bind_env(Some("0.0.0.0:4043"), || std::env::var("BIND").ok());
        assert_eq!(seen.as_deref(), Some("0.0.0.0:4043"));

        let _lock = env_lock().lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        assert_eq!(std::env::var("BIND").ok(), before);
    }

    #[test]
    fn local_origins_cover_both_loopback_names() {
        let origins = local_origins(8080);
        assert_eq!(origins.len(), 2);
        assert_eq!(origins[0], "http://localhost:8080");
    }
}
