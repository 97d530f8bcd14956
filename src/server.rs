//! Router assembly and the serve loop.

use std::path::Path;

use axum::{
    Router,
    extract::{DefaultBodyLimit, Request},
    handler::HandlerWithoutStateExt,
    http::{Method, Uri},
    middleware::map_request,
    routing::get,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    LatencyUnit,
    cors::{AllowHeaders, Any, CorsLayer},
    normalize_path::NormalizePathLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info};

use crate::body::BODY_LIMIT;
use crate::handler;
use crate::store::DocumentStore;

/// Route prefixes matched without regard to case.
const PREFIXES: [&str; 2] = ["collections", "Images"];

/// Build the gateway over `store`, serving static files from `static_dir`
/// under `/Images`.
///
/// Paths are rewritten before routing: one trailing slash is dropped and the
/// `/collections` and `/Images` prefixes match in any case. Path parameters
/// keep their case.
pub fn app<S: DocumentStore>(store: S, static_dir: impl AsRef<Path>) -> Router {
    Router::new().fallback_service(routes(store, static_dir)).layer(
        ServiceBuilder::new()
            .layer(NormalizePathLayer::trim_trailing_slash())
            .layer(map_request(canonical_prefix)),
    )
}

fn routes<S: DocumentStore>(store: S, static_dir: impl AsRef<Path>) -> Router {
    let images = ServeDir::new(static_dir)
        .call_fallback_on_method_not_allowed(true)
        .fallback(handler::not_found.into_service());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers(AllowHeaders::mirror_request());

    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        );

    Router::new()
        .route("/", get(handler::root).fallback(handler::not_found))
        .route(
            "/collections/{collectionName}",
            get(handler::get_all::<S>)
                .post(handler::create::<S>)
                .fallback(handler::not_found),
        )
        .route(
            "/collections/{collectionName}/{id}",
            get(handler::get_one::<S>)
                .put(handler::update::<S>)
                .delete(handler::delete::<S>)
                .fallback(handler::not_found),
        )
        .nest_service("/Images", images)
        .fallback(handler::not_found)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(cors)
        .layer(trace)
        .with_state(store)
}

async fn canonical_prefix(mut req: Request) -> Request {
    if let Some(uri) = canonical_uri(req.uri()) {
        *req.uri_mut() = uri;
    }
    req
}

/// `uri` with its first path segment replaced by the canonical spelling of a
/// case-insensitive prefix, or `None` when nothing changes.
fn canonical_uri(uri: &Uri) -> Option<Uri> {
    let rest = uri.path().strip_prefix('/')?;
    let head = rest.split('/').next()?;
    let canonical = PREFIXES
        .into_iter()
        .find(|prefix| *prefix != head && prefix.eq_ignore_ascii_case(head))?;

    let mut path_and_query = format!("/{canonical}{}", &rest[head.len()..]);
    if let Some(query) = uri.query() {
        path_and_query.push('?');
        path_and_query.push_str(query);
    }

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(path_and_query.parse().ok()?);
    Uri::from_parts(parts).ok()
}

/// Serve `app` on `listener` until Ctrl-C or SIGTERM, then drain in-flight
/// requests.
pub async fn serve(listener: TcpListener, app: Router) -> std::io::Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    info!("shutdown signal received, draining connections");
}
