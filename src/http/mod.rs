pub mod handlers;

use crate::yolink_api::YoLinkApiTrait;
use axum::Router;
use axum::http::{Method, header};
use axum::routing::get;
use handlers::{device_state, hello, list_devices, live_updates, preflight};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub use handlers::AppState;

/// API routes, the live update socket, and (when given) static assets as the fallback.
pub fn router<T>(state: AppState<T>, static_dir: Option<&str>) -> Router
where
    T: YoLinkApiTrait + Send + Sync + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let app = Router::new()
        .route("/api/hello", get(hello).options(preflight))
        .route("/api/devices", get(list_devices::<T>).options(preflight))
        .route("/api/devices/state", get(device_state::<T>).options(preflight))
        .route("/ws", get(live_updates::<T>))
        .with_state(state);

    let app = match static_dir {
        Some(dir) => app.fallback_service(ServeDir::new(dir)),
        None => app,
    };

    app.layer(cors).layer(TraceLayer::new_for_http())
}
