//! API layer
//!
//! Each framework's resources are nested under `/framework/<name>` behind
//! the auth interceptor. The health endpoint is the only unauthenticated
//! route.

pub mod auth;
pub mod error;
pub mod health;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{Router, middleware, routing::get};
use tower_http::trace::TraceLayer;

use hive_bus::RpcChannel;

use crate::framework::Framework;

pub use auth::auth_middleware;
pub use error::ApiError;

/// State shared by the auth interceptor and framework handlers.
#[derive(Clone)]
pub struct ApiState {
    pub rpc: Arc<dyn RpcChannel>,

    /// How long the interceptor waits for a validate reply
    pub rpc_wait: Duration,

    /// Request paths (relative to the framework mount) that require a
    /// capability beyond authentication
    pub permissions: Arc<HashMap<String, String>>,
}

/// Assemble the host router: health plus every framework's resources.
pub fn create_router(rpc: Arc<dyn RpcChannel>, frameworks: &[Arc<Framework>]) -> Router {
    let mut router = Router::new().route("/health", get(health::health_check));

    for framework in frameworks {
        let permissions: HashMap<String, String> = framework
            .handler()
            .route_permissions()
            .into_iter()
            .map(|(path, permission)| (path.to_string(), permission.to_string()))
            .collect();

        let state = ApiState {
            rpc: rpc.clone(),
            rpc_wait: framework
                .settings()
                .map(|settings| settings.rpc_wait)
                .unwrap_or(hive_bus::DEFAULT_RPC_WAIT),
            permissions: Arc::new(permissions),
        };

        let mount = format!("/framework/{}", framework.name());
        let routes = framework
            .handler()
            .api_routes()
            .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
            .with_state(state);

        tracing::info!(framework = framework.name(), mount = %mount, "registered framework api");
        router = router.nest(&mount, routes);
    }

    router.layer(TraceLayer::new_for_http())
}
