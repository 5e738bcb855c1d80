//! Echo framework
//!
//! The smallest useful framework: it records every job reference it
//! consumes and exposes the record over its API. Ships as the out-of-the-box
//! demo and doubles as the concrete handler in the integration tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Extension, Json, Router,
    routing::{get, post},
};
use tracing::info;
use uuid::Uuid;

use hive_core::domain::user::UserInfo;

use crate::api::ApiState;
use crate::framework::{Framework, FrameworkHandler};

pub struct EchoFramework {
    processed: Arc<Mutex<Vec<Uuid>>>,
}

impl EchoFramework {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            processed: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// Job identifiers consumed so far, in consumption order.
    pub fn processed(&self) -> Vec<Uuid> {
        self.processed.lock().unwrap().clone()
    }
}

#[async_trait]
impl FrameworkHandler for EchoFramework {
    fn name(&self) -> &str {
        "echo"
    }

    fn job_type(&self) -> &str {
        "echo"
    }

    async fn process_job(&self, _framework: &Framework, job_id: Uuid) -> anyhow::Result<()> {
        info!(%job_id, "echo framework processed job");
        self.processed.lock().unwrap().push(job_id);
        Ok(())
    }

    async fn on_registered(&self, framework: &Framework) -> anyhow::Result<()> {
        info!(framework = framework.name(), "echo framework ready");
        Ok(())
    }

    async fn on_stop(&self) {
        info!("echo framework stopped");
    }

    fn api_routes(&self) -> Router<ApiState> {
        let jobs = Arc::clone(&self.processed);
        let purge = Arc::clone(&self.processed);

        Router::new()
            .route(
                "/jobs",
                get(move |Extension(user): Extension<UserInfo>| {
                    let jobs = Arc::clone(&jobs);
                    async move {
                        Json(serde_json::json!({
                            "caller": user,
                            "jobs": jobs.lock().unwrap().clone(),
                        }))
                    }
                }),
            )
            .route(
                "/purge",
                post(move || {
                    let purge = Arc::clone(&purge);
                    async move {
                        let drained = {
                            let mut jobs = purge.lock().unwrap();
                            let count = jobs.len();
                            jobs.clear();
                            count
                        };
                        Json(serde_json::json!({ "purged": drained }))
                    }
                }),
            )
    }

    fn route_permissions(&self) -> Vec<(&'static str, &'static str)> {
        vec![("/purge", "echo.admin")]
    }
}
