//! Framework runtime
//!
//! A [`Framework`] ties one [`FrameworkHandler`] implementation to the bus
//! and the job store: it registers with the manager, runs the job dispatch
//! loop and the job consumer, and provides the task-launch and
//! worker-discovery RPCs handlers build on.

pub mod consumer;
pub mod dispatch;
pub mod error;

use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use hive_bus::{JobQueue, RpcChannel, RpcPublisher, decode_reply, job_queue_name};
use hive_core::domain::task::{Task, TaskStatus};
use hive_core::domain::worker::Worker;
use hive_core::dto::queue::JobRef;
use hive_core::dto::rpc::{
    GetWorkersReply, GetWorkersRequest, LaunchTaskReply, LaunchTaskRequest, RegisterReply,
    RegisterRequest,
};

use crate::api::ApiState;
use crate::config::{ConfigError, FrameworkDescriptor, FrameworkSettings};
use crate::store::JobStore;

pub use consumer::AckPolicy;
pub use error::{GetWorkersError, LaunchTaskError};

/// Registration attempts before a framework gives up and is stopped.
const REGISTER_ATTEMPTS: u32 = 5;

/// Task launch waits a short explicit interval instead of the default.
const LAUNCH_TASK_WAIT: Duration = Duration::from_secs(10);

/// The capability every concrete framework type implements.
///
/// One handler is responsible for one job type. The runtime drives it:
/// jobs it should work on arrive through [`process_job`](Self::process_job),
/// and the hooks bracket the framework's registered lifetime.
#[async_trait]
pub trait FrameworkHandler: Send + Sync {
    /// Stable, operator-chosen framework name.
    fn name(&self) -> &str;

    /// The persisted record type this framework schedules.
    fn job_type(&self) -> &str;

    /// Inspect the framework-specific descriptor before registration.
    ///
    /// The common settings are already validated; implementations read
    /// their own keys from `descriptor.options`. Rejecting the descriptor
    /// aborts registration for this framework only.
    fn configure(&self, _descriptor: &FrameworkDescriptor) -> Result<(), ConfigError> {
        Ok(())
    }

    /// Handle one job reference consumed from the framework's queue.
    async fn process_job(&self, framework: &Framework, job_id: Uuid) -> anyhow::Result<()>;

    /// Invoked once after the manager assigned an identity and the loops
    /// started.
    async fn on_registered(&self, _framework: &Framework) -> anyhow::Result<()> {
        Ok(())
    }

    /// Invoked once after the dispatch loop exits.
    async fn on_stop(&self) {}

    /// When consumed job references are acknowledged. Re-delivery is the
    /// handler's responsibility, so the policy lives here.
    fn ack_policy(&self) -> AckPolicy {
        AckPolicy::AfterHandler
    }

    /// Framework-specific API resources, mounted behind the auth
    /// interceptor.
    fn api_routes(&self) -> Router<ApiState> {
        Router::new()
    }

    /// Capability strings specific routes require, keyed by path relative
    /// to the framework's mount point. Routes not listed accept any
    /// authenticated caller.
    fn route_permissions(&self) -> Vec<(&'static str, &'static str)> {
        Vec::new()
    }
}

/// A registered, named scheduler instance responsible for one job type.
pub struct Framework {
    handler: Arc<dyn FrameworkHandler>,
    rpc: Arc<dyn RpcChannel>,
    queue: Arc<dyn JobQueue>,
    store: Arc<dyn JobStore>,

    // Assigned by the manager during registration; immutable afterwards.
    id: OnceLock<Uuid>,
    settings: OnceLock<FrameworkSettings>,

    dispatch_token: CancellationToken,
    consumer_token: CancellationToken,
    dispatch_handle: Mutex<Option<JoinHandle<()>>>,
    consumer_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Framework {
    pub fn new(
        handler: Arc<dyn FrameworkHandler>,
        rpc: Arc<dyn RpcChannel>,
        queue: Arc<dyn JobQueue>,
        store: Arc<dyn JobStore>,
    ) -> Arc<Self> {
        Arc::new(Self {
            handler,
            rpc,
            queue,
            store,
            id: OnceLock::new(),
            settings: OnceLock::new(),
            dispatch_token: CancellationToken::new(),
            consumer_token: CancellationToken::new(),
            dispatch_handle: Mutex::new(None),
            consumer_handle: Mutex::new(None),
        })
    }

    pub fn name(&self) -> &str {
        self.handler.name()
    }

    /// The manager-assigned identity; `None` until registration succeeded.
    pub fn id(&self) -> Option<Uuid> {
        self.id.get().copied()
    }

    pub fn settings(&self) -> Option<&FrameworkSettings> {
        self.settings.get()
    }

    pub fn datacenter(&self) -> Option<&str> {
        self.settings.get().map(|settings| settings.datacenter.as_str())
    }

    pub fn handler(&self) -> &Arc<dyn FrameworkHandler> {
        &self.handler
    }

    pub fn queue_name(&self) -> String {
        job_queue_name(self.name())
    }

    fn rpc_wait(&self) -> Duration {
        self.settings
            .get()
            .map(|settings| settings.rpc_wait)
            .unwrap_or(hive_bus::DEFAULT_RPC_WAIT)
    }

    /// Register this framework with the manager.
    ///
    /// Loads the descriptor at `config_path`, then attempts registration up
    /// to five times. Only after an identity was actually assigned does it
    /// ensure the job schema, start the dispatch loop and the consumer, and
    /// invoke the post-registration hook. Returns whether the framework is
    /// now running.
    pub async fn register(self: &Arc<Self>, config_path: &Path) -> bool {
        let descriptor = match FrameworkDescriptor::load(config_path) {
            Ok(descriptor) => descriptor,
            Err(err) => {
                error!(
                    framework = self.name(),
                    error = %err,
                    "could not load framework config"
                );
                return false;
            }
        };

        if let Err(err) = self.handler.configure(&descriptor) {
            error!(
                framework = self.name(),
                error = %err,
                "framework rejected its config"
            );
            return false;
        }

        let settings = FrameworkSettings::from_descriptor(&descriptor);
        let rpc_wait = settings.rpc_wait;
        let _ = self.settings.set(settings);

        let publisher = RpcPublisher::new(self.rpc.clone(), "framework", "register");
        let mut assigned = None;

        for attempt in 1..=REGISTER_ATTEMPTS {
            info!(framework = self.name(), attempt, "trying to register framework");

            let request = RegisterRequest {
                name: self.name().to_string(),
            };
            let correlation_id = match publisher.publish(&request).await {
                Ok(correlation_id) => correlation_id,
                Err(err) => {
                    warn!(
                        framework = self.name(),
                        attempt,
                        error = %err,
                        "framework register publish failed"
                    );
                    continue;
                }
            };

            let Some(reply) = publisher.get_data(correlation_id, rpc_wait).await else {
                warn!(
                    framework = self.name(),
                    attempt,
                    "no reply to framework register"
                );
                continue;
            };

            match decode_reply::<RegisterReply>(reply) {
                Ok(body) => {
                    assigned = Some(body.id);
                    break;
                }
                Err(err) => {
                    warn!(
                        framework = self.name(),
                        attempt,
                        error = %err,
                        "framework register failed"
                    );
                }
            }
        }

        let Some(id) = assigned else {
            error!(framework = self.name(), "unable to register framework, stopping");
            self.stop().await;
            return false;
        };

        let _ = self.id.set(id);

        if let Err(err) = self.store.ensure_schema().await {
            error!(
                framework = self.name(),
                error = %err,
                "could not ensure job schema"
            );
            self.stop().await;
            return false;
        }

        self.start_loops();

        if let Err(err) = self.handler.on_registered(self).await {
            warn!(
                framework = self.name(),
                error = %err,
                "post-registration hook failed"
            );
        }

        info!(framework = self.name(), id = %id, "successfully registered framework");
        true
    }

    fn start_loops(self: &Arc<Self>) {
        let dispatch = tokio::spawn(dispatch::run(Arc::clone(self)));
        *self.dispatch_handle.lock().unwrap() = Some(dispatch);

        let consume = tokio::spawn(consumer::run(Arc::clone(self)));
        *self.consumer_handle.lock().unwrap() = Some(consume);
    }

    /// One dispatch pass: backpressure check, store query, publish.
    ///
    /// Every failure is logged and aborts the pass; the calling loop
    /// survives and retries on its next cycle.
    pub async fn publish_jobs(&self) {
        let Some(settings) = self.settings.get() else {
            return;
        };
        let queue_name = self.queue_name();

        // Passive depth inspection: while any job references are pending,
        // this framework publishes nothing.
        let depth = match self.queue.depth(&queue_name).await {
            Ok(depth) => depth,
            Err(err) => {
                warn!(
                    framework = self.name(),
                    error = %err,
                    "error checking job queue depth"
                );
                return;
            }
        };

        if depth > 0 {
            info!(
                framework = self.name(),
                depth, "job queue is not empty, not publishing jobs"
            );
            return;
        }

        let job_ids = match self
            .store
            .active_job_ids(self.handler.job_type(), &settings.datacenter)
            .await
        {
            Ok(job_ids) => job_ids,
            Err(err) => {
                error!(
                    framework = self.name(),
                    error = %err,
                    "error querying active jobs"
                );
                return;
            }
        };

        for job_id in job_ids {
            let payload = match serde_json::to_value(JobRef::new(job_id)) {
                Ok(payload) => payload,
                Err(err) => {
                    error!(framework = self.name(), %job_id, error = %err, "could not encode job reference");
                    return;
                }
            };
            if let Err(err) = self.queue.publish(&queue_name, payload).await {
                warn!(
                    framework = self.name(),
                    %job_id,
                    error = %err,
                    "error publishing job"
                );
                return;
            }
        }
    }

    /// Ask the manager to launch `task` on `worker`.
    ///
    /// Returns the task status the manager reports.
    pub async fn launch_task(
        &self,
        worker: &Worker,
        task: &Task,
    ) -> Result<TaskStatus, LaunchTaskError> {
        debug!(framework = self.name(), task_id = %task.id, "launching task");

        let publisher = RpcPublisher::new(self.rpc.clone(), "task", "launch");
        let correlation_id = publisher
            .publish(&LaunchTaskRequest {
                task_id: task.id,
                worker_id: worker.id,
            })
            .await?;

        let reply = publisher
            .get_data(correlation_id, LAUNCH_TASK_WAIT)
            .await
            .ok_or(LaunchTaskError::NoReply)?;

        let body: LaunchTaskReply = decode_reply(reply)?;
        Ok(body.status)
    }

    /// Fetch the workers the manager knows for this framework in
    /// `datacenter`.
    pub async fn get_workers(&self, datacenter: &str) -> Result<Vec<Worker>, GetWorkersError> {
        debug!(framework = self.name(), datacenter, "getting workers");

        let publisher = RpcPublisher::new(self.rpc.clone(), "worker", "get");
        let correlation_id = publisher
            .publish(&GetWorkersRequest {
                framework: self.name().to_string(),
                datacenter: datacenter.to_string(),
            })
            .await?;

        let reply = publisher
            .get_data(correlation_id, self.rpc_wait())
            .await
            .ok_or(GetWorkersError::NoReply)?;

        let body: GetWorkersReply = decode_reply(reply)?;
        Ok(body.workers)
    }

    pub(crate) fn signal_consumer_stop(&self) {
        self.consumer_token.cancel();
    }

    pub(crate) async fn join_consumer(&self) {
        let handle = self.consumer_handle.lock().unwrap().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    pub(crate) fn signal_dispatch_stop(&self) {
        self.dispatch_token.cancel();
    }

    pub(crate) async fn join_dispatch(&self) {
        let handle = self.dispatch_handle.lock().unwrap().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// Stop this framework: consumer first, then the dispatch loop. The
    /// shutdown hook runs inside the dispatch task before it finishes.
    pub async fn stop(&self) {
        self.signal_consumer_stop();
        self.join_consumer().await;
        self.signal_dispatch_stop();
        self.join_dispatch().await;
    }
}
