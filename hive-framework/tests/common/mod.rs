//! Shared helpers for the integration tests
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Semaphore;
use uuid::Uuid;

use hive_bus::{MemoryBus, RpcOutcome};
use hive_core::domain::job::Job;
use hive_framework::framework::{AckPolicy, Framework, FrameworkHandler};
use hive_framework::store::MemoryJobStore;

/// Events a [`RecordingHandler`] observed, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Registered,
    Process(Uuid),
    Stopped,
}

/// A framework handler that records everything the runtime does to it.
pub struct RecordingHandler {
    name: String,
    events: Arc<Mutex<Vec<Event>>>,
    fail_jobs: bool,
    ack_policy: AckPolicy,
    gate: Option<Arc<Semaphore>>,
}

impl RecordingHandler {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            events: Arc::new(Mutex::new(Vec::new())),
            fail_jobs: false,
            ack_policy: AckPolicy::AfterHandler,
            gate: None,
        }
    }

    /// Every `process_job` call reports failure.
    pub fn failing(mut self) -> Self {
        self.fail_jobs = true;
        self
    }

    pub fn with_ack_policy(mut self, policy: AckPolicy) -> Self {
        self.ack_policy = policy;
        self
    }

    /// `process_job` blocks until a permit is added to `gate`.
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn processed_jobs(&self) -> Vec<Uuid> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Process(id) => Some(id),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl FrameworkHandler for RecordingHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn job_type(&self) -> &str {
        &self.name
    }

    async fn process_job(&self, _framework: &Framework, job_id: Uuid) -> anyhow::Result<()> {
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        self.events.lock().unwrap().push(Event::Process(job_id));
        if self.fail_jobs {
            anyhow::bail!("job {job_id} failed");
        }
        Ok(())
    }

    async fn on_registered(&self, _framework: &Framework) -> anyhow::Result<()> {
        self.events.lock().unwrap().push(Event::Registered);
        Ok(())
    }

    async fn on_stop(&self) {
        self.events.lock().unwrap().push(Event::Stopped);
    }

    fn ack_policy(&self) -> AckPolicy {
        self.ack_policy
    }
}

/// Construct an unregistered framework wired to the shared memory bus and
/// store.
pub fn framework_for(
    handler: Arc<RecordingHandler>,
    bus: &MemoryBus,
    store: &MemoryJobStore,
) -> Arc<Framework> {
    Framework::new(
        handler,
        Arc::new(bus.clone()),
        Arc::new(bus.clone()),
        Arc::new(store.clone()),
    )
}

/// Make `framework.register` succeed with the given identity.
pub fn register_ok(bus: &MemoryBus, id: Uuid) {
    bus.respond_to("framework", "register", move |_| {
        RpcOutcome::Reply(json!({ "code": 200, "id": id }))
    });
}

/// A descriptor file with the given datacenter.
pub fn descriptor_file(datacenter: &str) -> tempfile::NamedTempFile {
    descriptor_with(&format!(
        "framework = \"test\"\ndatacenter = \"{datacenter}\"\n"
    ))
}

pub fn descriptor_with(contents: &str) -> tempfile::NamedTempFile {
    use std::io::Write;
    let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

/// An active job in `datacenter`.
pub fn active_job(datacenter: &str) -> Job {
    Job {
        id: Uuid::new_v4(),
        datacenter: datacenter.to_string(),
        created_at: chrono::Utc::now(),
        stopped_at: None,
    }
}

/// Poll `condition` until it holds or `timeout` elapses.
pub async fn wait_until(condition: impl Fn() -> bool, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
