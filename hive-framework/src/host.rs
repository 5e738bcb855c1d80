//! Framework host
//!
//! Loads every descriptor in the framework config directory, constructs
//! and registers a framework per descriptor, serves the combined API, and
//! tears everything down in order on shutdown: API first, then every
//! consumer, then every dispatch loop.

use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use hive_bus::{JobQueue, RpcChannel};

use crate::api;
use crate::config::{BaseConfig, FrameworkDescriptor};
use crate::framework::Framework;
use crate::registry::FrameworkRegistry;
use crate::store::JobStore;

pub struct FrameworkHost {
    config: BaseConfig,
    rpc: Arc<dyn RpcChannel>,
    queue: Arc<dyn JobQueue>,
    store: Arc<dyn JobStore>,
    registry: FrameworkRegistry,
    token: CancellationToken,
    frameworks: Vec<Arc<Framework>>,
}

impl FrameworkHost {
    pub fn new(
        config: BaseConfig,
        rpc: Arc<dyn RpcChannel>,
        queue: Arc<dyn JobQueue>,
        store: Arc<dyn JobStore>,
        registry: FrameworkRegistry,
        token: CancellationToken,
    ) -> Self {
        Self {
            config,
            rpc,
            queue,
            store,
            registry,
            token,
            frameworks: Vec::new(),
        }
    }

    pub fn frameworks(&self) -> &[Arc<Framework>] {
        &self.frameworks
    }

    /// Register one framework per descriptor file.
    ///
    /// A broken descriptor, an unknown framework name, or a failed
    /// registration skips that framework only — siblings still start.
    pub async fn start_frameworks(&mut self) -> anyhow::Result<usize> {
        let dir = &self.config.paths.framework_configs;
        let entries = std::fs::read_dir(dir).with_context(|| {
            format!("could not read framework config directory {}", dir.display())
        })?;

        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(err) => {
                    warn!(error = %err, "unreadable framework config entry");
                    continue;
                }
            };

            if path.extension().and_then(|ext| ext.to_str()) != Some("toml") {
                continue;
            }

            let descriptor = match FrameworkDescriptor::load(&path) {
                Ok(descriptor) => descriptor,
                Err(err) => {
                    error!(
                        path = %path.display(),
                        error = %err,
                        "could not load framework config"
                    );
                    continue;
                }
            };

            let Some(handler) = self.registry.build(&descriptor.framework) else {
                error!(
                    framework = %descriptor.framework,
                    "framework is not in the registration table"
                );
                continue;
            };

            let framework = Framework::new(
                handler,
                self.rpc.clone(),
                self.queue.clone(),
                self.store.clone(),
            );

            if !framework.register(&path).await {
                error!(framework = framework.name(), "framework could not register");
                continue;
            }

            self.frameworks.push(framework);
        }

        Ok(self.frameworks.len())
    }

    /// Serve the API until the stop signal fires, then drain frameworks.
    pub async fn serve(mut self) -> anyhow::Result<()> {
        if self.frameworks.is_empty() {
            warn!("no frameworks loaded");
            anyhow::bail!("no frameworks loaded");
        }

        let router = api::create_router(self.rpc.clone(), &self.frameworks);
        let listener = tokio::net::TcpListener::bind(&self.config.api.bind_addr)
            .await
            .with_context(|| {
                format!("could not bind api listener on {}", self.config.api.bind_addr)
            })?;

        info!(addr = %self.config.api.bind_addr, "api listening");

        let token = self.token.clone();
        axum::serve(listener, router)
            .with_graceful_shutdown(token.cancelled_owned())
            .await
            .context("api server failed")?;

        // The listener is closed; drain message processing next.
        self.stop_all().await;
        Ok(())
    }

    /// Ordered teardown: every consumer first, then every dispatch loop.
    /// Shutdown hooks run inside the dispatch tasks before this returns.
    pub async fn stop_all(&mut self) {
        info!("stopping frameworks");

        for framework in &self.frameworks {
            framework.signal_consumer_stop();
        }
        for framework in &self.frameworks {
            framework.join_consumer().await;
        }

        for framework in &self.frameworks {
            framework.signal_dispatch_stop();
        }
        for framework in &self.frameworks {
            framework.join_dispatch().await;
        }
    }
}
