//! Job dispatch loop
//!
//! Runs until the framework is stopped. Each cycle sleeps a uniformly
//! random interval in [5, 60] seconds — chosen anew every cycle so many
//! framework instances never synchronize against the store and the bus —
//! then runs one dispatch pass. A stop signal interrupts the sleep
//! immediately; the shutdown hook runs once after the loop exits.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::debug;

use crate::framework::Framework;

const MIN_CYCLE_SECS: u64 = 5;
const MAX_CYCLE_SECS: u64 = 60;

fn cycle_interval() -> Duration {
    Duration::from_secs(rand::rng().random_range(MIN_CYCLE_SECS..=MAX_CYCLE_SECS))
}

pub(crate) async fn run(framework: Arc<Framework>) {
    loop {
        let interval = cycle_interval();
        debug!(
            framework = framework.name(),
            seconds = interval.as_secs(),
            "dispatch loop sleeping"
        );

        tokio::select! {
            _ = framework.dispatch_token.cancelled() => break,
            _ = tokio::time::sleep(interval) => framework.publish_jobs().await,
        }
    }

    debug!(framework = framework.name(), "dispatch loop exited");
    framework.handler().on_stop().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_stays_in_bounds() {
        for _ in 0..200 {
            let interval = cycle_interval();
            assert!(interval >= Duration::from_secs(MIN_CYCLE_SECS));
            assert!(interval <= Duration::from_secs(MAX_CYCLE_SECS));
        }
    }
}
