//! Job consumer
//!
//! One subscription per framework with a single in-flight delivery, so no
//! two job references are handled concurrently by one framework instance.
//! Every delivery results in exactly one handler invocation followed by
//! whatever acknowledgement the framework's [`AckPolicy`] calls for.

use std::sync::Arc;

use tracing::{error, warn};

use hive_bus::{Delivery, Subscription};
use hive_core::dto::queue::JobRef;

use crate::framework::Framework;

/// When a consumed job reference is acknowledged.
///
/// `AfterHandler` acknowledges even when the handler fails, so a failed
/// job is never redelivered — the handler owns its own retry story.
/// `OnSuccess` leaves failed deliveries unacknowledged for redelivery,
/// which requires an idempotent handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckPolicy {
    AfterHandler,
    OnSuccess,
}

pub(crate) async fn run(framework: Arc<Framework>) {
    let queue_name = framework.queue_name();

    let mut subscription = match framework.queue.subscribe(&queue_name).await {
        Ok(subscription) => subscription,
        Err(err) => {
            error!(
                framework = framework.name(),
                error = %err,
                "could not subscribe to job queue"
            );
            return;
        }
    };

    loop {
        let delivery = tokio::select! {
            _ = framework.consumer_token.cancelled() => break,
            delivery = subscription.next() => delivery,
        };

        match delivery {
            Ok(Some(delivery)) => consume(&framework, subscription.as_mut(), delivery).await,
            Ok(None) => break,
            Err(err) => {
                error!(
                    framework = framework.name(),
                    error = %err,
                    "job subscription failed"
                );
                break;
            }
        }
    }
}

async fn consume(framework: &Framework, subscription: &mut dyn Subscription, delivery: Delivery) {
    let tag = delivery.tag;

    let job_ref: JobRef = match serde_json::from_value(delivery.payload) {
        Ok(job_ref) => job_ref,
        Err(err) => {
            // Poison-message guard: an undecodable payload would be
            // redelivered forever, so it is dropped and acknowledged.
            error!(
                framework = framework.name(),
                error = %err,
                "dropping undecodable job message"
            );
            if let Err(err) = subscription.ack(tag).await {
                warn!(
                    framework = framework.name(),
                    error = %err,
                    "failed to acknowledge dropped message"
                );
            }
            return;
        }
    };

    let outcome = framework
        .handler()
        .process_job(framework, job_ref.job_id)
        .await;

    if let Err(err) = &outcome {
        error!(
            framework = framework.name(),
            job_id = %job_ref.job_id,
            error = %err,
            "job handler failed"
        );
    }

    let acknowledge = match framework.handler().ack_policy() {
        AckPolicy::AfterHandler => true,
        AckPolicy::OnSuccess => outcome.is_ok(),
    };

    if acknowledge {
        if let Err(err) = subscription.ack(tag).await {
            warn!(
                framework = framework.name(),
                job_id = %job_ref.job_id,
                error = %err,
                "failed to acknowledge job message"
            );
        }
    }
}
