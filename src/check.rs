//! The check itself: threshold evaluation and the sequential polling loop.

use tracing::warn;

use crate::client::FetchQueueDepth;
use crate::config::{Config, Threshold};
use crate::report::{QueueStatus, Report};
use crate::state::ServiceState;

/// Maps an observed depth onto the queue's thresholds.
///
/// A depth equal to a threshold is still within it; a threshold of zero
/// therefore trips on any nonzero depth. The critical comparison runs
/// first, so a config with warning above critical still alerts at the
/// critical bound.
pub fn evaluate(depth: u64, threshold: &Threshold) -> ServiceState {
    if depth > threshold.critical {
        ServiceState::Critical
    } else if depth > threshold.warning {
        ServiceState::Warning
    } else {
        ServiceState::Ok
    }
}

/// Polls every configured queue once, in configuration order.
///
/// A queue whose fetch fails is reported UNKNOWN and the loop keeps going;
/// one unreachable queue must not hide the state of the others.
pub fn check_queues(config: &Config, source: &dyn FetchQueueDepth) -> Report {
    let mut statuses = Vec::with_capacity(config.queues.len());

    for (name, threshold) in &config.queues {
        let status = match source.fetch_depth(name) {
            Ok(depth) => QueueStatus::observed(name.clone(), depth, *threshold),
            Err(error) => {
                warn!(queue = %name, %error, "queue depth unavailable");
                QueueStatus::unavailable(name.clone(), *threshold, &error)
            }
        };
        statuses.push(status);
    }

    Report::new(statuses)
}
