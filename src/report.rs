//! Aggregation of per-queue results into the single status line and exit
//! code the plugin contract expects.

use std::process;

use crate::check::evaluate;
use crate::client::BrokerError;
use crate::config::Threshold;
use crate::state::ServiceState;

/// Outcome for a single queue: its observed depth (absent when the fetch
/// failed), the thresholds it was measured against, and the resulting
/// state.
#[derive(Debug)]
pub struct QueueStatus {
    pub name: String,
    pub depth: Option<u64>,
    pub threshold: Threshold,
    pub state: ServiceState,
    annotation: Option<String>,
}

impl QueueStatus {
    /// A queue whose depth was fetched successfully.
    pub fn observed(name: String, depth: u64, threshold: Threshold) -> Self {
        let state = evaluate(depth, &threshold);
        let annotation = match state {
            ServiceState::Critical => Some(format!(
                "{name} depth {depth} exceeds critical threshold {}",
                threshold.critical
            )),
            ServiceState::Warning => Some(format!(
                "{name} depth {depth} exceeds warning threshold {}",
                threshold.warning
            )),
            _ => None,
        };

        Self {
            name,
            depth: Some(depth),
            threshold,
            state,
            annotation,
        }
    }

    /// A queue whose depth could not be determined. The failure reason
    /// becomes part of the status line.
    pub fn unavailable(name: String, threshold: Threshold, error: &BrokerError) -> Self {
        Self {
            name,
            depth: None,
            threshold,
            state: ServiceState::Unknown,
            annotation: Some(error.to_string()),
        }
    }

    fn detail(&self) -> String {
        match self.depth {
            Some(depth) => format!(
                "{}={};{};{}",
                self.name, depth, self.threshold.warning, self.threshold.critical
            ),
            None => format!("{}=UNKNOWN", self.name),
        }
    }
}

/// The aggregated result of one invocation, in configuration order.
#[derive(Debug)]
pub struct Report {
    statuses: Vec<QueueStatus>,
}

impl Report {
    pub fn new(statuses: Vec<QueueStatus>) -> Self {
        Self { statuses }
    }

    pub fn statuses(&self) -> &[QueueStatus] {
        &self.statuses
    }

    /// The worst state across all queues. A report with nothing in it has
    /// nothing to say, which is UNKNOWN.
    pub fn overall_state(&self) -> ServiceState {
        self.statuses
            .iter()
            .map(|status| status.state)
            .max()
            .unwrap_or(ServiceState::Unknown)
    }

    pub fn exit_code(&self) -> i32 {
        self.overall_state().exit_code()
    }

    /// Formats the one line this plugin prints: the overall state word,
    /// annotations for every queue that breached a threshold or could not
    /// be observed, and a `name=depth;warning;critical` detail per queue.
    pub fn status_line(&self) -> String {
        let overall = self.overall_state();
        let mut line = overall.to_string();

        let annotations: Vec<&str> = self
            .statuses
            .iter()
            .filter_map(|status| status.annotation.as_deref())
            .collect();
        if annotations.is_empty() {
            if overall == ServiceState::Ok {
                line.push_str(": all queue depths within thresholds");
            }
        } else {
            line.push_str(&format!(": {}", annotations.join("; ")));
        }

        if !self.statuses.is_empty() {
            let details: Vec<String> = self.statuses.iter().map(QueueStatus::detail).collect();
            line.push_str(&format!(" | {}", details.join(" ")));
        }

        line
    }

    /// Prints the status line to stdout and exits with the matching code.
    pub fn print_and_exit(self) -> ! {
        println!("{}", self.status_line());
        process::exit(self.exit_code());
    }
}
