//! Building blocks for the `check_rabbitmq_queues` nagios/icinga plugin.
//!
//! The binary wires these together: a [`Config`] is loaded from a YAML
//! file, a [`BrokerClient`] asks the RabbitMQ management API for each
//! queue's depth, [`check_queues`] folds depths and thresholds into a
//! [`Report`], and the report prints one status line and exits with the
//! matching code.

pub mod check;
pub mod client;
pub mod config;
pub mod icinga;
pub mod report;
pub mod runner;
pub mod state;

pub use crate::check::{check_queues, evaluate};
pub use crate::client::{BrokerClient, BrokerError, BrokerErrorKind, FetchQueueDepth};
pub use crate::config::{Config, ConfigError, Credentials, Threshold};
pub use crate::report::{QueueStatus, Report};
pub use crate::runner::{safe_run, RunOutcome};
pub use crate::state::ServiceState;
