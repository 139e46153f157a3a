//! Harness around the check body that folds fatal errors into the plugin
//! contract instead of letting them escape as panics or stack traces.

use std::fmt::Display;

use crate::report::Report;
use crate::state::ServiceState;

/// Runs the check closure. On success the produced [`Report`] carries the
/// outcome; on failure the error is paired with `error_state` so it can be
/// printed and exited with that state's code.
pub fn safe_run<E: Display>(
    error_state: ServiceState,
    check: impl FnOnce() -> Result<Report, E>,
) -> RunOutcome<E> {
    match check() {
        Ok(report) => RunOutcome::Completed(report),
        Err(error) => RunOutcome::Aborted(error_state, error),
    }
}

pub enum RunOutcome<E> {
    Completed(Report),
    Aborted(ServiceState, E),
}

impl<E: Display> RunOutcome<E> {
    /// Prints a single status line to stdout and exits with the matching
    /// code, whether the check completed or aborted.
    pub fn print_and_exit(self) -> ! {
        match self {
            RunOutcome::Completed(report) => report.print_and_exit(),
            RunOutcome::Aborted(state, error) => {
                println!("{state}: {error}");
                std::process::exit(state.exit_code());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("config went missing")]
    struct FatalError;

    #[test]
    fn test_safe_run_completed() {
        let outcome = safe_run(ServiceState::Unknown, || {
            Ok::<_, FatalError>(Report::new(Vec::new()))
        });

        assert!(matches!(outcome, RunOutcome::Completed(_)));
    }

    #[test]
    fn test_safe_run_aborted_carries_the_error_state() {
        let outcome = safe_run(ServiceState::Unknown, || Err::<Report, _>(FatalError));

        match outcome {
            RunOutcome::Aborted(state, error) => {
                assert_eq!(state, ServiceState::Unknown);
                assert_eq!(error.to_string(), "config went missing");
            }
            RunOutcome::Completed(_) => panic!("expected the run to abort"),
        }
    }
}
