use std::fmt;

/// A service state as understood by nagios and icinga.
///
/// The derived order is the aggregation order for a multi-queue check: a
/// result set is as bad as its worst member, and an UNKNOWN member outranks
/// CRITICAL so that a check which could not determine state is never
/// reported as if it had.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ServiceState {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl ServiceState {
    /// Returns the corresponding exit code to signal this service state.
    pub fn exit_code(self) -> i32 {
        match self {
            ServiceState::Ok => 0,
            ServiceState::Warning => 1,
            ServiceState::Critical => 2,
            ServiceState::Unknown => 3,
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceState::Ok => "OK",
            ServiceState::Warning => "WARNING",
            ServiceState::Critical => "CRITICAL",
            ServiceState::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ServiceState::Ok.exit_code(), 0);
        assert_eq!(ServiceState::Warning.exit_code(), 1);
        assert_eq!(ServiceState::Critical.exit_code(), 2);
        assert_eq!(ServiceState::Unknown.exit_code(), 3);
    }

    #[test]
    fn test_display() {
        assert_eq!(&ServiceState::Ok.to_string(), "OK");
        assert_eq!(&ServiceState::Warning.to_string(), "WARNING");
        assert_eq!(&ServiceState::Critical.to_string(), "CRITICAL");
        assert_eq!(&ServiceState::Unknown.to_string(), "UNKNOWN");
    }

    #[test]
    fn test_aggregation_order() {
        assert!(ServiceState::Ok < ServiceState::Warning);
        assert!(ServiceState::Warning < ServiceState::Critical);
        assert!(ServiceState::Critical < ServiceState::Unknown);

        let worst = [ServiceState::Warning, ServiceState::Unknown, ServiceState::Critical]
            .into_iter()
            .max();
        assert_eq!(worst, Some(ServiceState::Unknown));
    }
}
