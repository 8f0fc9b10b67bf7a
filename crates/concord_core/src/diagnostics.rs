//! # Diagnostics
//!
//! Read-only reports about subscribers that never made it into the
//! finalized order. A subscriber whose dependency is never registered waits
//! forever without any error being raised; the host is expected to query
//! these reports at startup to catch that.

use std::fmt;

/// A pending subscriber and the dependencies it still waits on.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PendingReport {
    /// Name of the waiting subscriber.
    pub name: String,
    /// Names of dependencies that are not finalized yet.
    pub unmet: Vec<String>,
}

impl fmt::Display for PendingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} waits on [{}]", self.name, self.unmet.join(", "))
    }
}

/// A dependency cycle among pending subscribers.
///
/// `names` starts and ends with the same subscriber: `a -> b -> a` means `a`
/// waits on `b`, which waits on `a`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CycleReport {
    /// Subscriber names along the cycle, first name repeated at the end.
    pub names: Vec<String>,
}

impl CycleReport {
    /// Returns true if `name` lies on this cycle.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Number of distinct subscribers on the cycle.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len().saturating_sub(1)
    }

    /// Returns true for an empty report.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names.join(" -> "))
    }
}
