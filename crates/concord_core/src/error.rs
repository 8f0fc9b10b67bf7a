//! # Registry Error Types
//!
//! Registration errors are returned synchronously as values. Missing
//! dependencies and cycles are not errors at registration time (the missing
//! name may still arrive); see [`crate::diagnostics`] for those.

use thiserror::Error;

use crate::registry::SubscriberState;

/// Errors that can occur when adding a subscriber.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The same name was already added on this channel. The first
    /// registration wins and nothing about it changes.
    #[error("duplicate subscriber `{name}`: already {state}")]
    DuplicateSubscriber {
        /// The rejected name.
        name: String,
        /// State of the existing registration.
        state: SubscriberState,
    },
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
