//! Core types for the delegate library
//!
//! The delegate itself reports no errors for misuse. The only recoverable
//! condition is a checked call on an unbound delegate, see
//! [`Delegate::try_call`](crate::Delegate::try_call).

/// Result type for checked delegate operations
pub type Result<T> = std::result::Result<T, DelegateError>;

/// Errors reported by checked delegate operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DelegateError {
    #[error("Delegate is empty: no function or method is connected")]
    Empty,
}
