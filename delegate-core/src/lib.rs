//! Delegate Library
//!
//! A lightweight, non-owning, type-erased callable for free functions and for
//! methods bound to a borrowed instance.
//!
//! # Architecture
//!
//! A [`Delegate`] is two words: an opaque context pointer and a monomorphized
//! adapter. Binding never allocates and calling costs one indirect call.
//! - Free functions are bound with [`Delegate::connect`]
//! - `&self` methods are bound to an instance with [`Delegate::connect_method`]
//! - Equality is identity of the binding, not of behaviour
//!
//! The library does NOT:
//! - Capture stateful closures
//! - Own or extend the lifetime of bound instances
//! - Synchronize access across threads
//! - Aggregate many delegates into a multicast sink
//!
//! # Example Usage
//!
//! ```
//! use delegate_core::Delegate;
//!
//! fn double(x: i32) -> i32 {
//!     x * 2
//! }
//!
//! struct Accumulator {
//!     value: i32,
//! }
//!
//! impl Accumulator {
//!     fn add(&self, x: i32) -> i32 {
//!         self.value + x
//!     }
//! }
//!
//! let acc = Accumulator { value: 5 };
//!
//! let mut delegate = Delegate::<(i32,), i32>::new();
//! delegate.connect(double);
//! assert_eq!(delegate.invoke(21), 42);
//!
//! delegate.connect_method(Accumulator::add, &acc);
//! assert_eq!(delegate.invoke(10), 15);
//!
//! delegate.reset();
//! assert!(delegate.is_empty());
//! ```

// Public modules
pub mod adapter;
pub mod delegate;
pub mod types;

// Re-export main types for convenience
pub use adapter::{FreeFn, Method, Thunk};
pub use delegate::Delegate;
pub use types::{DelegateError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Smoke test: an empty delegate reports the checked error
        let delegate = Delegate::<(), u8>::new();
        assert!(delegate.is_empty());
        assert_eq!(delegate.try_call(()), Err(DelegateError::Empty));
    }
}
