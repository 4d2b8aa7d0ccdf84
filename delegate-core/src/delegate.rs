//! The `Delegate` type
//!
//! A delegate is an unmanaged, two-word handle to either a free function or a
//! method bound to a borrowed instance. It never owns what it points at: the
//! `'a` lifetime ties it to the borrow of the bound instance so it cannot
//! outlive that instance.

use crate::adapter::{self, FreeFn, Method, Thunk};
use crate::types::{DelegateError, Result};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ptr;

/// Non-owning, type-erased callable taking the argument tuple `Args` and
/// returning `Ret`.
///
/// A delegate is either empty or bound. Binding stores an opaque context
/// pointer (null for free functions) and a monomorphized adapter; calling it
/// costs one indirect call.
///
/// Methods mutating their instance must use interior mutability: only shared
/// borrows are bound, because a delegate is `Copy`.
///
/// # Example
/// ```
/// use delegate_core::Delegate;
///
/// fn double(x: i32) -> i32 {
///     x * 2
/// }
///
/// let mut delegate = Delegate::<(i32,), i32>::new();
/// assert!(delegate.is_empty());
///
/// delegate.connect(double);
/// assert_eq!(delegate.invoke(21), 42);
/// ```
pub struct Delegate<'a, Args, Ret = ()> {
    /// Bound instance, or null for free functions and empty delegates
    context: *const (),
    /// Adapter for the current binding, `None` when empty
    thunk: Option<Thunk<Args, Ret>>,
    _instance: PhantomData<&'a ()>,
}

impl<'a, Args, Ret> Delegate<'a, Args, Ret> {
    /// Create an empty delegate
    pub const fn new() -> Self {
        Self {
            context: ptr::null(),
            thunk: None,
            _instance: PhantomData,
        }
    }

    /// Create a delegate bound to a free function
    pub fn from_fn<F>(function: F) -> Self
    where
        F: FreeFn<Args, Ret>,
    {
        let mut delegate = Self::new();
        delegate.connect(function);
        delegate
    }

    /// Create a delegate bound to `method` on `instance`
    pub fn from_method<C, M>(method: M, instance: &'a C) -> Self
    where
        M: Method<C, Args, Ret>,
    {
        let mut delegate = Self::new();
        delegate.connect_method(method, instance);
        delegate
    }

    /// Bind a free function, replacing any previous binding.
    ///
    /// `function` must be a function item or a non-capturing closure; anything
    /// else is rejected at compile time.
    ///
    /// # Example
    /// ```
    /// use delegate_core::Delegate;
    ///
    /// fn len(s: &str) -> usize {
    ///     s.len()
    /// }
    ///
    /// let mut delegate = Delegate::<(&str,), usize>::new();
    /// delegate.connect(len);
    /// assert_eq!(delegate.invoke("four"), 4);
    /// ```
    ///
    /// Capturing closures do not compile:
    /// ```compile_fail
    /// use delegate_core::Delegate;
    ///
    /// let factor = 3;
    /// let mut delegate = Delegate::<(i32,), i32>::new();
    /// delegate.connect(move |x: i32| x * factor);
    /// ```
    ///
    /// Neither do `fn` pointer values:
    /// ```compile_fail
    /// use delegate_core::Delegate;
    ///
    /// fn double(x: i32) -> i32 {
    ///     x * 2
    /// }
    ///
    /// let pointer: fn(i32) -> i32 = double;
    /// let mut delegate = Delegate::<(i32,), i32>::new();
    /// delegate.connect(pointer);
    /// ```
    ///
    /// Nor functions with the wrong arity:
    /// ```compile_fail
    /// use delegate_core::Delegate;
    ///
    /// fn add(a: i32, b: i32) -> i32 {
    ///     a + b
    /// }
    ///
    /// let mut delegate = Delegate::<(i32,), i32>::new();
    /// delegate.connect(add);
    /// ```
    ///
    /// Or a result that does not convert into `Ret`:
    /// ```compile_fail
    /// use delegate_core::Delegate;
    ///
    /// fn describe(x: i32) -> String {
    ///     x.to_string()
    /// }
    ///
    /// let mut delegate = Delegate::<(i32,), i32>::new();
    /// delegate.connect(describe);
    /// ```
    pub fn connect<F>(&mut self, _function: F)
    where
        F: FreeFn<Args, Ret>,
    {
        self.context = ptr::null();
        self.thunk = Some(adapter::free_adapter::<F, Args, Ret>());
        log::trace!("Delegate connected to free function {}", std::any::type_name::<F>());
    }

    /// Bind `method` for `instance`, replacing any previous binding.
    ///
    /// # Example
    /// ```
    /// use delegate_core::Delegate;
    ///
    /// struct Counter {
    ///     value: i32,
    /// }
    ///
    /// impl Counter {
    ///     fn add(&self, x: i32) -> i32 {
    ///         self.value + x
    ///     }
    /// }
    ///
    /// let counter = Counter { value: 5 };
    /// let mut delegate = Delegate::<(i32,), i32>::new();
    /// delegate.connect_method(Counter::add, &counter);
    /// assert_eq!(delegate.invoke(10), 15);
    /// ```
    ///
    /// Zero-sized instances are rejected, since two of them may share one
    /// address:
    /// ```compile_fail
    /// use delegate_core::Delegate;
    ///
    /// struct Unit;
    ///
    /// impl Unit {
    ///     fn echo(&self, x: i32) -> i32 {
    ///         x
    ///     }
    /// }
    ///
    /// let unit = Unit;
    /// let mut delegate = Delegate::<(i32,), i32>::new();
    /// delegate.connect_method(Unit::echo, &unit);
    /// ```
    ///
    /// So are methods whose signature does not match:
    /// ```compile_fail
    /// use delegate_core::Delegate;
    ///
    /// struct Counter {
    ///     value: i32,
    /// }
    ///
    /// impl Counter {
    ///     fn label(&self, name: &str) -> String {
    ///         format!("{}={}", name, self.value)
    ///     }
    /// }
    ///
    /// let counter = Counter { value: 5 };
    /// let mut delegate = Delegate::<(i32,), i32>::new();
    /// delegate.connect_method(Counter::label, &counter);
    /// ```
    pub fn connect_method<C, M>(&mut self, _method: M, instance: &'a C)
    where
        M: Method<C, Args, Ret>,
    {
        self.context = (instance as *const C).cast();
        self.thunk = Some(adapter::method_adapter::<C, M, Args, Ret>());
        log::trace!(
            "Delegate connected to method {} on {:p}",
            std::any::type_name::<M>(),
            self.context
        );
    }

    /// Return to the empty state
    pub fn reset(&mut self) {
        self.context = ptr::null();
        self.thunk = None;
        log::trace!("Delegate reset");
    }

    /// Check whether no function or method is bound
    #[inline]
    pub fn is_empty(&self) -> bool {
        // context is only meaningful alongside a thunk
        self.thunk.is_none()
    }

    /// Check whether this delegate is bound to a method on `instance`
    ///
    /// `C` must not be zero-sized, as for [`connect_method`](Self::connect_method).
    pub fn is_bound_to<C>(&self, instance: &C) -> bool {
        adapter::assert_addressable::<C>();
        !self.is_empty() && ptr::eq(self.context, (instance as *const C).cast())
    }

    /// Invoke the bound target with the argument tuple.
    ///
    /// # Panics
    /// Panics if the delegate is empty. Use [`try_call`](Self::try_call) for a
    /// checked call or [`call_unchecked`](Self::call_unchecked) to skip the
    /// check entirely.
    #[inline]
    #[track_caller]
    pub fn call(&self, args: Args) -> Ret {
        match self.thunk {
            // SAFETY: the thunk was generated for the current context, which is
            // either null (free function) or borrowed for 'a.
            Some(thunk) => unsafe { thunk(self.context, args) },
            None => empty_call(),
        }
    }

    /// Invoke the bound target, reporting an empty delegate as an error
    #[inline]
    pub fn try_call(&self, args: Args) -> Result<Ret> {
        match self.thunk {
            // SAFETY: see `call`.
            Some(thunk) => Ok(unsafe { thunk(self.context, args) }),
            None => Err(DelegateError::Empty),
        }
    }

    /// Invoke the bound target without checking for emptiness.
    ///
    /// # Safety
    /// The delegate must not be empty. Debug builds assert this.
    #[inline]
    pub unsafe fn call_unchecked(&self, args: Args) -> Ret {
        debug_assert!(!self.is_empty(), "call_unchecked on an empty delegate");
        // SAFETY: the caller guarantees a thunk is present.
        let thunk = unsafe { self.thunk.unwrap_unchecked() };
        // SAFETY: see `call`.
        unsafe { thunk(self.context, args) }
    }

    /// Address of the stored adapter, used for identity comparison
    fn thunk_addr(&self) -> Option<*const ()> {
        self.thunk.map(|thunk| thunk as *const ())
    }
}

#[cold]
#[inline(never)]
#[track_caller]
fn empty_call() -> ! {
    panic!("called an empty delegate")
}

macro_rules! impl_invoke {
    ($($arg:ident: $ty:ident),*) => {
        impl<'a, $($ty,)* Ret> Delegate<'a, ($($ty,)*), Ret> {
            /// Invoke the bound target with unpacked arguments.
            ///
            /// # Panics
            /// Panics if the delegate is empty.
            #[inline]
            #[track_caller]
            pub fn invoke(&self, $($arg: $ty),*) -> Ret {
                self.call(($($arg,)*))
            }
        }
    };
}

impl_invoke!();
impl_invoke!(a1: A1);
impl_invoke!(a1: A1, a2: A2);
impl_invoke!(a1: A1, a2: A2, a3: A3);
impl_invoke!(a1: A1, a2: A2, a3: A3, a4: A4);
impl_invoke!(a1: A1, a2: A2, a3: A3, a4: A4, a5: A5);
impl_invoke!(a1: A1, a2: A2, a3: A3, a4: A4, a5: A5, a6: A6);
impl_invoke!(a1: A1, a2: A2, a3: A3, a4: A4, a5: A5, a6: A6, a7: A7);
impl_invoke!(a1: A1, a2: A2, a3: A3, a4: A4, a5: A5, a6: A6, a7: A7, a8: A8);

impl<Args, Ret> Default for Delegate<'_, Args, Ret> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args, Ret> Clone for Delegate<'_, Args, Ret> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Args, Ret> Copy for Delegate<'_, Args, Ret> {}

/// Two delegates are equal when they hold the same adapter and the same
/// context, i.e. the exact same binding.
///
/// Adapters are compared by address. An optimizing build may fold two
/// functions that compile to identical machine code into one symbol, in which
/// case their delegates compare equal.
impl<Args, Ret> PartialEq for Delegate<'_, Args, Ret> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.context, other.context) && self.thunk_addr() == other.thunk_addr()
    }
}

impl<Args, Ret> Eq for Delegate<'_, Args, Ret> {}

impl<Args, Ret> Hash for Delegate<'_, Args, Ret> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.context.hash(state);
        self.thunk_addr().hash(state);
    }
}

impl<Args, Ret> fmt::Debug for Delegate<'_, Args, Ret> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.thunk_addr() {
            Some(thunk) => f
                .debug_struct("Delegate")
                .field("context", &self.context)
                .field("thunk", &thunk)
                .finish(),
            None => f.write_str("Delegate(empty)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::HashSet;

    fn double(x: i32) -> i32 {
        x * 2
    }

    fn triple(x: i32) -> i32 {
        x * 3
    }

    struct Counter {
        value: i32,
        calls: Cell<u32>,
    }

    impl Counter {
        fn new(value: i32) -> Self {
            Self {
                value,
                calls: Cell::new(0),
            }
        }

        fn add(&self, x: i32) -> i32 {
            self.calls.set(self.calls.get() + 1);
            self.value + x
        }
    }

    #[test]
    fn test_new_delegate_is_empty() {
        let delegate = Delegate::<(i32,), i32>::new();
        assert!(delegate.is_empty());
        assert_eq!(delegate, Delegate::default());
    }

    #[test]
    fn test_connect_free_function() {
        let mut delegate = Delegate::<(i32,), i32>::new();
        delegate.connect(double);
        assert!(!delegate.is_empty());
        assert_eq!(delegate.invoke(21), 42);
        assert_eq!(delegate.call((4,)), 8);
    }

    #[test]
    fn test_connect_method_mutates_through_cell() {
        let counter = Counter::new(5);
        let delegate = Delegate::<(i32,), i32>::from_method(Counter::add, &counter);
        assert_eq!(delegate.invoke(10), 15);
        assert_eq!(delegate.invoke(1), 6);
        assert_eq!(counter.calls.get(), 2);
    }

    #[test]
    fn test_non_capturing_closure() {
        let delegate = Delegate::<(i32, i32), i32>::from_fn(|a: i32, b: i32| a * b);
        assert_eq!(delegate.invoke(6, 7), 42);
    }

    #[test]
    fn test_unit_signature() {
        fn nothing() {}
        let delegate = Delegate::<()>::from_fn(nothing);
        delegate.invoke();
        assert!(!delegate.is_empty());
    }

    #[test]
    fn test_reset_clears_both_fields() {
        let counter = Counter::new(1);
        let mut delegate = Delegate::<(i32,), i32>::from_method(Counter::add, &counter);
        delegate.reset();
        assert!(delegate.is_empty());
        assert!(!delegate.is_bound_to(&counter));
        assert_eq!(delegate, Delegate::new());
    }

    #[test]
    fn test_try_call_on_empty() {
        let delegate = Delegate::<(i32,), i32>::new();
        assert_eq!(delegate.try_call((1,)), Err(DelegateError::Empty));
    }

    #[test]
    #[should_panic(expected = "empty delegate")]
    fn test_call_on_empty_panics() {
        let delegate = Delegate::<(i32,), i32>::new();
        delegate.invoke(1);
    }

    #[test]
    fn test_call_unchecked() {
        let delegate = Delegate::<(i32,), i32>::from_fn(triple);
        // SAFETY: the delegate is bound.
        assert_eq!(unsafe { delegate.call_unchecked((3,)) }, 9);
    }

    #[test]
    fn test_copies_share_binding() {
        let original = Delegate::<(i32,), i32>::from_fn(double);
        let copy = original;
        assert_eq!(original, copy);
        assert_eq!(copy.invoke(5), 10);
    }

    #[test]
    fn test_hash_follows_identity() {
        let a = Counter::new(1);
        let b = Counter::new(1);
        let mut set = HashSet::new();
        set.insert(Delegate::<(i32,), i32>::from_fn(double));
        set.insert(Delegate::from_fn(double));
        set.insert(Delegate::from_method(Counter::add, &a));
        set.insert(Delegate::from_method(Counter::add, &b));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_is_bound_to() {
        let a = Counter::new(1);
        let b = Counter::new(2);
        let delegate = Delegate::<(i32,), i32>::from_method(Counter::add, &a);
        assert!(delegate.is_bound_to(&a));
        assert!(!delegate.is_bound_to(&b));
        assert!(!Delegate::<(i32,), i32>::from_fn(double).is_bound_to(&a));
    }

    #[test]
    fn test_debug_output() {
        let empty = Delegate::<(i32,), i32>::new();
        assert_eq!(format!("{:?}", empty), "Delegate(empty)");
        let bound = Delegate::<(i32,), i32>::from_fn(double);
        assert!(format!("{:?}", bound).starts_with("Delegate {"));
    }

    #[test]
    fn test_two_words_wide() {
        assert_eq!(
            std::mem::size_of::<Delegate<'_, (i32,), i32>>(),
            2 * std::mem::size_of::<usize>()
        );
    }
}
