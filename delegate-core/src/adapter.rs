//! Adapter ("thunk") generation
//!
//! Every binding is reduced to one uniform shape: an opaque context pointer
//! and an adapter of type [`Thunk<Args, Ret>`]. One adapter is monomorphized
//! per bound function item (or per method and instance type), so the adapter
//! itself knows which function to call and only the context has to be stored.
//!
//! Targets must be zero-sized: function items and non-capturing closures. The
//! adapter rebuilds the target from its type alone, which is only possible
//! when the type has exactly one value.

use std::mem;

/// Fixed-signature adapter stored by a [`Delegate`](crate::Delegate).
///
/// The first argument is the opaque context (null for free functions).
pub type Thunk<Args, Ret> = unsafe fn(*const (), Args) -> Ret;

/// A free function that can be bound to a delegate taking `Args` and
/// returning `Ret`.
///
/// Implemented for every `Fn(A, B, ..) -> R` with up to eight arguments whose
/// result converts into `Ret`. `Args` is the argument tuple.
pub trait FreeFn<Args, Ret>: Copy + 'static {
    /// Calls the function with the unpacked argument tuple.
    fn call_free(self, args: Args) -> Ret;
}

/// A method of `C` that can be bound to a delegate together with an instance.
///
/// Implemented for every `Fn(&C, A, B, ..) -> R` with up to eight arguments
/// after the receiver, which covers `C::method` paths for `&self` methods.
pub trait Method<C, Args, Ret>: Copy + 'static {
    /// Calls the method on `instance` with the unpacked argument tuple.
    fn call_method(self, instance: &C, args: Args) -> Ret;
}

macro_rules! impl_bindable {
    ($($arg:ident),*) => {
        impl<F, R, Ret, $($arg,)*> FreeFn<($($arg,)*), Ret> for F
        where
            F: Fn($($arg),*) -> R + Copy + 'static,
            R: Into<Ret>,
        {
            #[inline(always)]
            #[allow(non_snake_case)]
            fn call_free(self, ($($arg,)*): ($($arg,)*)) -> Ret {
                self($($arg),*).into()
            }
        }

        impl<F, C, R, Ret, $($arg,)*> Method<C, ($($arg,)*), Ret> for F
        where
            F: Fn(&C, $($arg),*) -> R + Copy + 'static,
            R: Into<Ret>,
        {
            #[inline(always)]
            #[allow(non_snake_case)]
            fn call_method(self, instance: &C, ($($arg,)*): ($($arg,)*)) -> Ret {
                self(instance, $($arg),*).into()
            }
        }
    };
}

impl_bindable!();
impl_bindable!(A1);
impl_bindable!(A1, A2);
impl_bindable!(A1, A2, A3);
impl_bindable!(A1, A2, A3, A4);
impl_bindable!(A1, A2, A3, A4, A5);
impl_bindable!(A1, A2, A3, A4, A5, A6);
impl_bindable!(A1, A2, A3, A4, A5, A6, A7);
impl_bindable!(A1, A2, A3, A4, A5, A6, A7, A8);

/// Returns the adapter for a free function target.
///
/// Fails to compile when `F` is not zero-sized (capturing closures, `fn`
/// pointer values, references to closures).
#[inline]
pub(crate) fn free_adapter<F, Args, Ret>() -> Thunk<Args, Ret>
where
    F: FreeFn<Args, Ret>,
{
    const {
        assert!(
            mem::size_of::<F>() == 0,
            "delegate targets must be function items or non-capturing closures"
        )
    };
    free_thunk::<F, Args, Ret>
}

/// Returns the adapter for a method target on instances of `C`.
#[inline]
pub(crate) fn method_adapter<C, M, Args, Ret>() -> Thunk<Args, Ret>
where
    M: Method<C, Args, Ret>,
{
    const {
        assert!(
            mem::size_of::<M>() == 0,
            "delegate methods must be method paths or non-capturing closures"
        )
    };
    assert_addressable::<C>();
    method_thunk::<C, M, Args, Ret>
}

/// Fails to compile when `C` is zero-sized.
///
/// Distinct zero-sized values may share an address, so their bindings could
/// not be told apart by context pointer.
#[inline(always)]
pub(crate) fn assert_addressable<C>() {
    const {
        assert!(
            mem::size_of::<C>() != 0,
            "delegate instances must not be zero-sized types"
        )
    };
}

unsafe fn free_thunk<F, Args, Ret>(_context: *const (), args: Args) -> Ret
where
    F: FreeFn<Args, Ret>,
{
    // SAFETY: `free_adapter` only hands out this thunk for zero-sized `F`.
    let function = unsafe { conjure::<F>() };
    function.call_free(args)
}

/// # Safety
/// `context` must point to a live `C`, as stored by `Delegate::connect_method`.
unsafe fn method_thunk<C, M, Args, Ret>(context: *const (), args: Args) -> Ret
where
    M: Method<C, Args, Ret>,
{
    // SAFETY: the delegate holds the `&'a C` borrow this pointer came from.
    let instance = unsafe { &*context.cast::<C>() };
    // SAFETY: `method_adapter` only hands out this thunk for zero-sized `M`.
    let method = unsafe { conjure::<M>() };
    method.call_method(instance, args)
}

/// # Safety
/// `T` must be zero-sized and a value of `T` must already have existed.
#[inline(always)]
unsafe fn conjure<T: Copy>() -> T {
    debug_assert_eq!(mem::size_of::<T>(), 0);
    // SAFETY: a zero-sized type has no bytes, so there is nothing to initialise.
    unsafe { mem::zeroed() }
}
