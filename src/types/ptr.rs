use std::ffi::c_void;

use super::NativeType;

/// An untyped native function pointer handed to the host.
///
/// A pointer produced by the binding engine stays valid for the rest of the
/// process, and must be called with the exact shape of the unit it was
/// resolved from.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativePtr(*const c_void);

// SAFETY: The pointer is a code address; it carries no thread-bound state.
unsafe impl Send for NativePtr {}
// SAFETY: See above.
unsafe impl Sync for NativePtr {}

impl Default for NativePtr {
    fn default() -> Self {
        Self::null()
    }
}

impl NativePtr {
    /// Returns a null pointer, used for unset lifecycle slots.
    #[must_use]
    pub const fn null() -> Self {
        Self(std::ptr::null())
    }

    /// Wraps a raw address.
    #[must_use]
    pub const fn from_ptr(ptr: *const c_void) -> Self {
        Self(ptr)
    }

    /// Returns the raw address.
    #[must_use]
    pub const fn as_ptr(self) -> *const c_void {
        self.0
    }

    /// Whether the pointer is null.
    #[must_use]
    pub fn is_null(self) -> bool {
        self.0.is_null()
    }

    pub(crate) fn from_fn0<R: NativeType>(f: extern "C" fn() -> R::Abi) -> Self {
        Self(f as *const c_void)
    }

    pub(crate) fn from_fn1<A: NativeType, R: NativeType>(
        f: extern "C" fn(A::Abi) -> R::Abi,
    ) -> Self {
        Self(f as *const c_void)
    }

    /// Reinterprets the pointer as a function taking no arguments.
    ///
    /// # Safety
    ///
    /// The pointer must be non-null and must have been resolved from a unit
    /// of shape `() -> R`.
    #[must_use]
    pub unsafe fn as_fn0<R: NativeType>(self) -> extern "C" fn() -> R::Abi {
        unsafe { std::mem::transmute_copy::<*const c_void, extern "C" fn() -> R::Abi>(&self.0) }
    }

    /// Reinterprets the pointer as a function taking one argument.
    ///
    /// # Safety
    ///
    /// The pointer must be non-null and must have been resolved from a unit
    /// of shape `(A) -> R`.
    #[must_use]
    pub unsafe fn as_fn1<A: NativeType, R: NativeType>(self) -> extern "C" fn(A::Abi) -> R::Abi {
        unsafe {
            std::mem::transmute_copy::<*const c_void, extern "C" fn(A::Abi) -> R::Abi>(&self.0)
        }
    }

    /// Calls the pointer the way the host does for a zero-argument export.
    ///
    /// # Safety
    ///
    /// Same requirements as [`NativePtr::as_fn0`].
    pub unsafe fn call0<R: NativeType>(self) -> R {
        let f = unsafe { self.as_fn0::<R>() };
        R::from_abi(f())
    }

    /// Calls the pointer the way the host does for a one-argument export.
    ///
    /// # Safety
    ///
    /// Same requirements as [`NativePtr::as_fn1`].
    pub unsafe fn call1<A: NativeType, R: NativeType>(self, arg: A) -> R {
        let f = unsafe { self.as_fn1::<A, R>() };
        R::from_abi(f(arg.into_abi()))
    }
}
