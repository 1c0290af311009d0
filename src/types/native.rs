use super::{ObjectHandle, TypeRef};

/// A Rust type that can be passed to, or returned from, a bound plugin
/// function through the C ABI.
///
/// The set of implementors is closed: each maps to a distinct [`TypeRef`]
/// variant, which is what lets the thunk synthesizer share one trampoline
/// table between every unit of the same shape. The trait is sealed, so no
/// other type can claim one of those variants.
///
/// ```compile_fail
/// use ue4ss_bindings::types::{NativeType, TypeRef};
///
/// #[derive(Clone, Copy)]
/// struct MyHandle(usize);
///
/// impl NativeType for MyHandle {
///     type Abi = usize;
///     const TYPE: TypeRef = TypeRef::Handle;
///     const INDEX: usize = 12;
///
///     fn into_abi(self) -> usize {
///         self.0
///     }
///
///     fn from_abi(abi: usize) -> Self {
///         Self(abi)
///     }
///
///     fn fallback() -> usize {
///         0
///     }
/// }
/// ```
pub trait NativeType: sealed::Sealed + Sized + Send + 'static {
    /// Representation of the value at the C ABI.
    type Abi: Copy + 'static;

    /// Type identity used in signatures.
    const TYPE: TypeRef;

    /// Position of the type among the native types. Trampoline banks are
    /// indexed by it.
    #[doc(hidden)]
    const INDEX: usize;

    /// Converts the value into its C-ABI representation.
    fn into_abi(self) -> Self::Abi;

    /// Converts a C-ABI value back into the Rust value.
    fn from_abi(abi: Self::Abi) -> Self;

    /// Value returned to the host when the bound body cannot produce one,
    /// for example because it panicked.
    fn fallback() -> Self::Abi;
}

mod sealed {
    pub trait Sealed {}
}

/// Number of types implementing [`NativeType`].
pub(crate) const NATIVE_TYPE_COUNT: usize = 13;

macro_rules! native_type {
    ($($ty: ty => $variant: ident = $index: literal),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl NativeType for $ty {
                type Abi = $ty;

                const TYPE: TypeRef = TypeRef::$variant;

                const INDEX: usize = $index;

                #[inline]
                fn into_abi(self) -> Self::Abi {
                    self
                }

                #[inline]
                fn from_abi(abi: Self::Abi) -> Self {
                    abi
                }

                #[inline]
                fn fallback() -> Self::Abi {
                    <$ty>::default()
                }
            }
        )*
    };
}

native_type!(
    () => Void = 0,
    bool => Bool = 1,
    i8 => I8 = 2,
    u8 => U8 = 3,
    i16 => I16 = 4,
    u16 => U16 = 5,
    i32 => I32 = 6,
    u32 => U32 = 7,
    i64 => I64 = 8,
    u64 => U64 = 9,
    f32 => F32 = 10,
    f64 => F64 = 11,
);

impl sealed::Sealed for ObjectHandle {}

impl NativeType for ObjectHandle {
    type Abi = ObjectHandle;

    const TYPE: TypeRef = TypeRef::Handle;

    const INDEX: usize = 12;

    #[inline]
    fn into_abi(self) -> Self::Abi {
        self
    }

    #[inline]
    fn from_abi(abi: Self::Abi) -> Self {
        abi
    }

    #[inline]
    fn fallback() -> Self::Abi {
        ObjectHandle::null()
    }
}
