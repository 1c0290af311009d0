//! Types exchanged with the host across the C ABI, and the value-type
//! identities used to describe them.

mod handle;
mod native;
mod ptr;

use std::{borrow::Cow, fmt::Display};

pub use handle::ObjectHandle;
#[cfg(feature = "link")]
pub use handle::Property;
pub use native::NativeType;
pub(crate) use native::NATIVE_TYPE_COUNT;
pub use ptr::NativePtr;

/// Identity of a parameter or return type of a callable unit.
///
/// Every variant except [`TypeRef::Named`] corresponds to exactly one Rust
/// type implementing [`NativeType`], so two units with equal type references
/// always share one C-ABI shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// No value.
    Void,
    /// `bool`.
    Bool,
    /// `i8`.
    I8,
    /// `u8`.
    U8,
    /// `i16`.
    I16,
    /// `u16`.
    U16,
    /// `i32`.
    I32,
    /// `u32`.
    U32,
    /// `i64`.
    I64,
    /// `u64`.
    U64,
    /// `f32`.
    F32,
    /// `f64`.
    F64,
    /// The designated opaque handle type, [`ObjectHandle`].
    Handle,
    /// Any other type. Units using one can be described but never bound.
    Named(Cow<'static, str>),
}

impl TypeRef {
    /// Creates a reference to a type the binding layer has no C-ABI shape
    /// for.
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self::Named(name.into())
    }

    /// Returns the structural name of the type.
    #[must_use]
    pub fn full_name(&self) -> &str {
        match self {
            Self::Void => "void",
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::U8 => "u8",
            Self::I16 => "i16",
            Self::U16 => "u16",
            Self::I32 => "i32",
            Self::U32 => "u32",
            Self::I64 => "i64",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Handle => "ue4ss::ObjectHandle",
            Self::Named(name) => name,
        }
    }

    /// Returns the structural name with namespace separators removed, so it
    /// is usable as a single type-name token.
    #[must_use]
    pub fn normalized_name(&self) -> String {
        self.full_name().replace("::", "").replace('.', "")
    }

    /// Whether this is the designated handle type.
    #[must_use]
    pub fn is_handle(&self) -> bool {
        matches!(self, Self::Handle)
    }

    /// Whether a value of this type can cross the C ABI.
    #[must_use]
    pub fn is_native(&self) -> bool {
        !matches!(self, Self::Named(_))
    }
}

impl Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.full_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_name_strips_separators() {
        assert_eq!(TypeRef::Handle.normalized_name(), "ue4ssObjectHandle");
        assert_eq!(
            TypeRef::named("std::string::String").normalized_name(),
            "stdstringString"
        );
        assert_eq!(TypeRef::named("System.Int32").normalized_name(), "SystemInt32");
        assert_eq!(TypeRef::I32.normalized_name(), "i32");
    }

    #[test]
    fn test_native_types_are_distinct() {
        assert_eq!(<i32 as NativeType>::TYPE, TypeRef::I32);
        assert_eq!(<ObjectHandle as NativeType>::TYPE, TypeRef::Handle);
        assert_eq!(<() as NativeType>::TYPE, TypeRef::Void);
        assert_ne!(<u32 as NativeType>::TYPE, <i32 as NativeType>::TYPE);
        assert!(TypeRef::Handle.is_handle());
        assert!(!TypeRef::named("Handle").is_native());
    }
}
