use std::{
    fmt::Debug,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use super::Signature;
use crate::{
    flags::UnitFlags,
    thunk::{Body0, Body1, CallableTypeDescriptor, ErasedBody, Shape0, Shape1},
    types::{NativeType, TypeRef},
};

static NEXT_UNIT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`CallableUnit`]. Clones of a unit share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(u64);

impl UnitId {
    fn next() -> Self {
        Self(NEXT_UNIT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// The invocable half of a unit: its type-erased body, plus the function
/// producing a callable type descriptor for the body's shape.
#[derive(Clone)]
pub(crate) struct Binder {
    pub(crate) body: ErasedBody,
    pub(crate) shape: fn(&Signature) -> CallableTypeDescriptor,
}

/// A function discovered in a plugin module.
///
/// Units built with [`CallableUnit::function0`] or [`CallableUnit::function1`]
/// carry a body and can be turned into native pointers. Units built with
/// [`CallableUnit::opaque`] only describe a function; the binding engine
/// skips them, or rejects them where the host requires a pointer.
#[derive(Clone)]
pub struct CallableUnit {
    id: UnitId,
    declaring_type: String,
    name: String,
    signature: Signature,
    flags: UnitFlags,
    binder: Option<Binder>,
}

impl CallableUnit {
    fn new(
        name: impl Into<String>,
        signature: Signature,
        flags: UnitFlags,
        binder: Option<Binder>,
    ) -> Self {
        Self {
            id: UnitId::next(),
            declaring_type: String::new(),
            name: name.into(),
            signature,
            flags,
            binder,
        }
    }

    /// Creates a public static unit taking no arguments.
    ///
    /// # Parameters
    ///
    /// * `name` - Name of the unit within its declaring type.
    /// * `body` - The function invoked when the host calls the unit.
    pub fn function0<R, F>(name: impl Into<String>, body: F) -> Self
    where
        R: NativeType,
        F: Fn() -> R + Send + Sync + 'static,
    {
        let body: Body0<R> = Box::new(body);
        Self::new(
            name,
            Signature::new(Vec::new(), R::TYPE),
            UnitFlags::Exported,
            Some(Binder {
                body: Arc::new(body),
                shape: Shape0::<R>::descriptor,
            }),
        )
    }

    /// Creates a public static unit taking one argument.
    ///
    /// Only units whose argument is an [`ObjectHandle`] are exported to the
    /// host; any other argument type makes the unit describe-only in
    /// practice.
    ///
    /// [`ObjectHandle`]: crate::types::ObjectHandle
    pub fn function1<A, R, F>(name: impl Into<String>, body: F) -> Self
    where
        A: NativeType,
        R: NativeType,
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        let body: Body1<A, R> = Box::new(body);
        Self::new(
            name,
            Signature::new(vec![A::TYPE], R::TYPE),
            UnitFlags::Exported,
            Some(Binder {
                body: Arc::new(body),
                shape: Shape1::<A, R>::descriptor,
            }),
        )
    }

    /// Creates a public static unit that has no invocable body.
    pub fn opaque(name: impl Into<String>, params: impl Into<Vec<TypeRef>>, ret: TypeRef) -> Self {
        Self::new(name, Signature::new(params, ret), UnitFlags::Exported, None)
    }

    /// Replaces the unit's flags.
    #[must_use]
    pub fn with_flags(mut self, flags: UnitFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Marks the unit as not visible outside its declaring type.
    #[must_use]
    pub fn private(mut self) -> Self {
        self.flags.remove(UnitFlags::Public);
        self
    }

    /// Marks the unit as taking a receiver.
    #[must_use]
    pub fn instance(mut self) -> Self {
        self.flags.remove(UnitFlags::Static);
        self
    }

    /// Marks the unit as generic.
    #[must_use]
    pub fn generic(mut self) -> Self {
        self.flags.insert(UnitFlags::Generic);
        self
    }

    pub(crate) fn declared_by(&mut self, declaring_type: &str) {
        declaring_type.clone_into(&mut self.declaring_type);
    }

    /// Identity of the unit.
    #[must_use]
    pub fn id(&self) -> UnitId {
        self.id
    }

    /// Name of the unit within its declaring type.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full name of the declaring type. Empty until the unit is added to a
    /// [`TypeInfo`](super::TypeInfo).
    #[must_use]
    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    /// `DeclaringType.Name`, the name exports are keyed by.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        if self.declaring_type.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.declaring_type, self.name)
        }
    }

    /// Shape of the unit.
    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Parameter types in declaration order.
    #[must_use]
    pub fn params(&self) -> &[TypeRef] {
        self.signature.params()
    }

    /// Return type.
    #[must_use]
    pub fn ret(&self) -> &TypeRef {
        self.signature.ret()
    }

    /// Number of parameters.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.signature.arity()
    }

    /// Flags of the unit.
    #[must_use]
    pub fn flags(&self) -> UnitFlags {
        self.flags
    }

    /// Whether the unit is public, static and not generic.
    #[must_use]
    pub fn is_eligible(&self) -> bool {
        self.flags.is_eligible()
    }

    /// Whether the unit carries a body that can be bound.
    #[must_use]
    pub fn is_invocable(&self) -> bool {
        self.binder.is_some()
    }

    pub(crate) fn binder(&self) -> Option<&Binder> {
        self.binder.as_ref()
    }
}

impl Debug for CallableUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallableUnit")
            .field("id", &self.id)
            .field("name", &self.qualified_name())
            .field("signature", &self.signature)
            .field("flags", &self.flags)
            .field("invocable", &self.is_invocable())
            .finish()
    }
}
