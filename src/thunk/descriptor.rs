use std::{fmt::Debug, sync::Arc};

use crate::{
    describe::{Signature, UnitId},
    types::NativePtr,
};

/// Produces the trampoline of one shape for a slot index.
pub(crate) type PointerFn = fn(usize) -> Option<NativePtr>;

/// The callable type of one signature: the trampoline table able to invoke
/// any unit of that exact shape through the C ABI.
///
/// Descriptors are created at most once per signature by a
/// [`ThunkSynthesizer`](super::ThunkSynthesizer) and shared by every unit of
/// that shape, whichever type or module declares it.
pub struct CallableTypeDescriptor {
    name: String,
    signature: Signature,
    bank: usize,
    pointer: PointerFn,
}

impl CallableTypeDescriptor {
    pub(crate) fn new(signature: Signature, bank: usize, pointer: PointerFn) -> Self {
        Self {
            name: signature.mangled_name(),
            signature,
            bank,
            pointer,
        }
    }

    /// Name of the descriptor, derived from its signature.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Signature the descriptor was synthesized for.
    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Slot bank shared by every unit of this shape.
    pub(crate) fn bank(&self) -> usize {
        self.bank
    }

    pub(crate) fn pointer(&self, slot: usize) -> Option<NativePtr> {
        (self.pointer)(slot)
    }
}

impl Debug for CallableTypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallableTypeDescriptor")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// A callable unit bound to a trampoline slot.
///
/// The slot is never released, so [`BoundThunk::pointer`] stays a valid
/// address for the rest of the process. Rebinding a unit of the same name
/// and signature replaces the body behind it.
#[derive(Debug)]
pub struct BoundThunk {
    unit: UnitId,
    name: String,
    slot: usize,
    pointer: NativePtr,
    descriptor: Arc<CallableTypeDescriptor>,
}

impl BoundThunk {
    pub(crate) fn new(
        unit: UnitId,
        name: String,
        slot: usize,
        pointer: NativePtr,
        descriptor: Arc<CallableTypeDescriptor>,
    ) -> Self {
        Self {
            unit,
            name,
            slot,
            pointer,
            descriptor,
        }
    }

    /// Identity of the bound unit.
    #[must_use]
    pub fn unit(&self) -> UnitId {
        self.unit
    }

    /// Qualified name of the bound unit.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Trampoline slot holding the unit's body.
    #[must_use]
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Native pointer to hand to the host.
    #[must_use]
    pub fn pointer(&self) -> NativePtr {
        self.pointer
    }

    /// Descriptor the thunk was instantiated from.
    #[must_use]
    pub fn descriptor(&self) -> &Arc<CallableTypeDescriptor> {
        &self.descriptor
    }
}
