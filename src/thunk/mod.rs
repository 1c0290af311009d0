//! Turns callable units into stable native function pointers.
//!
//! The synthesizer caches at two levels. Callable type descriptors are
//! cached by [`Signature`], so units of the same shape share one descriptor
//! across types, modules and loads. Bound thunks are cached by the unit's
//! qualified name and signature, so resolving a unit twice yields the same
//! pointer, and so does resolving its rebuilt counterpart after a reload.

mod descriptor;
mod slots;

use std::{collections::HashMap, sync::Arc};

use once_cell::sync::Lazy;
use parking_lot::{Mutex, MutexGuard};

use crate::{
    describe::{CallableUnit, Signature},
    error::{Error, Result},
    types::NativePtr,
};

pub use descriptor::{BoundThunk, CallableTypeDescriptor};
pub use slots::{SLOT_CAPACITY, slots_in_use};

pub(crate) use slots::{Body0, Body1, ErasedBody, Shape0, Shape1};

static SYNTHESIZER: Lazy<Mutex<ThunkSynthesizer>> =
    Lazy::new(|| Mutex::new(ThunkSynthesizer::new()));

/// Locks the process-wide synthesizer.
///
/// The lock is held for a whole plugin load, which keeps each build pass
/// single-threaded even when the host loads plugins from several threads.
pub fn synthesizer() -> MutexGuard<'static, ThunkSynthesizer> {
    SYNTHESIZER.lock()
}

/// Descriptor and thunk caches.
///
/// Trampoline slots are process-wide, so separate synthesizers never hand
/// out the same pointer twice. Hosts normally use the shared instance from
/// [`synthesizer`].
#[derive(Debug, Default)]
pub struct ThunkSynthesizer {
    descriptors: HashMap<Signature, Arc<CallableTypeDescriptor>>,
    thunks: HashMap<(String, Signature), Arc<BoundThunk>>,
}

impl ThunkSynthesizer {
    /// Creates a synthesizer with empty caches.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the descriptor for the unit's signature, synthesizing it on
    /// first use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Synthesis`] if the unit has no invocable body.
    pub fn descriptor(&mut self, unit: &CallableUnit) -> Result<Arc<CallableTypeDescriptor>> {
        if let Some(descriptor) = self.descriptors.get(unit.signature()) {
            return Ok(Arc::clone(descriptor));
        }

        let binder = unit.binder().ok_or_else(|| Error::Synthesis {
            name: unit.qualified_name(),
            signature: unit.signature().mangled_name(),
        })?;
        let descriptor = Arc::new((binder.shape)(unit.signature()));
        tracing::debug!(descriptor = descriptor.name(), "synthesized callable type");
        self.descriptors
            .insert(unit.signature().clone(), Arc::clone(&descriptor));
        Ok(descriptor)
    }

    /// Returns the thunk bound to the unit, binding it on first use.
    ///
    /// A cached thunk is returned as is when it was bound to this very unit.
    /// A different unit with the same qualified name and signature, typically
    /// from a reloaded plugin, takes over the slot of the previous one: the
    /// pointer does not change and calls the new body from then on. Only a
    /// new name and signature pair takes a new slot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Synthesis`] if the unit has no invocable body, or
    /// [`Error::SlotsExhausted`] if no trampoline slot of the unit's shape
    /// is left.
    pub fn bind(&mut self, unit: &CallableUnit) -> Result<Arc<BoundThunk>> {
        let key = (unit.qualified_name(), unit.signature().clone());
        let previous = match self.thunks.get(&key) {
            Some(thunk) if thunk.unit() == unit.id() => return Ok(Arc::clone(thunk)),
            Some(thunk) => Some(thunk.slot()),
            None => None,
        };

        let descriptor = self.descriptor(unit)?;
        let name = key.0.clone();
        let binder = unit.binder().ok_or_else(|| Error::Synthesis {
            name: name.clone(),
            signature: descriptor.name().to_owned(),
        })?;
        let exhausted = || Error::SlotsExhausted {
            name: name.clone(),
            capacity: SLOT_CAPACITY,
        };
        let body = Arc::clone(&binder.body);
        let slot = match previous {
            Some(slot) => {
                tracing::debug!(unit = %name, slot, "rebinding unit with a new identity");
                slots::rebind(descriptor.bank(), slot, &name, body);
                slot
            }
            None => slots::bind(descriptor.bank(), &name, body).ok_or_else(exhausted)?,
        };
        let pointer = descriptor.pointer(slot).ok_or_else(exhausted)?;

        let thunk = Arc::new(BoundThunk::new(
            unit.id(),
            name.clone(),
            slot,
            pointer,
            descriptor,
        ));
        self.thunks.insert(key, Arc::clone(&thunk));
        Ok(thunk)
    }

    /// Resolves the native pointer of a unit.
    ///
    /// # Errors
    ///
    /// See [`ThunkSynthesizer::bind`].
    pub fn resolve(&mut self, unit: &CallableUnit) -> Result<NativePtr> {
        self.bind(unit).map(|thunk| thunk.pointer())
    }

    /// Number of distinct signatures synthesized so far.
    #[must_use]
    pub fn descriptor_count(&self) -> usize {
        self.descriptors.len()
    }

    /// Number of cached thunks.
    #[must_use]
    pub fn thunk_count(&self) -> usize {
        self.thunks.len()
    }
}
