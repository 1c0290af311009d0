use std::{fmt::Display, ops::Index};

use super::ScannedModule;
use crate::{
    error::{Error, Result},
    thunk::ThunkSynthesizer,
    types::NativePtr,
};

/// Number of lifecycle slots the host reserves.
pub const LIFECYCLE_SLOT_COUNT: usize = 5;

/// A zero-argument function of the entry type that the host calls at a fixed
/// moment. The discriminant is the slot the host reads the pointer from.
#[repr(usize)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LifecycleHook {
    /// Called when the mod is started.
    StartMod = 0,
    /// Called when the mod is stopped.
    StopMod = 1,
    /// Called once the game program has started.
    ProgramStart = 2,
    /// Called once the engine has been initialized.
    UnrealInit = 3,
    /// Called on every engine tick.
    Update = 4,
}

impl LifecycleHook {
    /// Every hook, in slot order.
    pub const ALL: [Self; LIFECYCLE_SLOT_COUNT] = [
        Self::StartMod,
        Self::StopMod,
        Self::ProgramStart,
        Self::UnrealInit,
        Self::Update,
    ];

    /// Function name the hook is recognized by.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::StartMod => "StartMod",
            Self::StopMod => "StopMod",
            Self::ProgramStart => "ProgramStart",
            Self::UnrealInit => "UnrealInit",
            Self::Update => "Update",
        }
    }

    /// Index of the host slot the hook is written to.
    #[must_use]
    pub const fn slot(self) -> usize {
        self as usize
    }

    /// Looks a hook up by its function name. Matching is case-sensitive.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|hook| hook.name() == name)
    }
}

impl Display for LifecycleHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The lifecycle slot table. Unset slots are `None` and are left at the
/// host's defaults when written out.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleSlots([Option<NativePtr>; LIFECYCLE_SLOT_COUNT]);

impl LifecycleSlots {
    /// Returns the pointer resolved for a hook.
    #[must_use]
    pub fn get(&self, hook: LifecycleHook) -> Option<NativePtr> {
        self.0[hook.slot()]
    }

    pub(crate) fn set(&mut self, hook: LifecycleHook, pointer: NativePtr) {
        self.0[hook.slot()] = Some(pointer);
    }

    /// Iterates every hook with its pointer, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (LifecycleHook, Option<NativePtr>)> + '_ {
        LifecycleHook::ALL
            .into_iter()
            .map(|hook| (hook, self.get(hook)))
    }

    /// Number of populated slots.
    #[must_use]
    pub fn populated(&self) -> usize {
        self.0.iter().flatten().count()
    }

    /// Whether no slot is populated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.populated() == 0
    }

    /// The slots as raw pointers, with unset slots null.
    #[must_use]
    pub fn to_raw(&self) -> [NativePtr; LIFECYCLE_SLOT_COUNT] {
        self.0.map(Option::unwrap_or_default)
    }
}

impl Index<LifecycleHook> for LifecycleSlots {
    type Output = Option<NativePtr>;

    fn index(&self, hook: LifecycleHook) -> &Self::Output {
        &self.0[hook.slot()]
    }
}

/// Finds the entry type and resolves its lifecycle hooks.
///
/// A missing entry type or a missing hook leaves the slot unset. A hook name
/// declared with parameters fails the load, since the host calls every slot
/// without arguments.
pub(crate) fn resolve(
    module: &ScannedModule,
    entry_type: &str,
    synth: &mut ThunkSynthesizer,
) -> Result<LifecycleSlots> {
    let mut candidates = module.types().iter().filter(|ty| ty.name() == entry_type);
    let Some(entry) = candidates.next() else {
        tracing::debug!(entry_type, "no entry type, lifecycle slots left unset");
        return Ok(LifecycleSlots::default());
    };
    let others: Vec<_> = candidates.map(|ty| ty.full_name().to_owned()).collect();
    if !others.is_empty() {
        return Err(Error::AmbiguousEntryType {
            name: entry_type.to_owned(),
            candidates: std::iter::once(entry.full_name().to_owned())
                .chain(others)
                .collect(),
        });
    }

    let hooks: Vec<_> = entry
        .units()
        .iter()
        .filter_map(|unit| LifecycleHook::from_name(unit.name()).map(|hook| (hook, unit)))
        .collect();

    if let Some((_, unit)) = hooks.iter().find(|(_, unit)| unit.arity() != 0) {
        return Err(Error::HookArity {
            name: unit.qualified_name(),
            arity: unit.arity(),
        });
    }

    let mut slots = LifecycleSlots::default();
    for (hook, unit) in hooks {
        if slots.get(hook).is_some() {
            continue;
        }
        let pointer = synth.resolve(unit)?;
        tracing::debug!(%hook, slot = hook.slot(), unit = %unit.qualified_name(), "bound lifecycle hook");
        slots.set(hook, pointer);
    }
    Ok(slots)
}
