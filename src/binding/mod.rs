//! The binding-table construction pass.
//!
//! A load scans a plugin module, resolves the lifecycle hooks of its entry
//! type and builds the export table, binding each unit to a native pointer
//! through the process-wide [`ThunkSynthesizer`]. A load either produces
//! complete tables or fails without handing anything to the host.

mod exports;
mod lifecycle;
mod scanner;

use crate::{
    config::BindingConfig,
    describe::PluginModule,
    error::Result,
    thunk::{self, ThunkSynthesizer},
    types::NativePtr,
};

pub use exports::{Diagnostic, ExportEntry, ExportTable, export_hash};
pub use lifecycle::{LIFECYCLE_SLOT_COUNT, LifecycleHook, LifecycleSlots};
pub use scanner::{ScannedModule, ScannedType, scan};

/// The tables produced by a successful load.
#[derive(Debug, Clone)]
pub struct LoadedPlugin {
    module: String,
    lifecycle: LifecycleSlots,
    exports: ExportTable,
    diagnostics: Vec<Diagnostic>,
}

impl LoadedPlugin {
    /// Name of the loaded module.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Resolved lifecycle hooks.
    #[must_use]
    pub fn lifecycle(&self) -> &LifecycleSlots {
        &self.lifecycle
    }

    /// Exported functions.
    #[must_use]
    pub fn exports(&self) -> &ExportTable {
        &self.exports
    }

    /// Non-fatal conditions met during the load.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Splits the result into its lifecycle slots and export table.
    #[must_use]
    pub fn into_parts(self) -> (LifecycleSlots, ExportTable) {
        (self.lifecycle, self.exports)
    }
}

/// Builds the binding tables of a plugin module with the process-wide
/// synthesizer.
///
/// The synthesizer stays locked for the whole pass. Each call builds fresh
/// tables; descriptors are shared with earlier loads. A new unit that has
/// the name and signature of an earlier one reuses its pointer.
///
/// # Errors
///
/// Fails if the module cannot be enumerated, if a lifecycle hook takes
/// parameters, if the entry type is ambiguous, on an export collision when
/// collisions are rejected, or if a unit cannot be bound.
pub fn load<M: PluginModule + ?Sized>(config: &BindingConfig, module: &M) -> Result<LoadedPlugin> {
    let mut synth = thunk::synthesizer();
    load_with(&mut synth, config, module)
}

/// Builds the binding tables of a plugin module with the given synthesizer.
///
/// # Errors
///
/// See [`load`].
pub fn load_with<M: PluginModule + ?Sized>(
    synth: &mut ThunkSynthesizer,
    config: &BindingConfig,
    module: &M,
) -> Result<LoadedPlugin> {
    let span = tracing::info_span!("load", module = module.name());
    let _enter = span.enter();

    let scanned = scan(module).inspect_err(|e| tracing::error!("{e}"))?;
    let lifecycle = lifecycle::resolve(&scanned, config.entry_type_name(), synth)
        .inspect_err(|e| tracing::error!("{e}"))?;
    let mut diagnostics = Vec::new();
    let exports = exports::build(&scanned, config.policy(), synth, &mut diagnostics)
        .inspect_err(|e| tracing::error!("{e}"))?;

    tracing::info!(
        hooks = lifecycle.populated(),
        exports = exports.len(),
        diagnostics = diagnostics.len(),
        descriptors = synth.descriptor_count(),
        "plugin module bound"
    );

    Ok(LoadedPlugin {
        module: scanned.name().to_owned(),
        lifecycle,
        exports,
        diagnostics,
    })
}

/// Loads a plugin module and writes its lifecycle hooks into the host's
/// event slot array.
///
/// Slots are written only once the whole load has succeeded, and only for
/// hooks the module declares; the others keep the values the host put there.
/// On error nothing is written.
///
/// # Safety
///
/// `events` must be null or point to [`LIFECYCLE_SLOT_COUNT`] writable
/// pointers.
///
/// # Errors
///
/// See [`load`].
pub unsafe fn load_into<M: PluginModule + ?Sized>(
    events: *mut NativePtr,
    config: &BindingConfig,
    module: &M,
) -> Result<ExportTable> {
    let (lifecycle, exports) = load(config, module)?.into_parts();
    if !events.is_null() {
        for (hook, pointer) in lifecycle.iter() {
            if let Some(pointer) = pointer {
                // SAFETY: `events` holds `LIFECYCLE_SLOT_COUNT` pointers and
                // every slot index is below that.
                unsafe { events.add(hook.slot()).write(pointer) };
            }
        }
    }
    Ok(exports)
}
