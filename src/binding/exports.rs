use std::{
    collections::{BTreeMap, btree_map::Entry},
    fmt::Display,
};

use xxhash_rust::xxh3::xxh3_64;

use super::ScannedModule;
use crate::{
    describe::CallableUnit,
    error::{Error, Result},
    flags::CollisionPolicy,
    thunk::ThunkSynthesizer,
    types::NativePtr,
};

/// Export key of a qualified name.
///
/// The hash is computed over the exact UTF-8 bytes of the name: it is
/// case-sensitive and independent of locale. Hosts must compute keys with
/// this same function, which is also exported as
/// [`ue4ss_export_hash`](crate::ffi::ue4ss_export_hash).
#[must_use]
pub fn export_hash(name: &str) -> u64 {
    xxh3_64(name.as_bytes())
}

/// A non-fatal condition met while building the tables.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Diagnostic {
    /// Two units map to the same export key. The first one was kept.
    ExportCollision {
        /// The shared export key.
        key: u64,
        /// Qualified name of the unit kept in the table.
        kept: String,
        /// Qualified name of the unit left out of the table.
        skipped: String,
    },
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExportCollision { key, kept, skipped } => write!(
                f,
                "Export `{skipped}` was skipped: `{kept}` already uses key {key:#018x}."
            ),
        }
    }
}

/// An exported function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportEntry {
    key: u64,
    name: String,
    pointer: NativePtr,
}

impl ExportEntry {
    /// Export key of the function.
    #[must_use]
    pub fn key(&self) -> u64 {
        self.key
    }

    /// Qualified name of the function.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Native pointer of the function.
    #[must_use]
    pub fn pointer(&self) -> NativePtr {
        self.pointer
    }
}

/// Exported functions keyed by the [`export_hash`] of their qualified name.
///
/// The table is append-only while it is built and iterates in key order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExportTable {
    entries: BTreeMap<u64, ExportEntry>,
}

impl ExportTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the pointer registered under a key.
    #[must_use]
    pub fn get(&self, key: u64) -> Option<NativePtr> {
        self.entries.get(&key).map(ExportEntry::pointer)
    }

    /// Returns the pointer registered under a qualified name.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<NativePtr> {
        self.entries
            .get(&export_hash(name))
            .filter(|entry| entry.name == name)
            .map(ExportEntry::pointer)
    }

    /// Returns the entry registered under a key.
    #[must_use]
    pub fn entry(&self, key: u64) -> Option<&ExportEntry> {
        self.entries.get(&key)
    }

    /// Whether a key is registered.
    #[must_use]
    pub fn contains_key(&self, key: u64) -> bool {
        self.entries.contains_key(&key)
    }

    /// Number of exports.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no exports.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates the exports in key order.
    pub fn iter(&self) -> impl Iterator<Item = &ExportEntry> {
        self.entries.values()
    }
}

impl<'a> IntoIterator for &'a ExportTable {
    type Item = &'a ExportEntry;
    type IntoIter = std::collections::btree_map::Values<'a, u64, ExportEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}

/// Whether a unit has a shape the host can call: no parameters, or a single
/// object handle.
fn is_exportable(unit: &CallableUnit) -> bool {
    match unit.params() {
        [] => true,
        [param] => param.is_handle(),
        _ => false,
    }
}

/// Builds the export table of a scanned module.
///
/// Units of any other shape, and units without an invocable body, are
/// skipped. Collisions follow `policy`; they are detected before the second
/// unit is bound.
pub(crate) fn build(
    module: &ScannedModule,
    policy: CollisionPolicy,
    synth: &mut ThunkSynthesizer,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<ExportTable> {
    let mut table = ExportTable::new();

    for unit in module.units() {
        if !is_exportable(unit) || !unit.is_invocable() {
            tracing::trace!(unit = %unit.qualified_name(), signature = %unit.signature(), "not exportable");
            continue;
        }

        let name = unit.qualified_name();
        let key = export_hash(&name);
        match table.entries.entry(key) {
            Entry::Occupied(existing) => {
                let existing = existing.get().name.clone();
                match policy {
                    CollisionPolicy::Reject => {
                        return Err(Error::ExportCollision {
                            key,
                            existing,
                            rejected: name,
                        });
                    }
                    CollisionPolicy::FirstWins => {
                        tracing::warn!(key, kept = %existing, skipped = %name, "export collision");
                        diagnostics.push(Diagnostic::ExportCollision {
                            key,
                            kept: existing,
                            skipped: name,
                        });
                    }
                }
            }
            Entry::Vacant(slot) => {
                let pointer = synth.resolve(unit)?;
                tracing::debug!(unit = %name, "bound export");
                slot.insert(ExportEntry { key, name, pointer });
            }
        }
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ObjectHandle, TypeRef};

    #[test]
    fn test_hash_is_ordinal() {
        assert_eq!(export_hash("Utils.Greet"), export_hash("Utils.Greet"));
        assert_ne!(export_hash("Utils.Greet"), export_hash("utils.greet"));
        assert_eq!(export_hash("Utils.Greet"), xxh3_64(b"Utils.Greet"));
    }

    #[test]
    fn test_exportable_shapes() {
        assert!(is_exportable(&CallableUnit::function0("A", || ())));
        assert!(is_exportable(&CallableUnit::function1("B", |_: ObjectHandle| ())));
        assert!(!is_exportable(&CallableUnit::function1("C", |_: i32| ())));
        assert!(!is_exportable(&CallableUnit::opaque(
            "D",
            [TypeRef::Handle, TypeRef::Handle],
            TypeRef::Void
        )));
    }

    #[test]
    fn test_diagnostic_display() {
        let diagnostic = Diagnostic::ExportCollision {
            key: 1,
            kept: "A.F".into(),
            skipped: "A.F".into(),
        };
        assert_eq!(
            diagnostic.to_string(),
            "Export `A.F` was skipped: `A.F` already uses key 0x0000000000000001."
        );
    }
}
