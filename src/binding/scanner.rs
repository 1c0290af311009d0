use crate::{
    describe::{CallableUnit, PluginModule, TypeInfo},
    error::{Error, Result},
};

/// A public type of a scanned module, with its eligible units.
#[derive(Debug, Clone)]
pub struct ScannedType {
    name: String,
    full_name: String,
    units: Vec<CallableUnit>,
}

impl ScannedType {
    fn new(info: TypeInfo) -> Self {
        let name = info.name().to_owned();
        let full_name = info.full_name();
        let units = info
            .into_units()
            .into_iter()
            .filter(|unit| {
                let eligible = unit.is_eligible();
                if !eligible {
                    tracing::trace!(unit = %unit.qualified_name(), flags = ?unit.flags(), "skipping ineligible unit");
                }
                eligible
            })
            .collect();
        Self {
            name,
            full_name,
            units,
        }
    }

    /// Simple name of the type.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `Namespace.Name` of the type.
    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Public, static, non-generic units in declaration order.
    #[must_use]
    pub fn units(&self) -> &[CallableUnit] {
        &self.units
    }
}

/// The result of enumerating a plugin module.
#[derive(Debug, Clone)]
pub struct ScannedModule {
    name: String,
    types: Vec<ScannedType>,
}

impl ScannedModule {
    /// Name of the scanned module.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Public types in module order.
    #[must_use]
    pub fn types(&self) -> &[ScannedType] {
        &self.types
    }

    /// Every eligible unit of the module, type by type.
    pub fn units(&self) -> impl Iterator<Item = &CallableUnit> {
        self.types.iter().flat_map(|ty| ty.units.iter())
    }
}

/// Enumerates the public types of a module and, for each type, its public
/// static non-generic units. Private types are dropped with all their units.
///
/// # Errors
///
/// Returns [`Error::Introspection`] if the module cannot enumerate its
/// types.
pub fn scan<M: PluginModule + ?Sized>(module: &M) -> Result<ScannedModule> {
    let types = module.types().map_err(|err| match err {
        Error::Introspection {
            module: name,
            reason,
        } => Error::Introspection {
            module: if name.is_empty() {
                module.name().to_owned()
            } else {
                name
            },
            reason,
        },
        other => Error::Introspection {
            module: module.name().to_owned(),
            reason: other.to_string(),
        },
    })?;

    let types = types
        .into_iter()
        .filter(|info| {
            if !info.is_public() {
                tracing::trace!(ty = %info.full_name(), "skipping non-public type");
            }
            info.is_public()
        })
        .map(ScannedType::new)
        .collect();

    Ok(ScannedModule {
        name: module.name().to_owned(),
        types,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{FailingModule, fixture_module};

    #[test]
    fn test_scan_drops_private_types_and_units() {
        let scanned = scan(&fixture_module()).unwrap();
        let names: Vec<_> = scanned.types().iter().map(ScannedType::full_name).collect();
        assert_eq!(names, ["Main", "Utils"]);

        let utils = &scanned.types()[1];
        let units: Vec<_> = utils.units().iter().map(CallableUnit::name).collect();
        assert!(units.contains(&"Greet"));
        assert!(!units.contains(&"Hidden"));
        assert!(!units.contains(&"Method"));
        assert!(!units.contains(&"Generic"));
    }

    #[test]
    fn test_scan_failure_names_module() {
        let err = scan(&FailingModule).unwrap_err();
        match err {
            Error::Introspection { module, reason } => {
                assert_eq!(module, "broken");
                assert_eq!(reason, "metadata unreadable");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
