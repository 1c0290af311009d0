//! The introspection interface a plugin module provides to the binding
//! engine: its types, and for each type the functions it declares.
//!
//! Plugin authors normally derive this data with the
//! [`plugin_type`](crate::plugin_type) attribute and collect it with a
//! [`PluginBuilder`](crate::builders::PluginBuilder). Hosts embedding another
//! plugin format can implement [`PluginModule`] directly.

mod signature;
mod unit;

use crate::{error::Result, flags::TypeVisibility};

pub use signature::Signature;
pub use unit::{CallableUnit, UnitId};

/// A loaded plugin module that can enumerate its types.
pub trait PluginModule {
    /// Name of the module, used in diagnostics.
    fn name(&self) -> &str;

    /// Returns the module's types in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Introspection`] if the module cannot be enumerated.
    /// Such an error aborts the whole load.
    ///
    /// [`Error::Introspection`]: crate::error::Error::Introspection
    fn types(&self) -> Result<Vec<TypeInfo>>;
}

/// A Rust type that describes itself as a plugin type. Implemented by the
/// [`plugin_type`](crate::plugin_type) attribute.
pub trait PluginType {
    /// Describes the type and its functions.
    fn type_info() -> TypeInfo;
}

/// A type declared by a plugin module.
#[must_use]
#[derive(Debug, Clone)]
pub struct TypeInfo {
    namespace: Option<String>,
    name: String,
    visibility: TypeVisibility,
    units: Vec<CallableUnit>,
}

impl TypeInfo {
    /// Creates a public type with no namespace and no functions.
    ///
    /// # Arguments
    ///
    /// * `name` - Simple name of the type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            name: name.into(),
            visibility: TypeVisibility::Public,
            units: Vec::new(),
        }
    }

    /// Sets the namespace the type is declared in.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        self.namespace = (!namespace.is_empty()).then_some(namespace);
        let full_name = self.full_name();
        for unit in &mut self.units {
            unit.declared_by(&full_name);
        }
        self
    }

    /// Marks the type as internal to the plugin module.
    pub fn private(mut self) -> Self {
        self.visibility = TypeVisibility::Private;
        self
    }

    /// Adds a function to the type.
    ///
    /// # Arguments
    ///
    /// * `unit` - The function to add.
    pub fn unit(mut self, mut unit: CallableUnit) -> Self {
        unit.declared_by(&self.full_name());
        self.units.push(unit);
        self
    }

    /// Simple name of the type.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `Namespace.Name`, or the simple name when there is no namespace.
    #[must_use]
    pub fn full_name(&self) -> String {
        match &self.namespace {
            Some(namespace) => format!("{namespace}.{}", self.name),
            None => self.name.clone(),
        }
    }

    /// Visibility of the type.
    #[must_use]
    pub fn visibility(&self) -> TypeVisibility {
        self.visibility
    }

    /// Whether the type is visible to the host.
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.visibility == TypeVisibility::Public
    }

    /// Functions declared by the type.
    #[must_use]
    pub fn units(&self) -> &[CallableUnit] {
        &self.units
    }

    pub(crate) fn into_units(self) -> Vec<CallableUnit> {
        self.units
    }
}
