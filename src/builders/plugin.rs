use crate::{
    describe::{PluginModule, PluginType, TypeInfo},
    error::Result,
};

#[derive(Debug)]
enum TypeSource {
    Registered(fn() -> TypeInfo),
    Described(TypeInfo),
}

impl TypeSource {
    fn into_type_info(self) -> TypeInfo {
        match self {
            Self::Registered(describe) => describe(),
            Self::Described(info) => info,
        }
    }
}

/// Builds an in-memory plugin module from Rust types.
///
/// ```rust
/// use ue4ss_bindings::prelude::*;
///
/// pub struct Main;
///
/// #[plugin_type]
/// impl Main {
///     pub fn start_mod() {}
///
///     pub fn update() {}
/// }
///
/// let plugin = PluginBuilder::new("my-mod", "1.0.0")
///     .plugin_type::<Main>()
///     .build();
/// let loaded = load(&BindingConfig::new(), &plugin).unwrap();
/// assert_eq!(loaded.lifecycle().populated(), 2);
/// ```
#[must_use]
#[derive(Debug, Default)]
pub struct PluginBuilder {
    pub(crate) name: String,
    pub(crate) version: String,
    types: Vec<TypeSource>,
}

impl PluginBuilder {
    /// Creates a new plugin builder with a given name and version.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the plugin module.
    /// * `version` - The current version of the plugin module.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            types: vec![],
        }
    }

    /// Overrides the module name.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the plugin module.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Overrides the module version.
    ///
    /// # Arguments
    ///
    /// * `version` - The current version of the plugin module.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Adds a type described by the [`plugin_type`](crate::plugin_type)
    /// attribute.
    pub fn plugin_type<T: PluginType>(mut self) -> Self {
        self.types.push(TypeSource::Registered(T::type_info));
        self
    }

    /// Adds a type described by hand.
    ///
    /// # Arguments
    ///
    /// * `info` - The type and its functions.
    pub fn type_info(mut self, info: TypeInfo) -> Self {
        self.types.push(TypeSource::Described(info));
        self
    }

    /// Completes the module. Registered types are described here, once, so
    /// loading the same module again binds the same units.
    pub fn build(self) -> StaticPlugin {
        StaticPlugin {
            name: self.name,
            version: self.version,
            types: self
                .types
                .into_iter()
                .map(TypeSource::into_type_info)
                .collect(),
        }
    }
}

/// A plugin module assembled with a [`PluginBuilder`].
#[derive(Debug, Clone)]
pub struct StaticPlugin {
    name: String,
    version: String,
    types: Vec<TypeInfo>,
}

impl StaticPlugin {
    /// Version of the module.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }
}

impl PluginModule for StaticPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn types(&self) -> Result<Vec<TypeInfo>> {
        Ok(self.types.clone())
    }
}
