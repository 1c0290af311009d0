//! Options controlling a plugin load.

use crate::flags::CollisionPolicy;

/// Environment variable overriding [`BindingConfig::entry_type`].
pub const ENTRY_TYPE_ENV: &str = "UE4SS_BINDINGS_ENTRY_TYPE";

/// Environment variable overriding [`BindingConfig::collision_policy`].
/// Accepts `first-wins` or `reject`.
pub const ON_COLLISION_ENV: &str = "UE4SS_BINDINGS_ON_COLLISION";

/// Name of the entry type the host looks for by default.
pub const DEFAULT_ENTRY_TYPE: &str = "Main";

/// Options for [`load`](crate::binding::load).
///
/// ```
/// use ue4ss_bindings::{config::BindingConfig, flags::CollisionPolicy};
///
/// let config = BindingConfig::new()
///     .entry_type("ModMain")
///     .collision_policy(CollisionPolicy::Reject);
/// assert_eq!(config.entry_type_name(), "ModMain");
/// ```
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingConfig {
    entry_type: String,
    collision_policy: CollisionPolicy,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            entry_type: DEFAULT_ENTRY_TYPE.to_owned(),
            collision_policy: CollisionPolicy::default(),
        }
    }
}

impl BindingConfig {
    /// Creates the default configuration: entry type `Main`, first export
    /// wins on collision.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the configuration from the process environment, falling back to
    /// the defaults for unset or unparsable variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through a variable lookup function.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(entry_type) = lookup(ENTRY_TYPE_ENV).filter(|v| !v.trim().is_empty()) {
            config.entry_type = entry_type.trim().to_owned();
        }
        if let Some(value) = lookup(ON_COLLISION_ENV) {
            match CollisionPolicy::parse(&value) {
                Some(policy) => config.collision_policy = policy,
                None => tracing::warn!(
                    variable = ON_COLLISION_ENV,
                    %value,
                    "unknown collision policy, keeping the default"
                ),
            }
        }
        config
    }

    /// Sets the simple name of the entry type.
    ///
    /// # Arguments
    ///
    /// * `name` - Name of the type declaring the lifecycle hooks.
    pub fn entry_type(mut self, name: impl Into<String>) -> Self {
        self.entry_type = name.into();
        self
    }

    /// Sets the export collision policy.
    pub fn collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }

    /// Simple name of the entry type.
    #[must_use]
    pub fn entry_type_name(&self) -> &str {
        &self.entry_type
    }

    /// Export collision policy.
    #[must_use]
    pub fn policy(&self) -> CollisionPolicy {
        self.collision_policy
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = BindingConfig::from_lookup(lookup(&[]));
        assert_eq!(config, BindingConfig::new());
        assert_eq!(config.entry_type_name(), "Main");
        assert_eq!(config.policy(), CollisionPolicy::FirstWins);
    }

    #[test]
    fn test_overrides() {
        let config = BindingConfig::from_lookup(lookup(&[
            (ENTRY_TYPE_ENV, " ModMain "),
            (ON_COLLISION_ENV, "Reject"),
        ]));
        assert_eq!(config.entry_type_name(), "ModMain");
        assert_eq!(config.policy(), CollisionPolicy::Reject);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = BindingConfig::from_lookup(lookup(&[
            (ENTRY_TYPE_ENV, "   "),
            (ON_COLLISION_ENV, "overwrite"),
        ]));
        assert_eq!(config, BindingConfig::default());
    }
}
