//! Flags and enums used to describe plugin types and callable units.

use bitflags::bitflags;

bitflags! {
    /// Flags describing a callable unit discovered in a plugin module.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct UnitFlags: u32 {
        /// Unit is visible outside its declaring type.
        const Public = 1 << 0;
        /// Unit does not take a receiver.
        const Static = 1 << 1;
        /// Unit has generic parameters.
        const Generic = 1 << 2;
    }
}

impl UnitFlags {
    /// Flags given to the typed function constructors of
    /// [`CallableUnit`](crate::describe::CallableUnit).
    pub const Exported: Self = Self::Public.union(Self::Static);

    /// Whether a unit carrying these flags may be bound: public, static and
    /// not generic.
    #[must_use]
    pub fn is_eligible(self) -> bool {
        self.contains(Self::Exported) && !self.contains(Self::Generic)
    }
}

/// Visibility of a type declared by a plugin module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TypeVisibility {
    /// Type is visible to the host.
    #[default]
    Public,
    /// Type is internal to the plugin module.
    Private,
}

/// What a load does when two exports map to the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CollisionPolicy {
    /// Keep the first registered export and record a diagnostic.
    #[default]
    FirstWins,
    /// Fail the load.
    Reject,
}

impl CollisionPolicy {
    /// Parses the policy from its configuration spelling.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "first-wins" | "first_wins" | "firstwins" => Some(Self::FirstWins),
            "reject" => Some(Self::Reject),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eligibility() {
        assert!(UnitFlags::Exported.is_eligible());
        assert!(!UnitFlags::Public.is_eligible());
        assert!(!UnitFlags::Static.is_eligible());
        assert!(!(UnitFlags::Exported | UnitFlags::Generic).is_eligible());
    }

    #[test]
    fn test_collision_policy_parse() {
        assert_eq!(CollisionPolicy::parse("reject"), Some(CollisionPolicy::Reject));
        assert_eq!(
            CollisionPolicy::parse(" First-Wins "),
            Some(CollisionPolicy::FirstWins)
        );
        assert_eq!(CollisionPolicy::parse("overwrite"), None);
    }
}
