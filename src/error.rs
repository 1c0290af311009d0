//! Error and result types returned from the binding engine.

use std::{
    error::Error as ErrorTrait,
    ffi::NulError,
    fmt::Display,
};

/// The main result type which is passed by the library.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The main error type which is passed by the library inside the custom
/// [`Result`] type.
///
/// Every variant except [`Error::InvalidName`] is fatal to a plugin load: the
/// host receives no tables at all.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// The plugin module could not enumerate its own types. Contains the
    /// module name and the reason reported by the module.
    Introspection {
        /// Name of the module that failed.
        module: String,
        /// Reason given by the module.
        reason: String,
    },
    /// A lifecycle hook was declared with parameters. The host calls hook
    /// slots with no arguments. Contains the hook's qualified name and the
    /// declared arity.
    HookArity {
        /// Qualified name of the offending unit.
        name: String,
        /// Declared number of parameters.
        arity: usize,
    },
    /// More than one public type carries the entry type name.
    AmbiguousEntryType {
        /// The entry type name that was searched for.
        name: String,
        /// Full names of every matching type.
        candidates: Vec<String>,
    },
    /// Two exported units map to the same export key and the load was
    /// configured to reject collisions.
    ExportCollision {
        /// The shared export key.
        key: u64,
        /// Qualified name of the unit registered first.
        existing: String,
        /// Qualified name of the unit that collided with it.
        rejected: String,
    },
    /// No callable type descriptor can be produced for a unit's signature.
    /// Contains the qualified name and the signature name.
    Synthesis {
        /// Qualified name of the unit.
        name: String,
        /// Mangled signature name.
        signature: String,
    },
    /// Every trampoline slot of the process is in use.
    SlotsExhausted {
        /// Qualified name of the unit that could not be bound.
        name: String,
        /// Total slot capacity of the process.
        capacity: usize,
    },
    /// A string passed to the host contained a NUL byte.
    InvalidName(NulError),
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Introspection { module, reason } => {
                write!(f, "Unable to enumerate the types of plugin module `{module}`: {reason}")
            }
            Error::HookArity { name, arity } => write!(
                f,
                "Lifecycle hook `{name}` should not have arguments, found {arity}."
            ),
            Error::AmbiguousEntryType { name, candidates } => write!(
                f,
                "Found {} public types named `{name}`: {}",
                candidates.len(),
                candidates.join(", ")
            ),
            Error::ExportCollision {
                key,
                existing,
                rejected,
            } => write!(
                f,
                "Export `{rejected}` collides with `{existing}` on key {key:#018x}."
            ),
            Error::Synthesis { name, signature } => write!(
                f,
                "Unable to synthesize a callable type `{signature}` for `{name}`."
            ),
            Error::SlotsExhausted { name, capacity } => write!(
                f,
                "Unable to bind `{name}`: all {capacity} trampoline slots are in use."
            ),
            Error::InvalidName(e) => write!(f, "Invalid name passed to the host: {e}"),
        }
    }
}

impl ErrorTrait for Error {
    fn source(&self) -> Option<&(dyn ErrorTrait + 'static)> {
        match self {
            Error::InvalidName(e) => Some(e),
            _ => None,
        }
    }
}

impl From<NulError> for Error {
    fn from(value: NulError) -> Self {
        Self::InvalidName(value)
    }
}

#[cfg(feature = "anyhow")]
impl From<anyhow::Error> for Error {
    fn from(value: anyhow::Error) -> Self {
        Self::Introspection {
            module: String::new(),
            reason: format!("{value:#}"),
        }
    }
}

impl Error {
    /// Returns the qualified name of the callable unit that caused the error,
    /// if the error is tied to one.
    #[must_use]
    pub fn unit_name(&self) -> Option<&str> {
        match self {
            Error::HookArity { name, .. }
            | Error::Synthesis { name, .. }
            | Error::SlotsExhausted { name, .. } => Some(name),
            Error::ExportCollision { rejected, .. } => Some(rejected),
            _ => None,
        }
    }
}
