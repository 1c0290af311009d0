//! Plugin modules shared by the unit tests.

use crate::{
    builders::{PluginBuilder, StaticPlugin},
    describe::{CallableUnit, PluginModule, TypeInfo},
    error::{Error, Result},
    types::{ObjectHandle, TypeRef},
};

/// A module with an entry type, a utility type with units of every shape,
/// and a private type.
pub fn fixture_module() -> StaticPlugin {
    PluginBuilder::new("fixture", "0.1.0")
        .type_info(
            TypeInfo::new("Main")
                .unit(CallableUnit::function0("StartMod", || ()))
                .unit(CallableUnit::function0("Update", || ()))
                .unit(CallableUnit::function0("Helper", || ()).private()),
        )
        .type_info(
            TypeInfo::new("Utils")
                .unit(CallableUnit::function0("Greet", || 42i32))
                .unit(CallableUnit::function1("Apply", |h: ObjectHandle| {
                    !h.is_null()
                }))
                .unit(CallableUnit::opaque(
                    "Add",
                    [TypeRef::I32, TypeRef::I32],
                    TypeRef::I32,
                ))
                .unit(CallableUnit::function1("Square", |x: i32| x * x))
                .unit(CallableUnit::function0("Hidden", || ()).private())
                .unit(CallableUnit::function0("Method", || ()).instance())
                .unit(CallableUnit::function0("Generic", || ()).generic()),
        )
        .type_info(
            TypeInfo::new("Internal")
                .private()
                .unit(CallableUnit::function0("Secret", || ())),
        )
        .build()
}

/// A module whose `StartMod` hook takes a parameter.
pub fn hook_arity_module() -> StaticPlugin {
    PluginBuilder::new("hook-arity", "0.1.0")
        .type_info(
            TypeInfo::new("Main")
                .unit(CallableUnit::function0("Update", || ()))
                .unit(CallableUnit::function1("StartMod", |_: i32| ())),
        )
        .build()
}

/// A module declaring two exports with the same qualified name.
pub fn collision_module() -> StaticPlugin {
    PluginBuilder::new("collision", "0.1.0")
        .type_info(
            TypeInfo::new("Utils")
                .unit(CallableUnit::function0("Greet", || 1i32))
                .unit(CallableUnit::function1("Greet", |_: ObjectHandle| 2i32)),
        )
        .build()
}

/// A module that cannot enumerate its types.
pub struct FailingModule;

impl PluginModule for FailingModule {
    fn name(&self) -> &str {
        "broken"
    }

    fn types(&self) -> Result<Vec<TypeInfo>> {
        Err(Error::Introspection {
            module: String::new(),
            reason: "metadata unreadable".into(),
        })
    }
}
