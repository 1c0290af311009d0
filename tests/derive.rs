//! `#[plugin_type]` and `#[plugin_module]` tests
#![allow(
    missing_docs,
    clippy::needless_pass_by_value,
    clippy::must_use_candidate,
    clippy::unused_self
)]
extern crate ue4ss_bindings;

use std::sync::atomic::{AtomicU32, Ordering};

use ue4ss_bindings::binding::{LIFECYCLE_SLOT_COUNT, export_hash};
use ue4ss_bindings::ffi::{ABI_CHECKSUM, ue4ss_find_export};
use ue4ss_bindings::flags::UnitFlags;
use ue4ss_bindings::prelude::*;
use ue4ss_bindings::types::TypeRef;

static STARTED: AtomicU32 = AtomicU32::new(0);

pub struct Main;

#[plugin_type]
impl Main {
    pub fn start_mod() {
        STARTED.fetch_add(1, Ordering::SeqCst);
    }

    pub fn update() {}

    pub fn unreal_init() {}
}

pub struct Utils {
    value: i32,
}

#[plugin_type]
#[plugin(namespace = "MyMod")]
impl Utils {
    pub fn greet() -> i32 {
        42
    }

    pub fn apply(object: ObjectHandle) -> bool {
        !object.is_null()
    }

    pub fn add(a: i32, b: i32) -> i32 {
        a + b
    }

    pub fn square(x: i32) -> i32 {
        x * x
    }

    pub fn describe() -> String {
        String::from("utils")
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    pub fn identity<T>(value: T) -> T {
        value
    }

    fn helper() -> u8 {
        1
    }

    #[plugin(name = "Renamed")]
    pub fn original_name() -> u64 {
        u64::from(Self::helper())
    }

    #[plugin(skip)]
    pub fn skipped() {}
}

pub struct Hidden;

#[plugin_type]
#[plugin(name = "Secret", private)]
impl Hidden {
    pub fn reveal() -> bool {
        true
    }
}

#[test]
fn test_type_description() {
    let info = Utils::type_info();
    assert_eq!(info.full_name(), "MyMod.Utils");
    assert!(info.is_public());

    let names: Vec<_> = info.units().iter().map(CallableUnit::name).collect();
    assert_eq!(
        names,
        [
            "Greet",
            "Apply",
            "Add",
            "Square",
            "Describe",
            "Value",
            "Identity",
            "Helper",
            "Renamed"
        ]
    );

    let unit = |name: &str| {
        info.units()
            .iter()
            .find(|unit| unit.name() == name)
            .unwrap()
    };
    assert_eq!(unit("Greet").qualified_name(), "MyMod.Utils.Greet");
    assert!(unit("Greet").is_invocable());
    assert_eq!(unit("Apply").params(), &[TypeRef::Handle]);
    assert!(!unit("Add").is_invocable());
    assert_eq!(unit("Add").params(), &[TypeRef::I32, TypeRef::I32]);
    assert!(unit("Square").is_invocable());
    assert!(!unit("Describe").is_invocable());
    assert_eq!(unit("Describe").ret(), &TypeRef::named("String"));
    assert!(!unit("Value").flags().contains(UnitFlags::Static));
    assert!(unit("Identity").flags().contains(UnitFlags::Generic));
    assert!(!unit("Helper").flags().contains(UnitFlags::Public));
    assert_eq!(unit("Renamed").ret(), &TypeRef::U64);
}

#[test]
fn test_private_type() {
    let info = Hidden::type_info();
    assert_eq!(info.name(), "Secret");
    assert!(!info.is_public());
}

#[test]
fn test_derived_plugin_loads() {
    let plugin = PluginBuilder::new("derived", "1.0.0")
        .plugin_type::<Main>()
        .plugin_type::<Utils>()
        .plugin_type::<Hidden>()
        .build();
    let loaded = load(&BindingConfig::new(), &plugin).unwrap();

    assert_eq!(loaded.lifecycle().populated(), 3);
    let exports = loaded.exports();
    assert_eq!(
        exports.len(),
        6,
        "Main hooks, Greet, Apply and Renamed: {exports:?}"
    );
    assert!(exports.get_by_name("MyMod.Utils.Square").is_none());
    assert!(exports.get_by_name("Secret.Reveal").is_none());

    let greet = exports.get_by_name("MyMod.Utils.Greet").unwrap();
    assert_eq!(unsafe { greet.call0::<i32>() }, 42);
    let renamed = exports.get_by_name("MyMod.Utils.Renamed").unwrap();
    assert_eq!(unsafe { renamed.call0::<u64>() }, 1);
}

#[plugin_module]
pub fn plugin(module: PluginBuilder) -> PluginBuilder {
    module.plugin_type::<Main>().plugin_type::<Utils>()
}

#[test]
fn test_module_entry_point() {
    let mut events = [NativePtr::null(); LIFECYCLE_SLOT_COUNT];
    let tables = unsafe { ue4ss_plugin_load(events.as_mut_ptr()) };
    let tables = unsafe { tables.as_ref() }.unwrap();

    assert_eq!(tables.checksum, ABI_CHECKSUM);
    assert_eq!(tables.events, events);
    assert!(!events[LifecycleHook::StartMod.slot()].is_null());
    assert!(events[LifecycleHook::StopMod.slot()].is_null());

    let before = STARTED.load(Ordering::SeqCst);
    unsafe { events[LifecycleHook::StartMod.slot()].call0::<()>() };
    assert_eq!(STARTED.load(Ordering::SeqCst), before + 1);

    let greet = unsafe { ue4ss_find_export(tables, export_hash("MyMod.Utils.Greet")) };
    assert_eq!(unsafe { greet.call0::<i32>() }, 42);
}
