//! Load pipeline tests
#![allow(
    missing_docs,
    clippy::needless_pass_by_value,
    clippy::must_use_candidate
)]
extern crate ue4ss_bindings;

use std::sync::Arc;

use ue4ss_bindings::binding::{LIFECYCLE_SLOT_COUNT, export_hash, load_into, load_with};
use ue4ss_bindings::flags::{CollisionPolicy, UnitFlags};
use ue4ss_bindings::prelude::*;
use ue4ss_bindings::thunk::{SLOT_CAPACITY, ThunkSynthesizer};
use ue4ss_bindings::types::TypeRef;

fn utils_module(name: &str, greeting: i32) -> StaticPlugin {
    PluginBuilder::new(name, "1.0.0")
        .type_info(
            TypeInfo::new("Utils")
                .unit(CallableUnit::function0("Greet", move || greeting))
                .unit(CallableUnit::function1("Apply", |object: ObjectHandle| {
                    !object.is_null()
                }))
                .unit(CallableUnit::opaque(
                    "Add",
                    [TypeRef::I32, TypeRef::I32],
                    TypeRef::I32,
                )),
        )
        .build()
}

#[test]
fn test_exports_keyed_by_qualified_name() {
    let mut synth = ThunkSynthesizer::new();
    let loaded = load_with(&mut synth, &BindingConfig::new(), &utils_module("utils", 7)).unwrap();

    let exports = loaded.exports();
    assert_eq!(exports.len(), 2);
    assert!(exports.contains_key(export_hash("Utils.Greet")));
    assert!(exports.contains_key(export_hash("Utils.Apply")));
    assert!(!exports.contains_key(export_hash("Utils.Add")));
    assert!(loaded.lifecycle().is_empty());

    let greet = exports.get(export_hash("Utils.Greet")).unwrap();
    assert_eq!(unsafe { greet.call0::<i32>() }, 7);

    let mut target = 1u32;
    let object = ObjectHandle::from_ptr((&raw mut target).cast());
    let apply = exports.get(export_hash("Utils.Apply")).unwrap();
    assert!(unsafe { apply.call1::<ObjectHandle, bool>(object) });
    assert!(!unsafe { apply.call1::<ObjectHandle, bool>(ObjectHandle::null()) });
}

#[test]
fn test_signature_shared_across_plugins() {
    let mut synth = ThunkSynthesizer::new();
    let first = PluginBuilder::new("first", "1.0.0")
        .type_info(TypeInfo::new("A").unit(CallableUnit::function1("Check", |_: ObjectHandle| true)))
        .build();
    let second = PluginBuilder::new("second", "1.0.0")
        .type_info(TypeInfo::new("B").unit(CallableUnit::function1("Test", |_: ObjectHandle| false)))
        .build();

    load_with(&mut synth, &BindingConfig::new(), &first).unwrap();
    assert_eq!(synth.descriptor_count(), 1);
    load_with(&mut synth, &BindingConfig::new(), &second).unwrap();
    assert_eq!(synth.descriptor_count(), 1);
    assert_eq!(synth.thunk_count(), 2);

    let a = synth.bind(&first.types().unwrap()[0].units()[0]).unwrap();
    let b = synth.bind(&second.types().unwrap()[0].units()[0]).unwrap();
    assert!(Arc::ptr_eq(a.descriptor(), b.descriptor()));
    assert_ne!(a.pointer(), b.pointer());
}

#[test]
fn test_reloading_same_module_keeps_pointers() {
    let mut synth = ThunkSynthesizer::new();
    let module = utils_module("stable", 7);
    let first = load_with(&mut synth, &BindingConfig::new(), &module).unwrap();
    let second = load_with(&mut synth, &BindingConfig::new(), &module).unwrap();
    assert_eq!(first.exports(), second.exports());
    assert_eq!(synth.thunk_count(), 2);
}

#[test]
fn test_rebuilt_module_reuses_pointers() {
    let mut synth = ThunkSynthesizer::new();
    let old = load_with(&mut synth, &BindingConfig::new(), &utils_module("v1", 7)).unwrap();
    let key = export_hash("Utils.Greet");
    let old_ptr = old.exports().get(key).unwrap();
    assert_eq!(unsafe { old_ptr.call0::<i32>() }, 7);

    let new = load_with(&mut synth, &BindingConfig::new(), &utils_module("v2", 8)).unwrap();
    let new_ptr = new.exports().get(key).unwrap();
    assert_eq!(old_ptr, new_ptr);
    assert_eq!(old.exports(), new.exports());
    assert_eq!(unsafe { new_ptr.call0::<i32>() }, 8);
    assert_eq!(synth.thunk_count(), 2);
}

#[test]
fn test_slots_exhausted() {
    let mut bulk = TypeInfo::new("Bulk");
    for i in 0..=SLOT_CAPACITY {
        bulk = bulk.unit(CallableUnit::function0(format!("F{i}"), || 0i8));
    }
    let module = PluginBuilder::new("bulk", "1.0.0").type_info(bulk).build();

    let mut synth = ThunkSynthesizer::new();
    let err = load_with(&mut synth, &BindingConfig::new(), &module).unwrap_err();
    match err {
        Error::SlotsExhausted { name, capacity } => {
            assert_eq!(name, format!("Bulk.F{SLOT_CAPACITY}"));
            assert_eq!(capacity, SLOT_CAPACITY);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(synth.thunk_count(), SLOT_CAPACITY);

    // Every pointer already handed out keeps working.
    let first = synth.bind(&module.types().unwrap()[0].units()[0]).unwrap();
    assert_eq!(unsafe { first.pointer().call0::<i8>() }, 0);
}

#[test]
fn test_missing_entry_type_is_not_an_error() {
    let mut synth = ThunkSynthesizer::new();
    let module = PluginBuilder::new("no-main", "1.0.0")
        .type_info(TypeInfo::new("Main").private().unit(CallableUnit::function0("StartMod", || ())))
        .type_info(TypeInfo::new("NotMain").unit(CallableUnit::function0("StartMod", || ())))
        .build();

    let loaded = load_with(&mut synth, &BindingConfig::new(), &module).unwrap();
    assert!(loaded.lifecycle().is_empty());
    assert!(loaded.exports().get_by_name("NotMain.StartMod").is_some());
}

#[test]
fn test_hooks_are_independent() {
    let mut synth = ThunkSynthesizer::new();
    let module = PluginBuilder::new("hooks", "1.0.0")
        .type_info(
            TypeInfo::new("Main")
                .namespace("MyMod")
                .unit(CallableUnit::function0("UnrealInit", || ()))
                .unit(CallableUnit::function0("StopMod", || ()))
                .unit(CallableUnit::function0("update", || ())),
        )
        .build();

    let loaded = load_with(&mut synth, &BindingConfig::new(), &module).unwrap();
    let lifecycle = loaded.lifecycle();
    assert_eq!(lifecycle.populated(), 2);
    assert!(lifecycle[LifecycleHook::UnrealInit].is_some());
    assert!(lifecycle[LifecycleHook::StopMod].is_some());
    assert!(lifecycle[LifecycleHook::Update].is_none());
    assert_eq!(
        lifecycle.get(LifecycleHook::UnrealInit),
        loaded.exports().get_by_name("MyMod.Main.UnrealInit")
    );
}

#[test]
fn test_hook_with_parameter_fails_load() {
    let mut synth = ThunkSynthesizer::new();
    let module = PluginBuilder::new("bad-hook", "1.0.0")
        .type_info(
            TypeInfo::new("Main")
                .unit(CallableUnit::function0("Update", || ()))
                .unit(CallableUnit::function1("StartMod", |_: i32| ())),
        )
        .build();

    let err = load_with(&mut synth, &BindingConfig::new(), &module).unwrap_err();
    assert!(matches!(err, Error::HookArity { arity: 1, .. }));
    assert_eq!(err.unit_name(), Some("Main.StartMod"));
    assert!(err.to_string().contains("Main.StartMod"));
}

#[test]
fn test_private_hook_is_ignored() {
    let mut synth = ThunkSynthesizer::new();
    let module = PluginBuilder::new("private-hook", "1.0.0")
        .type_info(
            TypeInfo::new("Main")
                .unit(CallableUnit::function1("StartMod", |_: i32| ()).private())
                .unit(CallableUnit::function0("StopMod", || ()).with_flags(UnitFlags::Public)),
        )
        .build();

    let loaded = load_with(&mut synth, &BindingConfig::new(), &module).unwrap();
    assert!(loaded.lifecycle().is_empty());
    assert!(loaded.exports().is_empty());
}

#[test]
fn test_ambiguous_entry_type() {
    let mut synth = ThunkSynthesizer::new();
    let module = PluginBuilder::new("two-mains", "1.0.0")
        .type_info(TypeInfo::new("Main").namespace("A"))
        .type_info(TypeInfo::new("Main").namespace("B"))
        .build();

    let err = load_with(&mut synth, &BindingConfig::new(), &module).unwrap_err();
    match err {
        Error::AmbiguousEntryType { name, candidates } => {
            assert_eq!(name, "Main");
            assert_eq!(candidates, ["A.Main", "B.Main"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_custom_entry_type() {
    let mut synth = ThunkSynthesizer::new();
    let module = PluginBuilder::new("custom", "1.0.0")
        .type_info(TypeInfo::new("ModMain").unit(CallableUnit::function0("StartMod", || ())))
        .build();

    let config = BindingConfig::new().entry_type("ModMain");
    let loaded = load_with(&mut synth, &config, &module).unwrap();
    assert!(loaded.lifecycle()[LifecycleHook::StartMod].is_some());
}

#[test]
fn test_collision_rejected_before_binding() {
    let mut synth = ThunkSynthesizer::new();
    let module = PluginBuilder::new("collide", "1.0.0")
        .type_info(
            TypeInfo::new("Utils")
                .unit(CallableUnit::function0("Greet", || 1i32))
                .unit(CallableUnit::function0("Greet", || 2i32)),
        )
        .build();

    let config = BindingConfig::new().collision_policy(CollisionPolicy::Reject);
    let err = load_with(&mut synth, &config, &module).unwrap_err();
    assert!(matches!(err, Error::ExportCollision { .. }));
    assert_eq!(synth.thunk_count(), 1);
}

#[test]
fn test_load_into_writes_only_populated_slots() {
    let module = PluginBuilder::new("events", "1.0.0")
        .type_info(
            TypeInfo::new("Main")
                .unit(CallableUnit::function0("ProgramStart", || ()))
                .unit(CallableUnit::function0("Update", || ())),
        )
        .build();

    let mut events = [NativePtr::null(); LIFECYCLE_SLOT_COUNT];
    let exports =
        unsafe { load_into(events.as_mut_ptr(), &BindingConfig::new(), &module) }.unwrap();

    assert_eq!(exports.len(), 2);
    assert!(events[0].is_null());
    assert!(events[1].is_null());
    assert!(!events[2].is_null());
    assert!(events[3].is_null());
    assert!(!events[4].is_null());
    assert_eq!(Some(events[4]), exports.get_by_name("Main.Update"));
}
