//! The C ABI between the binding engine and the host.
//!
//! The host receives a [`HostTables`] after a load and looks exports up by
//! the key [`ue4ss_export_hash`] computes. With the `link` feature the UE4SS
//! entry points the plugin calls back into are declared here too.

use std::{
    ffi::c_char,
    panic::{self, AssertUnwindSafe},
    ptr, slice,
};

use crate::{
    binding::{self, LIFECYCLE_SLOT_COUNT, LoadedPlugin, export_hash},
    builders::StaticPlugin,
    config::BindingConfig,
    types::NativePtr,
};

/// Identifies the layout of [`HostTables`] to the host.
pub const ABI_CHECKSUM: u32 = 0x2F0;

/// One export as the host sees it.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawExport {
    /// [`export_hash`] of the qualified name.
    pub key: u64,
    /// Native pointer of the function.
    pub pointer: NativePtr,
}

/// The tables handed to the host after a successful load.
#[repr(C)]
#[derive(Debug)]
pub struct HostTables {
    /// Always [`ABI_CHECKSUM`].
    pub checksum: u32,
    /// Lifecycle hooks in slot order, null when unset.
    pub events: [NativePtr; LIFECYCLE_SLOT_COUNT],
    /// Exports sorted by key.
    pub exports: *const RawExport,
    /// Number of exports.
    pub export_count: usize,
}

// SAFETY: The tables are immutable once built and only hold code addresses.
unsafe impl Send for HostTables {}
// SAFETY: See above.
unsafe impl Sync for HostTables {}

impl HostTables {
    /// The exports as a slice.
    #[must_use]
    pub fn exports(&self) -> &[RawExport] {
        if self.exports.is_null() || self.export_count == 0 {
            return &[];
        }
        // SAFETY: `exports` and `export_count` come from a leaked boxed
        // slice that is never freed.
        unsafe { slice::from_raw_parts(self.exports, self.export_count) }
    }

    /// Finds the pointer registered under a key.
    #[must_use]
    pub fn find(&self, key: u64) -> Option<NativePtr> {
        let exports = self.exports();
        exports
            .binary_search_by_key(&key, |export| export.key)
            .ok()
            .map(|i| exports[i].pointer)
    }
}

impl LoadedPlugin {
    /// Converts the tables into their host representation. The tables are
    /// leaked: they live for the rest of the process, like the pointers they
    /// hold.
    #[must_use]
    pub fn into_host_tables(self) -> &'static HostTables {
        let (lifecycle, exports) = self.into_parts();
        let exports: Box<[RawExport]> = exports
            .iter()
            .map(|entry| RawExport {
                key: entry.key(),
                pointer: entry.pointer(),
            })
            .collect();
        let export_count = exports.len();
        let exports = Box::leak(exports).as_ptr();

        Box::leak(Box::new(HostTables {
            checksum: ABI_CHECKSUM,
            events: lifecycle.to_raw(),
            exports,
            export_count,
        }))
    }
}

/// Loads a plugin module on behalf of the host.
///
/// Writes the resolved lifecycle hooks into `events` and returns the host
/// tables, or null if the load failed. The failure is logged. Panics are
/// caught here and reported as a failed load.
///
/// # Safety
///
/// `events` must be null or point to [`LIFECYCLE_SLOT_COUNT`] writable
/// pointers.
pub unsafe fn load_plugin(
    events: *mut NativePtr,
    module: impl FnOnce() -> StaticPlugin,
) -> *const HostTables {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let module = module();
        let config = BindingConfig::from_env();
        binding::load(&config, &module)
    }));

    match result {
        Ok(Ok(loaded)) => {
            let tables = loaded.into_host_tables();
            if !events.is_null() {
                for (slot, pointer) in tables.events.iter().enumerate() {
                    if !pointer.is_null() {
                        // SAFETY: The caller guarantees `events` holds
                        // `LIFECYCLE_SLOT_COUNT` pointers.
                        unsafe { events.add(slot).write(*pointer) };
                    }
                }
            }
            ptr::from_ref(tables)
        }
        Ok(Err(err)) => {
            tracing::error!(unit = err.unit_name(), "plugin load failed: {err}");
            ptr::null()
        }
        Err(_) => {
            tracing::error!("plugin load panicked");
            ptr::null()
        }
    }
}

/// Computes the export key of a qualified name.
///
/// # Safety
///
/// `name` must be null or point to `len` readable bytes. A null name hashes
/// as the empty string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ue4ss_export_hash(name: *const c_char, len: usize) -> u64 {
    if name.is_null() {
        return export_hash("");
    }
    // SAFETY: The caller guarantees `len` readable bytes at `name`.
    let bytes = unsafe { slice::from_raw_parts(name.cast::<u8>(), len) };
    xxhash_rust::xxh3::xxh3_64(bytes)
}

/// Looks an export up by key. Returns null if `tables` is null or the key is
/// unknown.
///
/// # Safety
///
/// `tables` must be null or a pointer returned by [`load_plugin`] or
/// [`LoadedPlugin::into_host_tables`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ue4ss_find_export(tables: *const HostTables, key: u64) -> NativePtr {
    // SAFETY: The caller guarantees `tables` is null or valid.
    unsafe { tables.as_ref() }
        .and_then(|tables| tables.find(key))
        .unwrap_or_default()
}

#[cfg(feature = "link")]
pub use self::host::*;

#[cfg(feature = "link")]
mod host {
    #![allow(missing_docs)]

    use std::ffi::c_char;

    use crate::{log::LogLevel, types::ObjectHandle};

    #[link(name = "UE4SS")]
    unsafe extern "C" {
        #[cfg_attr(
            windows,
            link_name = "?Log@Debug@Framework@DotNetLibrary@RC@@SAXW4LogLevel@54@PEBD@Z"
        )]
        pub fn ue4ss_log(level: LogLevel, message: *const c_char);

        #[cfg_attr(
            windows,
            link_name = "?IsValid@Object@Framework@DotNetLibrary@RC@@SA_NPEAVUObject@Unreal@4@@Z"
        )]
        pub fn ue4ss_object_is_valid(object: ObjectHandle) -> bool;
        #[cfg_attr(
            windows,
            link_name = "?Invoke@Object@Framework@DotNetLibrary@RC@@SA_NPEAVUObject@Unreal@4@PEBD@Z"
        )]
        pub fn ue4ss_object_invoke(object: ObjectHandle, command: *const c_char) -> bool;
        #[cfg_attr(
            windows,
            link_name = "?Find@Object@Framework@DotNetLibrary@RC@@SAPEAVUObject@Unreal@4@PEBD@Z"
        )]
        pub fn ue4ss_object_find(name: *const c_char) -> ObjectHandle;
        #[cfg_attr(
            windows,
            link_name = "?GetName@Object@Framework@DotNetLibrary@RC@@SAXPEAVUObject@Unreal@4@PEAD@Z"
        )]
        pub fn ue4ss_object_get_name(object: ObjectHandle, name: *mut c_char);

        #[cfg_attr(
            windows,
            link_name = "?GetBool@Object@Framework@DotNetLibrary@RC@@SA_NPEAVUObject@Unreal@4@PEBDPEA_N@Z"
        )]
        pub fn ue4ss_object_get_bool(object: ObjectHandle, name: *const c_char, value: *mut bool) -> bool;
        #[cfg_attr(
            windows,
            link_name = "?GetByte@Object@Framework@DotNetLibrary@RC@@SA_NPEAVUObject@Unreal@4@PEBDPEAE@Z"
        )]
        pub fn ue4ss_object_get_byte(object: ObjectHandle, name: *const c_char, value: *mut u8) -> bool;
        #[cfg_attr(
            windows,
            link_name = "?GetShort@Object@Framework@DotNetLibrary@RC@@SA_NPEAVUObject@Unreal@4@PEBDPEAF@Z"
        )]
        pub fn ue4ss_object_get_short(object: ObjectHandle, name: *const c_char, value: *mut i16) -> bool;
        #[cfg_attr(
            windows,
            link_name = "?GetInt@Object@Framework@DotNetLibrary@RC@@SA_NPEAVUObject@Unreal@4@PEBDPEAH@Z"
        )]
        pub fn ue4ss_object_get_int(object: ObjectHandle, name: *const c_char, value: *mut i32) -> bool;
        #[cfg_attr(
            windows,
            link_name = "?GetLong@Object@Framework@DotNetLibrary@RC@@SA_NPEAVUObject@Unreal@4@PEBDPEA_J@Z"
        )]
        pub fn ue4ss_object_get_long(object: ObjectHandle, name: *const c_char, value: *mut i64) -> bool;
        #[cfg_attr(
            windows,
            link_name = "?GetUShort@Object@Framework@DotNetLibrary@RC@@SA_NPEAVUObject@Unreal@4@PEBDPEAG@Z"
        )]
        pub fn ue4ss_object_get_ushort(object: ObjectHandle, name: *const c_char, value: *mut u16) -> bool;
        #[cfg_attr(
            windows,
            link_name = "?GetUInt@Object@Framework@DotNetLibrary@RC@@SA_NPEAVUObject@Unreal@4@PEBDPEAI@Z"
        )]
        pub fn ue4ss_object_get_uint(object: ObjectHandle, name: *const c_char, value: *mut u32) -> bool;
        #[cfg_attr(
            windows,
            link_name = "?GetULong@Object@Framework@DotNetLibrary@RC@@SA_NPEAVUObject@Unreal@4@PEBDPEA_K@Z"
        )]
        pub fn ue4ss_object_get_ulong(object: ObjectHandle, name: *const c_char, value: *mut u64) -> bool;
        #[cfg_attr(
            windows,
            link_name = "?GetFloat@Object@Framework@DotNetLibrary@RC@@SA_NPEAVUObject@Unreal@4@PEBDPEAM@Z"
        )]
        pub fn ue4ss_object_get_float(object: ObjectHandle, name: *const c_char, value: *mut f32) -> bool;
        #[cfg_attr(
            windows,
            link_name = "?GetDouble@Object@Framework@DotNetLibrary@RC@@SA_NPEAVUObject@Unreal@4@PEBDPEAN@Z"
        )]
        pub fn ue4ss_object_get_double(object: ObjectHandle, name: *const c_char, value: *mut f64) -> bool;
        #[cfg_attr(
            windows,
            link_name = "?GetEnum@Object@Framework@DotNetLibrary@RC@@SA_NPEAVUObject@Unreal@4@PEBDPEAH@Z"
        )]
        pub fn ue4ss_object_get_enum(object: ObjectHandle, name: *const c_char, value: *mut i32) -> bool;
        #[cfg_attr(
            windows,
            link_name = "?GetString@Object@Framework@DotNetLibrary@RC@@SA_NPEAVUObject@Unreal@4@PEBDPEAD@Z"
        )]
        pub fn ue4ss_object_get_string(object: ObjectHandle, name: *const c_char, value: *mut c_char) -> bool;
        #[cfg_attr(
            windows,
            link_name = "?GetText@Object@Framework@DotNetLibrary@RC@@SA_NPEAVUObject@Unreal@4@PEBDPEAD@Z"
        )]
        pub fn ue4ss_object_get_text(object: ObjectHandle, name: *const c_char, value: *mut c_char) -> bool;

        #[cfg_attr(
            windows,
            link_name = "?SetBool@Object@Framework@DotNetLibrary@RC@@SA_NPEAVUObject@Unreal@4@PEBD_N@Z"
        )]
        pub fn ue4ss_object_set_bool(object: ObjectHandle, name: *const c_char, value: bool) -> bool;
        #[cfg_attr(
            windows,
            link_name = "?SetByte@Object@Framework@DotNetLibrary@RC@@SA_NPEAVUObject@Unreal@4@PEBDE@Z"
        )]
        pub fn ue4ss_object_set_byte(object: ObjectHandle, name: *const c_char, value: u8) -> bool;
        #[cfg_attr(
            windows,
            link_name = "?SetShort@Object@Framework@DotNetLibrary@RC@@SA_NPEAVUObject@Unreal@4@PEBDF@Z"
        )]
        pub fn ue4ss_object_set_short(object: ObjectHandle, name: *const c_char, value: i16) -> bool;
        #[cfg_attr(
            windows,
            link_name = "?SetInt@Object@Framework@DotNetLibrary@RC@@SA_NPEAVUObject@Unreal@4@PEBDH@Z"
        )]
        pub fn ue4ss_object_set_int(object: ObjectHandle, name: *const c_char, value: i32) -> bool;
        #[cfg_attr(
            windows,
            link_name = "?SetLong@Object@Framework@DotNetLibrary@RC@@SA_NPEAVUObject@Unreal@4@PEBD_J@Z"
        )]
        pub fn ue4ss_object_set_long(object: ObjectHandle, name: *const c_char, value: i64) -> bool;
        #[cfg_attr(
            windows,
            link_name = "?SetUShort@Object@Framework@DotNetLibrary@RC@@SA_NPEAVUObject@Unreal@4@PEBDG@Z"
        )]
        pub fn ue4ss_object_set_ushort(object: ObjectHandle, name: *const c_char, value: u16) -> bool;
        #[cfg_attr(
            windows,
            link_name = "?SetUInt@Object@Framework@DotNetLibrary@RC@@SA_NPEAVUObject@Unreal@4@PEBDI@Z"
        )]
        pub fn ue4ss_object_set_uint(object: ObjectHandle, name: *const c_char, value: u32) -> bool;
        #[cfg_attr(
            windows,
            link_name = "?SetULong@Object@Framework@DotNetLibrary@RC@@SA_NPEAVUObject@Unreal@4@PEBD_K@Z"
        )]
        pub fn ue4ss_object_set_ulong(object: ObjectHandle, name: *const c_char, value: u64) -> bool;
        #[cfg_attr(
            windows,
            link_name = "?SetFloat@Object@Framework@DotNetLibrary@RC@@SA_NPEAVUObject@Unreal@4@PEBDM@Z"
        )]
        pub fn ue4ss_object_set_float(object: ObjectHandle, name: *const c_char, value: f32) -> bool;
        #[cfg_attr(
            windows,
            link_name = "?SetDouble@Object@Framework@DotNetLibrary@RC@@SA_NPEAVUObject@Unreal@4@PEBDN@Z"
        )]
        pub fn ue4ss_object_set_double(object: ObjectHandle, name: *const c_char, value: f64) -> bool;
        #[cfg_attr(
            windows,
            link_name = "?SetEnum@Object@Framework@DotNetLibrary@RC@@SA_NPEAVUObject@Unreal@4@PEBDH@Z"
        )]
        pub fn ue4ss_object_set_enum(object: ObjectHandle, name: *const c_char, value: i32) -> bool;
        #[cfg_attr(
            windows,
            link_name = "?SetString@Object@Framework@DotNetLibrary@RC@@SA_NPEAVUObject@Unreal@4@PEBD1@Z"
        )]
        pub fn ue4ss_object_set_string(object: ObjectHandle, name: *const c_char, value: *const c_char) -> bool;
        #[cfg_attr(
            windows,
            link_name = "?SetText@Object@Framework@DotNetLibrary@RC@@SA_NPEAVUObject@Unreal@4@PEBD1@Z"
        )]
        pub fn ue4ss_object_set_text(object: ObjectHandle, name: *const c_char, value: *const c_char) -> bool;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_hash_matches_engine() {
        let name = "Utils.Greet";
        let key = unsafe { ue4ss_export_hash(name.as_ptr().cast(), name.len()) };
        assert_eq!(key, export_hash(name));
        assert_eq!(unsafe { ue4ss_export_hash(ptr::null(), 0) }, export_hash(""));
    }

    #[test]
    fn test_find_export_on_null_tables() {
        assert!(unsafe { ue4ss_find_export(ptr::null(), 1) }.is_null());
    }
}
