use std::ffi::c_void;

#[cfg(feature = "link")]
use std::ffi::{CStr, CString, c_char};

#[cfg(feature = "link")]
use crate::{error::Result, ffi};

/// Opaque reference to an object owned by the host engine.
///
/// This is the only type a one-argument export may take. The binding layer
/// never dereferences it; with the `link` feature enabled it can be passed
/// back to the host's object entry points.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectHandle(*mut c_void);

// SAFETY: The handle is an address owned and synchronised by the host.
unsafe impl Send for ObjectHandle {}
// SAFETY: See above.
unsafe impl Sync for ObjectHandle {}

impl Default for ObjectHandle {
    fn default() -> Self {
        Self::null()
    }
}

impl ObjectHandle {
    /// Returns the null handle.
    #[must_use]
    pub const fn null() -> Self {
        Self(std::ptr::null_mut())
    }

    /// Wraps a raw object pointer received from the host.
    #[must_use]
    pub const fn from_ptr(ptr: *mut c_void) -> Self {
        Self(ptr)
    }

    /// Returns the raw object pointer.
    #[must_use]
    pub const fn as_ptr(self) -> *mut c_void {
        self.0
    }

    /// Whether the handle is null.
    #[must_use]
    pub fn is_null(self) -> bool {
        self.0.is_null()
    }
}

/// Capacity of the buffers the host writes names and strings into.
#[cfg(feature = "link")]
pub const HOST_STRING_CAPACITY: usize = 4096;

#[cfg(feature = "link")]
fn read_buffer(buffer: &[u8]) -> String {
    CStr::from_bytes_until_nul(buffer)
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|_| String::from_utf8_lossy(buffer).into_owned())
}

#[cfg(feature = "link")]
impl ObjectHandle {
    /// Asks the host whether the object is still alive.
    #[must_use]
    pub fn is_valid(self) -> bool {
        !self.is_null() && unsafe { ffi::ue4ss_object_is_valid(self) }
    }

    /// Runs a console command in the context of the object.
    ///
    /// # Errors
    ///
    /// Returns an error if the command contains a NUL byte.
    pub fn invoke(self, command: &str) -> Result<bool> {
        let command = CString::new(command)?;
        Ok(unsafe { ffi::ue4ss_object_invoke(self, command.as_ptr()) })
    }

    /// Finds an object by its full name.
    ///
    /// # Errors
    ///
    /// Returns an error if the name contains a NUL byte.
    pub fn find(name: &str) -> Result<Option<Self>> {
        let name = CString::new(name)?;
        let handle = unsafe { ffi::ue4ss_object_find(name.as_ptr()) };
        Ok((!handle.is_null()).then_some(handle))
    }

    /// Returns the object's name as reported by the host.
    #[must_use]
    pub fn name(self) -> String {
        let mut buffer = vec![0u8; HOST_STRING_CAPACITY];
        unsafe { ffi::ue4ss_object_get_name(self, buffer.as_mut_ptr().cast::<c_char>()) };
        read_buffer(&buffer)
    }

    /// Reads a property. Returns `None` if the host reports no such property.
    ///
    /// # Errors
    ///
    /// Returns an error if the property name contains a NUL byte.
    pub fn get<T: Property>(self, name: &str) -> Result<Option<T>> {
        let name = CString::new(name)?;
        Ok(T::get(self, &name))
    }

    /// Writes a property. Returns whether the host accepted the write.
    ///
    /// # Errors
    ///
    /// Returns an error if the property name contains a NUL byte.
    pub fn set<T: Property>(self, name: &str, value: T) -> Result<bool> {
        let name = CString::new(name)?;
        value.set(self, &name)
    }

    /// Reads an enum property as its underlying value.
    ///
    /// # Errors
    ///
    /// Returns an error if the property name contains a NUL byte.
    pub fn get_enum(self, name: &str) -> Result<Option<i32>> {
        let name = CString::new(name)?;
        let mut value = 0;
        let found = unsafe { ffi::ue4ss_object_get_enum(self, name.as_ptr(), &raw mut value) };
        Ok(found.then_some(value))
    }

    /// Writes an enum property from its underlying value.
    ///
    /// # Errors
    ///
    /// Returns an error if the property name contains a NUL byte.
    pub fn set_enum(self, name: &str, value: i32) -> Result<bool> {
        let name = CString::new(name)?;
        Ok(unsafe { ffi::ue4ss_object_set_enum(self, name.as_ptr(), value) })
    }

    /// Reads a text property.
    ///
    /// # Errors
    ///
    /// Returns an error if the property name contains a NUL byte.
    pub fn get_text(self, name: &str) -> Result<Option<String>> {
        let name = CString::new(name)?;
        let mut buffer = vec![0u8; HOST_STRING_CAPACITY];
        let found = unsafe {
            ffi::ue4ss_object_get_text(self, name.as_ptr(), buffer.as_mut_ptr().cast::<c_char>())
        };
        Ok(found.then(|| read_buffer(&buffer)))
    }

    /// Writes a text property.
    ///
    /// # Errors
    ///
    /// Returns an error if the name or the value contains a NUL byte.
    pub fn set_text(self, name: &str, value: &str) -> Result<bool> {
        let name = CString::new(name)?;
        let value = CString::new(value)?;
        Ok(unsafe { ffi::ue4ss_object_set_text(self, name.as_ptr(), value.as_ptr()) })
    }
}

/// A property type the host can read and write on an object.
#[cfg(feature = "link")]
pub trait Property: Sized {
    /// Reads the property from the object.
    fn get(object: ObjectHandle, name: &CStr) -> Option<Self>;

    /// Writes the property to the object.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be passed to the host.
    fn set(self, object: ObjectHandle, name: &CStr) -> Result<bool>;
}

#[cfg(feature = "link")]
macro_rules! property {
    ($($ty: ty => $get: ident, $set: ident);* $(;)?) => {
        $(
            impl Property for $ty {
                fn get(object: ObjectHandle, name: &CStr) -> Option<Self> {
                    let mut value = <$ty>::default();
                    let found = unsafe { ffi::$get(object, name.as_ptr(), &raw mut value) };
                    found.then_some(value)
                }

                fn set(self, object: ObjectHandle, name: &CStr) -> Result<bool> {
                    Ok(unsafe { ffi::$set(object, name.as_ptr(), self) })
                }
            }
        )*
    };
}

#[cfg(feature = "link")]
property!(
    bool => ue4ss_object_get_bool, ue4ss_object_set_bool;
    u8 => ue4ss_object_get_byte, ue4ss_object_set_byte;
    i16 => ue4ss_object_get_short, ue4ss_object_set_short;
    u16 => ue4ss_object_get_ushort, ue4ss_object_set_ushort;
    i32 => ue4ss_object_get_int, ue4ss_object_set_int;
    u32 => ue4ss_object_get_uint, ue4ss_object_set_uint;
    i64 => ue4ss_object_get_long, ue4ss_object_set_long;
    u64 => ue4ss_object_get_ulong, ue4ss_object_set_ulong;
    f32 => ue4ss_object_get_float, ue4ss_object_set_float;
    f64 => ue4ss_object_get_double, ue4ss_object_set_double;
);

#[cfg(feature = "link")]
impl Property for String {
    fn get(object: ObjectHandle, name: &CStr) -> Option<Self> {
        let mut buffer = vec![0u8; HOST_STRING_CAPACITY];
        let found = unsafe {
            ffi::ue4ss_object_get_string(object, name.as_ptr(), buffer.as_mut_ptr().cast::<c_char>())
        };
        found.then(|| read_buffer(&buffer))
    }

    fn set(self, object: ObjectHandle, name: &CStr) -> Result<bool> {
        let value = CString::new(self)?;
        Ok(unsafe { ffi::ue4ss_object_set_string(object, name.as_ptr(), value.as_ptr()) })
    }
}
