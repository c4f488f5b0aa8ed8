// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Low-level bindings for the FA SDK C library (`FAI_c`).
//!
//! The library is loaded at runtime with `libloading`. Every entry point
//! returns an [`FA_STATUS`]; results are written through out-pointers.
//! Symbols missing from the loaded library do not fail the load, calling
//! one returns [`FA_ERR_NOT_IMPLEMENTED`] instead.
//!
//! # Text buffers
//!
//! Functions that fill text take `(buf: *mut c_char, len: *mut size_t)`. On
//! entry `*len` is the capacity of `buf` in bytes. The callee writes at most
//! `*len` bytes including a NUL terminator. On return `*len` is the length of
//! the complete value excluding the terminator, which may exceed the
//! capacity, in which case the call returns [`FA_ERR_BUFFER_TOO_SMALL`] and
//! `buf` holds the truncated, terminated prefix.
//!
//! # Callbacks
//!
//! Callbacks carry no user data pointer. The only argument is the handle of
//! the object that raised the event.

#![allow(non_camel_case_types, non_snake_case)]

pub use libc::{c_char, c_void, size_t};
use std::ffi::OsStr;

pub type FA_STATUS = libc::c_int;

pub type FA_CAMERA_HANDLE = *mut c_void;
pub type FA_NODEMAP_HANDLE = *mut c_void;
pub type FA_NODE_HANDLE = *mut c_void;
pub type FA_CALLBACK_HANDLE = *mut c_void;
pub type FA_CAMERA_CALLBACK_HANDLE = *mut c_void;

/// Camera event callback (configuration removal, image grabbed).
pub type FA_CameraCallback = Option<unsafe extern "C" fn(camera: FA_CAMERA_HANDLE)>;

/// Node event callback, raised when a node is invalidated or changes value.
pub type FA_NodeCallback = Option<unsafe extern "C" fn(node: FA_NODE_HANDLE)>;

pub const FA_SUCCESS: FA_STATUS = 0;
pub const FA_ERR_INVALID_HANDLE: FA_STATUS = -1;
pub const FA_ERR_INVALID_ARGUMENT: FA_STATUS = -2;
pub const FA_ERR_NOT_FOUND: FA_STATUS = -3;
pub const FA_ERR_ACCESS_DENIED: FA_STATUS = -4;
pub const FA_ERR_NOT_AVAILABLE: FA_STATUS = -5;
pub const FA_ERR_OUT_OF_RANGE: FA_STATUS = -6;
pub const FA_ERR_BUFFER_TOO_SMALL: FA_STATUS = -7;
pub const FA_ERR_TIMEOUT: FA_STATUS = -8;
pub const FA_ERR_BUSY: FA_STATUS = -9;
pub const FA_ERR_IO: FA_STATUS = -10;
pub const FA_ERR_NOT_IMPLEMENTED: FA_STATUS = -11;
pub const FA_ERR_UNKNOWN: FA_STATUS = -99;

pub type FA_NODE_TYPE = libc::c_int;
pub const FA_NODE_TYPE_VALUE: FA_NODE_TYPE = 0;
pub const FA_NODE_TYPE_BASE: FA_NODE_TYPE = 1;
pub const FA_NODE_TYPE_INTEGER: FA_NODE_TYPE = 2;
pub const FA_NODE_TYPE_BOOLEAN: FA_NODE_TYPE = 3;
pub const FA_NODE_TYPE_COMMAND: FA_NODE_TYPE = 4;
pub const FA_NODE_TYPE_FLOAT: FA_NODE_TYPE = 5;
pub const FA_NODE_TYPE_STRING: FA_NODE_TYPE = 6;
pub const FA_NODE_TYPE_REGISTER: FA_NODE_TYPE = 7;
pub const FA_NODE_TYPE_CATEGORY: FA_NODE_TYPE = 8;
pub const FA_NODE_TYPE_ENUMERATION: FA_NODE_TYPE = 9;
pub const FA_NODE_TYPE_ENUM_ENTRY: FA_NODE_TYPE = 10;
pub const FA_NODE_TYPE_PORT: FA_NODE_TYPE = 11;

pub type FA_VISIBILITY = libc::c_int;
pub const FA_VISIBILITY_BEGINNER: FA_VISIBILITY = 0;
pub const FA_VISIBILITY_EXPERT: FA_VISIBILITY = 1;
pub const FA_VISIBILITY_GURU: FA_VISIBILITY = 2;
pub const FA_VISIBILITY_INVISIBLE: FA_VISIBILITY = 3;

pub type FA_ACCESS_MODE = libc::c_int;
pub const FA_ACCESS_NI: FA_ACCESS_MODE = 0;
pub const FA_ACCESS_NA: FA_ACCESS_MODE = 1;
pub const FA_ACCESS_WO: FA_ACCESS_MODE = 2;
pub const FA_ACCESS_RO: FA_ACCESS_MODE = 3;
pub const FA_ACCESS_RW: FA_ACCESS_MODE = 4;

/// GenICam PFNC codes for the formats the SDK reports most often.
pub const FA_PIXEL_FORMAT_MONO8: u32 = 0x0108_0001;
pub const FA_PIXEL_FORMAT_RGB8: u32 = 0x0218_0014;
pub const FA_PIXEL_FORMAT_BGR8: u32 = 0x0218_0015;
pub const FA_PIXEL_FORMAT_BAYER_RG8: u32 = 0x0108_0009;

/// Grab result descriptor filled by `FA_Camera_RetrieveResult`.
///
/// `buffer` points into SDK-owned memory that is reused by the next
/// retrieve call on the same camera.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct FA_ImageInfo {
    pub width: u32,
    pub height: u32,
    pub pixel_format: u32,
    pub offset_x: u32,
    pub offset_y: u32,
    pub frame_id: u64,
    pub timestamp: u64,
    pub buffer: *mut u8,
    pub size: size_t,
}

impl Default for FA_ImageInfo {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            pixel_format: 0,
            offset_x: 0,
            offset_y: 0,
            frame_id: 0,
            timestamp: 0,
            buffer: std::ptr::null_mut(),
            size: 0,
        }
    }
}

#[cfg(target_os = "windows")]
pub const DEFAULT_LIBRARY: &str = "FAI_c.dll";
#[cfg(not(target_os = "windows"))]
pub const DEFAULT_LIBRARY: &str = "libFAI_c.so";

macro_rules! fa_library {
    ($($name:ident($($arg:ident: $ty:ty),* $(,)?);)*) => {
        /// Dynamically loaded FA SDK entry points.
        pub struct FaLibrary {
            __library: libloading::Library,
            $(pub $name: Result<unsafe extern "C" fn($($ty),*) -> FA_STATUS, libloading::Error>,)*
        }

        impl FaLibrary {
            /// Loads the SDK from `path` and resolves every entry point.
            ///
            /// # Safety
            ///
            /// Loading a library runs its initialisers. `path` must name a
            /// build of the FA SDK whose exported symbols match these
            /// signatures.
            pub unsafe fn new<P>(path: P) -> Result<Self, libloading::Error>
            where
                P: AsRef<OsStr>,
            {
                let library = libloading::Library::new(path)?;
                Self::from_library(library)
            }

            /// # Safety
            ///
            /// See [`FaLibrary::new`].
            pub unsafe fn from_library<L>(library: L) -> Result<Self, libloading::Error>
            where
                L: Into<libloading::Library>,
            {
                let __library = library.into();
                $(let $name = __library
                    .get(concat!(stringify!($name), "\0").as_bytes())
                    .map(|sym| *sym);)*
                Ok(Self { __library, $($name,)* })
            }

            /// Names of the entry points the loaded library does not export.
            pub fn missing_symbols(&self) -> Vec<&'static str> {
                let mut missing = Vec::new();
                $(if self.$name.is_err() {
                    missing.push(stringify!($name));
                })*
                missing
            }

            $(
                /// # Safety
                ///
                /// Pointer arguments must satisfy the SDK contract for this
                /// entry point.
                pub unsafe fn $name(&self, $($arg: $ty),*) -> FA_STATUS {
                    match self.$name.as_ref() {
                        Ok(f) => f($($arg),*),
                        Err(_) => FA_ERR_NOT_IMPLEMENTED,
                    }
                }
            )*
        }
    };
}

fa_library! {
    FA_GetLastErrorMessage(buf: *mut c_char, len: *mut size_t);

    FA_Camera_Enumerate(count: *mut size_t);
    FA_Camera_GetModelName(index: size_t, buf: *mut c_char, len: *mut size_t);
    FA_Camera_GetSerialNumber(index: size_t, buf: *mut c_char, len: *mut size_t);
    FA_Camera_Open(index: size_t, camera: *mut FA_CAMERA_HANDLE);
    FA_Camera_Close(camera: FA_CAMERA_HANDLE);
    FA_Camera_GetNodeMap(camera: FA_CAMERA_HANDLE, nodemap: *mut FA_NODEMAP_HANDLE);
    FA_Camera_StartGrabbing(camera: FA_CAMERA_HANDLE);
    FA_Camera_StopGrabbing(camera: FA_CAMERA_HANDLE);
    FA_Camera_IsGrabbing(camera: FA_CAMERA_HANDLE, grabbing: *mut bool);
    FA_Camera_RetrieveResult(camera: FA_CAMERA_HANDLE, timeout_ms: u32, info: *mut FA_ImageInfo);
    FA_Camera_GetImageBuffer(camera: FA_CAMERA_HANDLE, buffer: *mut *mut u8, size: *mut size_t);
    FA_Camera_RegisterConfigurationRemoval(
        camera: FA_CAMERA_HANDLE,
        callback: FA_CameraCallback,
        registration: *mut FA_CAMERA_CALLBACK_HANDLE,
    );
    FA_Camera_RegisterImageGrabbed(
        camera: FA_CAMERA_HANDLE,
        callback: FA_CameraCallback,
        registration: *mut FA_CAMERA_CALLBACK_HANDLE,
    );
    FA_Camera_DeregisterCallback(camera: FA_CAMERA_HANDLE, registration: FA_CAMERA_CALLBACK_HANDLE);

    FA_NodeMap_GetNode(nodemap: FA_NODEMAP_HANDLE, name: *const c_char, node: *mut FA_NODE_HANDLE);
    FA_NodeMap_GetNumNodes(nodemap: FA_NODEMAP_HANDLE, count: *mut size_t);
    FA_NodeMap_GetNodeByIndex(nodemap: FA_NODEMAP_HANDLE, index: size_t, node: *mut FA_NODE_HANDLE);
    FA_NodeMap_InvalidateNodes(nodemap: FA_NODEMAP_HANDLE);

    FA_Node_GetType(node: FA_NODE_HANDLE, node_type: *mut FA_NODE_TYPE);
    FA_Node_GetVisibility(node: FA_NODE_HANDLE, visibility: *mut FA_VISIBILITY);
    FA_Node_GetAccessMode(node: FA_NODE_HANDLE, access: *mut FA_ACCESS_MODE);
    FA_Node_GetName(node: FA_NODE_HANDLE, buf: *mut c_char, len: *mut size_t);
    FA_Node_GetDisplayName(node: FA_NODE_HANDLE, buf: *mut c_char, len: *mut size_t);
    FA_Node_GetToolTip(node: FA_NODE_HANDLE, buf: *mut c_char, len: *mut size_t);
    FA_Node_IsReadable(node: FA_NODE_HANDLE, readable: *mut bool);
    FA_Node_IsWritable(node: FA_NODE_HANDLE, writable: *mut bool);
    FA_Node_IsAvailable(node: FA_NODE_HANDLE, available: *mut bool);
    FA_Node_ToString(node: FA_NODE_HANDLE, buf: *mut c_char, len: *mut size_t);
    FA_Node_FromString(node: FA_NODE_HANDLE, value: *const c_char);
    FA_Node_RegisterCallback(
        node: FA_NODE_HANDLE,
        callback: FA_NodeCallback,
        registration: *mut FA_CALLBACK_HANDLE,
    );
    FA_Node_DeregisterCallback(node: FA_NODE_HANDLE, registration: FA_CALLBACK_HANDLE);

    FA_Integer_GetValue(node: FA_NODE_HANDLE, value: *mut i64);
    FA_Integer_SetValue(node: FA_NODE_HANDLE, value: i64);
    FA_Integer_GetMin(node: FA_NODE_HANDLE, value: *mut i64);
    FA_Integer_GetMax(node: FA_NODE_HANDLE, value: *mut i64);
    FA_Integer_GetInc(node: FA_NODE_HANDLE, value: *mut i64);

    FA_Float_GetValue(node: FA_NODE_HANDLE, value: *mut f64);
    FA_Float_SetValue(node: FA_NODE_HANDLE, value: f64);
    FA_Float_GetMin(node: FA_NODE_HANDLE, value: *mut f64);
    FA_Float_GetMax(node: FA_NODE_HANDLE, value: *mut f64);

    FA_Boolean_GetValue(node: FA_NODE_HANDLE, value: *mut bool);
    FA_Boolean_SetValue(node: FA_NODE_HANDLE, value: bool);

    FA_String_GetValue(node: FA_NODE_HANDLE, buf: *mut c_char, len: *mut size_t);
    FA_String_SetValue(node: FA_NODE_HANDLE, value: *const c_char);

    FA_Command_Execute(node: FA_NODE_HANDLE);
    FA_Command_IsDone(node: FA_NODE_HANDLE, done: *mut bool);

    FA_Enumeration_GetNumEntries(node: FA_NODE_HANDLE, count: *mut size_t);
    FA_Enumeration_GetEntryByIndex(node: FA_NODE_HANDLE, index: size_t, entry: *mut FA_NODE_HANDLE);
    FA_Enumeration_GetEntryByName(
        node: FA_NODE_HANDLE,
        name: *const c_char,
        entry: *mut FA_NODE_HANDLE,
    );
    FA_Enumeration_GetIntValue(node: FA_NODE_HANDLE, value: *mut i64);
    FA_Enumeration_SetIntValue(node: FA_NODE_HANDLE, value: i64);
    FA_EnumEntry_GetSymbolic(entry: FA_NODE_HANDLE, buf: *mut c_char, len: *mut size_t);
    FA_EnumEntry_GetIntValue(entry: FA_NODE_HANDLE, value: *mut i64);

    FA_Category_GetNumFeatures(node: FA_NODE_HANDLE, count: *mut size_t);
    FA_Category_GetFeatureByIndex(
        node: FA_NODE_HANDLE,
        index: size_t,
        feature: *mut FA_NODE_HANDLE,
    );
}
