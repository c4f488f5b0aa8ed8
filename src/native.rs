// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Native API seam.
//!
//! [`NativeApi`] mirrors the FA SDK C entry points one to one, with raw C
//! argument types. The bridge talks to the SDK only through this trait so
//! the dynamically loaded library ([`FaiLibrary`]) and the simulated SDK
//! ([`crate::sim::SimulatedSdk`]) are interchangeable.
//!
//! Implementations must be `Send + Sync`. Whether a given handle may be used
//! from several threads at once is up to the SDK; the bridge passes the
//! SDK's thread-safety contract through and does not strengthen it.

use crate::error::BridgeError;
use fai_sys::*;
use tracing::{debug, warn};

macro_rules! native_api {
    ($($method:ident => $symbol:ident($($arg:ident: $ty:ty),* $(,)?);)*) => {
        /// Raw FA SDK entry points.
        ///
        /// # Safety
        ///
        /// Every method forwards raw pointers to the SDK. Callers must pass
        /// pointers that satisfy the SDK contract for that entry point:
        /// out-pointers valid for writes, text buffers valid for the
        /// capacity passed in `*len`, and handles issued by the same SDK.
        #[allow(clippy::missing_safety_doc)]
        pub trait NativeApi: Send + Sync {
            $(unsafe fn $method(&self, $($arg: $ty),*) -> FA_STATUS;)*
        }

        impl NativeApi for FaiLibrary {
            $(
                unsafe fn $method(&self, $($arg: $ty),*) -> FA_STATUS {
                    self.lib.$symbol($($arg),*)
                }
            )*
        }
    };
}

native_api! {
    get_last_error_message => FA_GetLastErrorMessage(buf: *mut c_char, len: *mut size_t);

    camera_enumerate => FA_Camera_Enumerate(count: *mut size_t);
    camera_get_model_name => FA_Camera_GetModelName(
        index: size_t,
        buf: *mut c_char,
        len: *mut size_t,
    );
    camera_get_serial_number => FA_Camera_GetSerialNumber(
        index: size_t,
        buf: *mut c_char,
        len: *mut size_t,
    );
    camera_open => FA_Camera_Open(index: size_t, camera: *mut FA_CAMERA_HANDLE);
    camera_close => FA_Camera_Close(camera: FA_CAMERA_HANDLE);
    camera_get_node_map => FA_Camera_GetNodeMap(
        camera: FA_CAMERA_HANDLE,
        nodemap: *mut FA_NODEMAP_HANDLE,
    );
    camera_start_grabbing => FA_Camera_StartGrabbing(camera: FA_CAMERA_HANDLE);
    camera_stop_grabbing => FA_Camera_StopGrabbing(camera: FA_CAMERA_HANDLE);
    camera_is_grabbing => FA_Camera_IsGrabbing(camera: FA_CAMERA_HANDLE, grabbing: *mut bool);
    camera_retrieve_result => FA_Camera_RetrieveResult(
        camera: FA_CAMERA_HANDLE,
        timeout_ms: u32,
        info: *mut FA_ImageInfo,
    );
    camera_get_image_buffer => FA_Camera_GetImageBuffer(
        camera: FA_CAMERA_HANDLE,
        buffer: *mut *mut u8,
        size: *mut size_t,
    );
    camera_register_configuration_removal => FA_Camera_RegisterConfigurationRemoval(
        camera: FA_CAMERA_HANDLE,
        callback: FA_CameraCallback,
        registration: *mut FA_CAMERA_CALLBACK_HANDLE,
    );
    camera_register_image_grabbed => FA_Camera_RegisterImageGrabbed(
        camera: FA_CAMERA_HANDLE,
        callback: FA_CameraCallback,
        registration: *mut FA_CAMERA_CALLBACK_HANDLE,
    );
    camera_deregister_callback => FA_Camera_DeregisterCallback(
        camera: FA_CAMERA_HANDLE,
        registration: FA_CAMERA_CALLBACK_HANDLE,
    );

    node_map_get_node => FA_NodeMap_GetNode(
        nodemap: FA_NODEMAP_HANDLE,
        name: *const c_char,
        node: *mut FA_NODE_HANDLE,
    );
    node_map_get_num_nodes => FA_NodeMap_GetNumNodes(
        nodemap: FA_NODEMAP_HANDLE,
        count: *mut size_t,
    );
    node_map_get_node_by_index => FA_NodeMap_GetNodeByIndex(
        nodemap: FA_NODEMAP_HANDLE,
        index: size_t,
        node: *mut FA_NODE_HANDLE,
    );
    node_map_invalidate_nodes => FA_NodeMap_InvalidateNodes(nodemap: FA_NODEMAP_HANDLE);

    node_get_type => FA_Node_GetType(node: FA_NODE_HANDLE, node_type: *mut FA_NODE_TYPE);
    node_get_visibility => FA_Node_GetVisibility(
        node: FA_NODE_HANDLE,
        visibility: *mut FA_VISIBILITY,
    );
    node_get_access_mode => FA_Node_GetAccessMode(
        node: FA_NODE_HANDLE,
        access: *mut FA_ACCESS_MODE,
    );
    node_get_name => FA_Node_GetName(node: FA_NODE_HANDLE, buf: *mut c_char, len: *mut size_t);
    node_get_display_name => FA_Node_GetDisplayName(
        node: FA_NODE_HANDLE,
        buf: *mut c_char,
        len: *mut size_t,
    );
    node_get_tool_tip => FA_Node_GetToolTip(
        node: FA_NODE_HANDLE,
        buf: *mut c_char,
        len: *mut size_t,
    );
    node_is_readable => FA_Node_IsReadable(node: FA_NODE_HANDLE, readable: *mut bool);
    node_is_writable => FA_Node_IsWritable(node: FA_NODE_HANDLE, writable: *mut bool);
    node_is_available => FA_Node_IsAvailable(node: FA_NODE_HANDLE, available: *mut bool);
    node_to_string => FA_Node_ToString(node: FA_NODE_HANDLE, buf: *mut c_char, len: *mut size_t);
    node_from_string => FA_Node_FromString(node: FA_NODE_HANDLE, value: *const c_char);
    node_register_callback => FA_Node_RegisterCallback(
        node: FA_NODE_HANDLE,
        callback: FA_NodeCallback,
        registration: *mut FA_CALLBACK_HANDLE,
    );
    node_deregister_callback => FA_Node_DeregisterCallback(
        node: FA_NODE_HANDLE,
        registration: FA_CALLBACK_HANDLE,
    );

    integer_get_value => FA_Integer_GetValue(node: FA_NODE_HANDLE, value: *mut i64);
    integer_set_value => FA_Integer_SetValue(node: FA_NODE_HANDLE, value: i64);
    integer_get_min => FA_Integer_GetMin(node: FA_NODE_HANDLE, value: *mut i64);
    integer_get_max => FA_Integer_GetMax(node: FA_NODE_HANDLE, value: *mut i64);
    integer_get_inc => FA_Integer_GetInc(node: FA_NODE_HANDLE, value: *mut i64);

    float_get_value => FA_Float_GetValue(node: FA_NODE_HANDLE, value: *mut f64);
    float_set_value => FA_Float_SetValue(node: FA_NODE_HANDLE, value: f64);
    float_get_min => FA_Float_GetMin(node: FA_NODE_HANDLE, value: *mut f64);
    float_get_max => FA_Float_GetMax(node: FA_NODE_HANDLE, value: *mut f64);

    boolean_get_value => FA_Boolean_GetValue(node: FA_NODE_HANDLE, value: *mut bool);
    boolean_set_value => FA_Boolean_SetValue(node: FA_NODE_HANDLE, value: bool);

    string_get_value => FA_String_GetValue(
        node: FA_NODE_HANDLE,
        buf: *mut c_char,
        len: *mut size_t,
    );
    string_set_value => FA_String_SetValue(node: FA_NODE_HANDLE, value: *const c_char);

    command_execute => FA_Command_Execute(node: FA_NODE_HANDLE);
    command_is_done => FA_Command_IsDone(node: FA_NODE_HANDLE, done: *mut bool);

    enumeration_get_num_entries => FA_Enumeration_GetNumEntries(
        node: FA_NODE_HANDLE,
        count: *mut size_t,
    );
    enumeration_get_entry_by_index => FA_Enumeration_GetEntryByIndex(
        node: FA_NODE_HANDLE,
        index: size_t,
        entry: *mut FA_NODE_HANDLE,
    );
    enumeration_get_entry_by_name => FA_Enumeration_GetEntryByName(
        node: FA_NODE_HANDLE,
        name: *const c_char,
        entry: *mut FA_NODE_HANDLE,
    );
    enumeration_get_int_value => FA_Enumeration_GetIntValue(node: FA_NODE_HANDLE, value: *mut i64);
    enumeration_set_int_value => FA_Enumeration_SetIntValue(node: FA_NODE_HANDLE, value: i64);
    enum_entry_get_symbolic => FA_EnumEntry_GetSymbolic(
        entry: FA_NODE_HANDLE,
        buf: *mut c_char,
        len: *mut size_t,
    );
    enum_entry_get_int_value => FA_EnumEntry_GetIntValue(entry: FA_NODE_HANDLE, value: *mut i64);

    category_get_num_features => FA_Category_GetNumFeatures(
        node: FA_NODE_HANDLE,
        count: *mut size_t,
    );
    category_get_feature_by_index => FA_Category_GetFeatureByIndex(
        node: FA_NODE_HANDLE,
        index: size_t,
        feature: *mut FA_NODE_HANDLE,
    );
}

/// The FA SDK loaded at runtime.
pub struct FaiLibrary {
    lib: FaLibrary,
    path: String,
}

impl FaiLibrary {
    /// Loads the SDK from `path`, for example [`DEFAULT_LIBRARY`].
    ///
    /// Entry points missing from the library are reported once and answer
    /// every call with `FA_ERR_NOT_IMPLEMENTED`.
    pub fn new(path: &str) -> Result<Self, BridgeError> {
        let lib = unsafe { FaLibrary::new(path) }?;
        let missing = lib.missing_symbols();
        if !missing.is_empty() {
            warn!(path, ?missing, "FA SDK is missing entry points");
        }
        debug!(path, "loaded FA SDK");
        Ok(Self {
            lib,
            path: path.to_owned(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}
