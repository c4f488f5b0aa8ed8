// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Host-facing entry points.
//!
//! [`Bridge`] exposes one method per FA SDK entry point. Handles go in
//! decoded, results come out as tuples with the native [`Status`] first and
//! the output parameters after it, in the order of the native signature.
//! A failing status is returned as is; the output values are then whatever
//! the slot held and must not be trusted.

use crate::{
    buffer::{extract_bytes, ImageInfo},
    callback::{self, Callback, CallbackFamily, CameraEvents, NativeCallback, NodeEvents},
    error::{BridgeError, MarshalError, StatusError},
    handle::{
        CallbackHandle, Camera, CameraCallbackHandle, CameraHandle, Handle, HandleKind, Node,
        NodeHandle, NodeMapHandle,
    },
    native::{FaiLibrary, NativeApi},
    node::{AccessMode, NodeInfo, NodeType, Visibility},
    out::{call, call_bool, call_out1},
    status::{Status, StatusKind},
    strbuf::call_string,
};
use fai_sys::{c_void, size_t, FA_CameraCallback, FA_ImageInfo, FA_NodeCallback, FA_STATUS};
use parking_lot::Mutex;
use std::{collections::HashMap, ffi::CStr, ptr, sync::Arc};
use tracing::{debug, trace, warn};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
enum Family {
    Camera,
    Node,
}

/// Registration handles are only unique per event source, so the source is
/// part of the key.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
struct RegistrationKey {
    family: Family,
    source: usize,
    registration: usize,
}

pub struct Bridge {
    api: Arc<dyn NativeApi>,
    /// Trampoline slot owned by each live registration, `None` for native
    /// pointers.
    registrations: Mutex<HashMap<RegistrationKey, Option<usize>>>,
}

fn checked<T>((status, value): (Status, T)) -> Result<T, StatusError> {
    status.check().map(|()| value)
}

impl Bridge {
    pub fn new(api: Arc<dyn NativeApi>) -> Self {
        Self {
            api,
            registrations: Mutex::new(HashMap::new()),
        }
    }

    /// Loads the FA SDK from `path` and bridges to it.
    pub fn load(path: &str) -> Result<Self, BridgeError> {
        Ok(Self::new(Arc::new(FaiLibrary::new(path)?)))
    }

    pub fn api(&self) -> &dyn NativeApi {
        self.api.as_ref()
    }

    /// Number of callback registrations made through this bridge and not yet
    /// deregistered.
    pub fn registrations(&self) -> usize {
        self.registrations.lock().len()
    }

    pub fn get_last_error_message(&self) -> (Status, String) {
        call_string(|buf, len| unsafe { self.api.get_last_error_message(buf, len) })
    }

    // Device

    pub fn camera_enumerate(&self) -> (Status, usize) {
        call_out1::<usize, _>(|count| unsafe { self.api.camera_enumerate(count) })
    }

    pub fn camera_get_model_name(&self, index: usize) -> (Status, String) {
        call_string(|buf, len| unsafe { self.api.camera_get_model_name(index, buf, len) })
    }

    pub fn camera_get_serial_number(&self, index: usize) -> (Status, String) {
        call_string(|buf, len| unsafe { self.api.camera_get_serial_number(index, buf, len) })
    }

    pub fn camera_open(&self, index: usize) -> (Status, CameraHandle) {
        let (status, camera) =
            call_out1::<CameraHandle, _>(|camera| unsafe { self.api.camera_open(index, camera) });
        debug!(index, ?camera, %status, "camera open");
        (status, camera)
    }

    pub fn camera_close(&self, camera: CameraHandle) -> Status {
        let status = call(|| unsafe { self.api.camera_close(camera.as_raw()) });
        debug!(?camera, %status, "camera close");
        status
    }

    pub fn camera_get_node_map(&self, camera: CameraHandle) -> (Status, NodeMapHandle) {
        call_out1::<NodeMapHandle, _>(|nodemap| unsafe {
            self.api.camera_get_node_map(camera.as_raw(), nodemap)
        })
    }

    pub fn camera_start_grabbing(&self, camera: CameraHandle) -> Status {
        call(|| unsafe { self.api.camera_start_grabbing(camera.as_raw()) })
    }

    pub fn camera_stop_grabbing(&self, camera: CameraHandle) -> Status {
        call(|| unsafe { self.api.camera_stop_grabbing(camera.as_raw()) })
    }

    pub fn camera_is_grabbing(&self, camera: CameraHandle) -> (Status, bool) {
        call_out1::<bool, _>(|grabbing| unsafe {
            self.api.camera_is_grabbing(camera.as_raw(), grabbing)
        })
    }

    /// Waits up to `timeout_ms` for the next grab result and copies it.
    ///
    /// The image is `None` when the status is not success.
    pub fn retrieve_result(
        &self,
        camera: CameraHandle,
        timeout_ms: u32,
    ) -> Result<(Status, Option<ImageInfo>), MarshalError> {
        let mut info = FA_ImageInfo::default();
        let status = call(|| unsafe {
            self.api
                .camera_retrieve_result(camera.as_raw(), timeout_ms, ptr::addr_of_mut!(info))
        });
        if !status.is_success() {
            return Ok((status, None));
        }
        // SAFETY: the payload stays valid until the next retrieve on this camera.
        let image = unsafe { ImageInfo::from_native(&info) }?;
        trace!(frame_id = image.frame_id, size = image.data.len(), "retrieved");
        Ok((status, Some(image)))
    }

    /// Copies the payload of the camera's current grab result.
    ///
    /// The bytes are `None` when the status is not success.
    pub fn get_buffer(
        &self,
        camera: CameraHandle,
    ) -> Result<(Status, Option<Vec<u8>>), MarshalError> {
        let mut buffer: *mut u8 = ptr::null_mut();
        let mut size: size_t = 0;
        let status = call(|| unsafe {
            self.api.camera_get_image_buffer(
                camera.as_raw(),
                ptr::addr_of_mut!(buffer),
                ptr::addr_of_mut!(size),
            )
        });
        if !status.is_success() {
            return Ok((status, None));
        }
        let bytes = unsafe { extract_bytes(buffer, size) }?;
        Ok((status, Some(bytes)))
    }

    // Camera callbacks

    pub fn register_configuration_removal(
        &self,
        camera: CameraHandle,
        callback: Callback<Camera>,
    ) -> Result<(Status, CameraCallbackHandle), BridgeError> {
        self.register::<CameraEvents, _>(
            Family::Camera,
            camera,
            callback,
            |f, registration| unsafe {
                self.api.camera_register_configuration_removal(
                    camera.as_raw(),
                    Some(f),
                    registration,
                )
            },
        )
    }

    pub fn register_image_grabbed(
        &self,
        camera: CameraHandle,
        callback: Callback<Camera>,
    ) -> Result<(Status, CameraCallbackHandle), BridgeError> {
        self.register::<CameraEvents, _>(
            Family::Camera,
            camera,
            callback,
            |f, registration| unsafe {
                self.api
                    .camera_register_image_grabbed(camera.as_raw(), Some(f), registration)
            },
        )
    }

    pub fn register_configuration_removal_raw(
        &self,
        camera: CameraHandle,
        callback: FA_CameraCallback,
    ) -> (Status, CameraCallbackHandle) {
        self.register_raw(Family::Camera, camera, |registration| unsafe {
            self.api
                .camera_register_configuration_removal(camera.as_raw(), callback, registration)
        })
    }

    pub fn register_image_grabbed_raw(
        &self,
        camera: CameraHandle,
        callback: FA_CameraCallback,
    ) -> (Status, CameraCallbackHandle) {
        self.register_raw(Family::Camera, camera, |registration| unsafe {
            self.api
                .camera_register_image_grabbed(camera.as_raw(), callback, registration)
        })
    }

    pub fn deregister_camera_callback(
        &self,
        camera: CameraHandle,
        registration: CameraCallbackHandle,
    ) -> Status {
        self.deregister::<CameraEvents, _>(Family::Camera, camera, registration, || unsafe {
            self.api
                .camera_deregister_callback(camera.as_raw(), registration.as_raw())
        })
    }

    // Node map

    pub fn node_map_get_node(&self, nodemap: NodeMapHandle, name: &CStr) -> (Status, NodeHandle) {
        call_out1::<NodeHandle, _>(|node| unsafe {
            self.api
                .node_map_get_node(nodemap.as_raw(), name.as_ptr(), node)
        })
    }

    pub fn node_map_get_num_nodes(&self, nodemap: NodeMapHandle) -> (Status, usize) {
        call_out1::<usize, _>(|count| unsafe {
            self.api.node_map_get_num_nodes(nodemap.as_raw(), count)
        })
    }

    pub fn node_map_get_node_by_index(
        &self,
        nodemap: NodeMapHandle,
        index: usize,
    ) -> (Status, NodeHandle) {
        call_out1::<NodeHandle, _>(|node| unsafe {
            self.api
                .node_map_get_node_by_index(nodemap.as_raw(), index, node)
        })
    }

    pub fn node_map_invalidate_nodes(&self, nodemap: NodeMapHandle) -> Status {
        call(|| unsafe { self.api.node_map_invalidate_nodes(nodemap.as_raw()) })
    }

    // Node

    pub fn node_get_type(&self, node: NodeHandle) -> (Status, NodeType) {
        call_out1::<NodeType, _>(|out| unsafe { self.api.node_get_type(node.as_raw(), out) })
    }

    pub fn node_get_visibility(&self, node: NodeHandle) -> (Status, Visibility) {
        call_out1::<Visibility, _>(|out| unsafe {
            self.api.node_get_visibility(node.as_raw(), out)
        })
    }

    pub fn node_get_access_mode(&self, node: NodeHandle) -> (Status, AccessMode) {
        call_out1::<AccessMode, _>(|out| unsafe {
            self.api.node_get_access_mode(node.as_raw(), out)
        })
    }

    pub fn node_get_name(&self, node: NodeHandle) -> (Status, String) {
        call_string(|buf, len| unsafe { self.api.node_get_name(node.as_raw(), buf, len) })
    }

    pub fn node_get_display_name(&self, node: NodeHandle) -> (Status, String) {
        call_string(|buf, len| unsafe { self.api.node_get_display_name(node.as_raw(), buf, len) })
    }

    pub fn node_get_tool_tip(&self, node: NodeHandle) -> (Status, String) {
        call_string(|buf, len| unsafe { self.api.node_get_tool_tip(node.as_raw(), buf, len) })
    }

    pub fn node_is_readable(&self, node: NodeHandle) -> (Status, bool) {
        call_out1::<bool, _>(|out| unsafe { self.api.node_is_readable(node.as_raw(), out) })
    }

    pub fn node_is_writable(&self, node: NodeHandle) -> (Status, bool) {
        call_out1::<bool, _>(|out| unsafe { self.api.node_is_writable(node.as_raw(), out) })
    }

    pub fn node_is_available(&self, node: NodeHandle) -> (Status, bool) {
        call_out1::<bool, _>(|out| unsafe { self.api.node_is_available(node.as_raw(), out) })
    }

    pub fn node_to_string(&self, node: NodeHandle) -> (Status, String) {
        call_string(|buf, len| unsafe { self.api.node_to_string(node.as_raw(), buf, len) })
    }

    pub fn node_from_string(&self, node: NodeHandle, value: &CStr) -> Status {
        call(|| unsafe { self.api.node_from_string(node.as_raw(), value.as_ptr()) })
    }

    // Node callbacks

    pub fn register_node_callback(
        &self,
        node: NodeHandle,
        callback: Callback<Node>,
    ) -> Result<(Status, CallbackHandle), BridgeError> {
        self.register::<NodeEvents, _>(Family::Node, node, callback, |f, registration| unsafe {
            self.api
                .node_register_callback(node.as_raw(), Some(f), registration)
        })
    }

    pub fn register_node_callback_raw(
        &self,
        node: NodeHandle,
        callback: FA_NodeCallback,
    ) -> (Status, CallbackHandle) {
        self.register_raw(Family::Node, node, |registration| unsafe {
            self.api
                .node_register_callback(node.as_raw(), callback, registration)
        })
    }

    pub fn deregister_node_callback(
        &self,
        node: NodeHandle,
        registration: CallbackHandle,
    ) -> Status {
        self.deregister::<NodeEvents, _>(Family::Node, node, registration, || unsafe {
            self.api
                .node_deregister_callback(node.as_raw(), registration.as_raw())
        })
    }

    // Typed values

    pub fn integer_get_value(&self, node: NodeHandle) -> (Status, i64) {
        call_out1::<i64, _>(|out| unsafe { self.api.integer_get_value(node.as_raw(), out) })
    }

    pub fn integer_set_value(&self, node: NodeHandle, value: i64) -> Status {
        call(|| unsafe { self.api.integer_set_value(node.as_raw(), value) })
    }

    pub fn integer_get_min(&self, node: NodeHandle) -> (Status, i64) {
        call_out1::<i64, _>(|out| unsafe { self.api.integer_get_min(node.as_raw(), out) })
    }

    pub fn integer_get_max(&self, node: NodeHandle) -> (Status, i64) {
        call_out1::<i64, _>(|out| unsafe { self.api.integer_get_max(node.as_raw(), out) })
    }

    pub fn integer_get_inc(&self, node: NodeHandle) -> (Status, i64) {
        call_out1::<i64, _>(|out| unsafe { self.api.integer_get_inc(node.as_raw(), out) })
    }

    pub fn float_get_value(&self, node: NodeHandle) -> (Status, f64) {
        call_out1::<f64, _>(|out| unsafe { self.api.float_get_value(node.as_raw(), out) })
    }

    pub fn float_set_value(&self, node: NodeHandle, value: f64) -> Status {
        call(|| unsafe { self.api.float_set_value(node.as_raw(), value) })
    }

    pub fn float_get_min(&self, node: NodeHandle) -> (Status, f64) {
        call_out1::<f64, _>(|out| unsafe { self.api.float_get_min(node.as_raw(), out) })
    }

    pub fn float_get_max(&self, node: NodeHandle) -> (Status, f64) {
        call_out1::<f64, _>(|out| unsafe { self.api.float_get_max(node.as_raw(), out) })
    }

    pub fn boolean_get_value(&self, node: NodeHandle) -> (Status, bool) {
        call_out1::<bool, _>(|out| unsafe { self.api.boolean_get_value(node.as_raw(), out) })
    }

    pub fn boolean_set_value(&self, node: NodeHandle, value: bool) -> Status {
        call(|| unsafe { self.api.boolean_set_value(node.as_raw(), value) })
    }

    pub fn string_get_value(&self, node: NodeHandle) -> (Status, String) {
        call_string(|buf, len| unsafe { self.api.string_get_value(node.as_raw(), buf, len) })
    }

    pub fn string_set_value(&self, node: NodeHandle, value: &CStr) -> Status {
        call(|| unsafe { self.api.string_set_value(node.as_raw(), value.as_ptr()) })
    }

    pub fn command_execute(&self, node: NodeHandle) -> Status {
        call(|| unsafe { self.api.command_execute(node.as_raw()) })
    }

    pub fn command_is_done(&self, node: NodeHandle) -> (Status, bool) {
        call_out1::<bool, _>(|out| unsafe { self.api.command_is_done(node.as_raw(), out) })
    }

    // Enumerations

    pub fn enumeration_get_num_entries(&self, node: NodeHandle) -> (Status, usize) {
        call_out1::<usize, _>(|out| unsafe {
            self.api.enumeration_get_num_entries(node.as_raw(), out)
        })
    }

    pub fn enumeration_get_entry_by_index(
        &self,
        node: NodeHandle,
        index: usize) -> (Status, NodeHandle,
    ) {
        call_out1::<NodeHandle, _>(|out| unsafe {
            self.api
                .enumeration_get_entry_by_index(node.as_raw(), index, out)
        })
    }

    pub fn enumeration_get_entry_by_name(
        &self,
        node: NodeHandle,
        name: &CStr) -> (Status, NodeHandle,
    ) {
        call_out1::<NodeHandle, _>(|out| unsafe {
            self.api
                .enumeration_get_entry_by_name(node.as_raw(), name.as_ptr(), out)
        })
    }

    pub fn enumeration_get_int_value(&self, node: NodeHandle) -> (Status, i64) {
        call_out1::<i64, _>(|out| unsafe { self.api.enumeration_get_int_value(node.as_raw(), out) })
    }

    pub fn enumeration_set_int_value(&self, node: NodeHandle, value: i64) -> Status {
        call(|| unsafe { self.api.enumeration_set_int_value(node.as_raw(), value) })
    }

    pub fn enum_entry_get_symbolic(&self, entry: NodeHandle) -> (Status, String) {
        call_string(|buf, len| unsafe {
            self.api.enum_entry_get_symbolic(entry.as_raw(), buf, len)
        })
    }

    pub fn enum_entry_get_int_value(&self, entry: NodeHandle) -> (Status, i64) {
        call_out1::<i64, _>(|out| unsafe { self.api.enum_entry_get_int_value(entry.as_raw(), out) })
    }

    // Categories

    pub fn category_get_num_features(&self, node: NodeHandle) -> (Status, usize) {
        call_out1::<usize, _>(|out| unsafe {
            self.api.category_get_num_features(node.as_raw(), out)
        })
    }

    pub fn category_get_feature_by_index(
        &self,
        node: NodeHandle,
        index: usize) -> (Status, NodeHandle,
    ) {
        call_out1::<NodeHandle, _>(|out| unsafe {
            self.api
                .category_get_feature_by_index(node.as_raw(), index, out)
        })
    }

    // Boolean results

    pub fn boolean_value(&self, node: NodeHandle) -> Result<bool, Status> {
        call_bool(|out| unsafe { self.api.boolean_get_value(node.as_raw(), out) })
    }

    pub fn is_readable(&self, node: NodeHandle) -> Result<bool, Status> {
        call_bool(|out| unsafe { self.api.node_is_readable(node.as_raw(), out) })
    }

    pub fn is_writable(&self, node: NodeHandle) -> Result<bool, Status> {
        call_bool(|out| unsafe { self.api.node_is_writable(node.as_raw(), out) })
    }

    pub fn is_available(&self, node: NodeHandle) -> Result<bool, Status> {
        call_bool(|out| unsafe { self.api.node_is_available(node.as_raw(), out) })
    }

    pub fn is_grabbing(&self, camera: CameraHandle) -> Result<bool, Status> {
        call_bool(|out| unsafe { self.api.camera_is_grabbing(camera.as_raw(), out) })
    }

    pub fn is_command_done(&self, node: NodeHandle) -> Result<bool, Status> {
        call_bool(|out| unsafe { self.api.command_is_done(node.as_raw(), out) })
    }

    /// Walks the feature tree below the `Root` category, depth first.
    pub fn walk(&self, nodemap: NodeMapHandle) -> Result<Vec<NodeInfo>, StatusError> {
        let root = checked(self.node_map_get_node(nodemap, c"Root"))?;
        let mut nodes = Vec::new();
        let mut stack = vec![(root, 0usize)];

        while let Some((node, depth)) = stack.pop() {
            let node_type = checked(self.node_get_type(node))?;
            let readable = checked(self.node_is_readable(node))?;
            let value = match node_type {
                NodeType::Category | NodeType::Command | NodeType::Port => None,
                _ if readable => {
                    // Long values are kept truncated.
                    let (status, text) = self.node_to_string(node);
                    if status.kind() != StatusKind::BufferTooSmall {
                        status.check()?;
                    }
                    Some(text)
                }
                _ => None,
            };

            if node_type == NodeType::Category {
                let count = checked(self.category_get_num_features(node))?;
                for index in (0..count).rev() {
                    let feature = checked(self.category_get_feature_by_index(node, index))?;
                    stack.push((feature, depth + 1));
                }
            }

            nodes.push(NodeInfo {
                name: checked(self.node_get_name(node))?,
                node_type,
                visibility: checked(self.node_get_visibility(node))?,
                access: checked(self.node_get_access_mode(node))?,
                depth,
                value,
            });
        }

        Ok(nodes)
    }

    fn register<F, R>(
        &self,
        family: Family,
        source: Handle<F::Kind>,
        callback: Callback<F::Kind>,
        native: R,
    ) -> Result<(Status, Handle<F::Registration>), BridgeError>
    where
        F: CallbackFamily,
        R: FnOnce(NativeCallback, *mut *mut c_void) -> FA_STATUS,
    {
        let bridged = callback::bridge_callback::<F>(callback)?;
        let (status, registration) =
            call_out1::<Handle<F::Registration>, _>(|out| native(bridged.pointer, out));

        if status.is_success() {
            self.record(family, source.encode(), registration.encode(), bridged.slot);
        } else if let Some(slot) = bridged.slot {
            callback::release::<F>(slot);
        }
        debug!(family = F::NAME, ?source, ?registration, %status, "registered callback");
        Ok((status, registration))
    }

    fn register_raw<K, R, N>(
        &self,
        family: Family,
        source: Handle<K>,
        native: N,
    ) -> (Status, Handle<R>)
    where
        K: HandleKind,
        R: HandleKind,
        N: FnOnce(*mut *mut c_void) -> FA_STATUS,
    {
        let (status, registration) = call_out1::<Handle<R>, _>(native);
        if status.is_success() {
            self.record(family, source.encode(), registration.encode(), None);
        }
        (status, registration)
    }

    fn record(&self, family: Family, source: usize, registration: usize, slot: Option<usize>) {
        let key = RegistrationKey {
            family,
            source,
            registration,
        };
        if let Some(Some(stale)) = self.registrations.lock().insert(key, slot) {
            // The SDK reissued a live handle; the old thunk can no longer be
            // deregistered through this bridge.
            warn!(?key, stale, "registration handle reissued by the SDK");
        }
    }

    fn deregister<F, N>(
        &self,
        family: Family,
        source: Handle<F::Kind>,
        registration: Handle<F::Registration>,
        native: N,
    ) -> Status
    where
        F: CallbackFamily,
        N: FnOnce() -> FA_STATUS,
    {
        let status = call(native);
        if status.is_success() {
            let key = RegistrationKey {
                family,
                source: source.encode(),
                registration: registration.encode(),
            };
            let removed = self.registrations.lock().remove(&key);
            if let Some(slot) = removed.flatten() {
                callback::release::<F>(slot);
            }
        }
        debug!(family = F::NAME, ?source, ?registration, %status, "deregistered callback");
        status
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        let live = self.registrations.get_mut().drain().collect::<Vec<_>>();
        if live.is_empty() {
            return;
        }
        warn!(count = live.len(), "bridge dropped with live callback registrations");

        for (key, slot) in live {
            let source = key.source as *mut c_void;
            let handle = key.registration as *mut c_void;
            let status = Status::from_code(unsafe {
                match key.family {
                    Family::Camera => self.api.camera_deregister_callback(source, handle),
                    Family::Node => self.api.node_deregister_callback(source, handle),
                }
            });
            if !status.is_success() {
                // The SDK may still call the thunk, keep its slot occupied.
                warn!(?key, %status, "failed to deregister callback");
                continue;
            }
            if let Some(slot) = slot {
                match key.family {
                    Family::Camera => callback::release::<CameraEvents>(slot),
                    Family::Node => callback::release::<NodeEvents>(slot),
                }
            }
        }
    }
}
