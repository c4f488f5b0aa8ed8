// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Grab result payloads.
//!
//! The SDK hands out `(address, length)` pairs into memory it reuses on the
//! next acquisition. That lifetime cannot be expressed across the boundary,
//! so payloads are always copied into host-owned memory at the moment they
//! are exposed. No borrowed view is offered.

use crate::{
    error::MarshalError,
    host::{HostValue, ToHost},
};
use fai_sys::FA_ImageInfo;
use tracing::error;

/// Reports a broken memory-safety precondition.
///
/// Debug builds panic, since the breach means one side of the boundary
/// already violated its contract. Release builds abort the operation with
/// [`MarshalError::Precondition`].
#[track_caller]
pub(crate) fn precondition_violated(what: &'static str) -> MarshalError {
    error!("marshaling precondition violated: {what}");
    if cfg!(debug_assertions) {
        panic!("marshaling precondition violated: {what}");
    }
    MarshalError::Precondition(what)
}

/// Copies `len` bytes starting at `ptr` into a new vector.
///
/// `ptr` must be non-null and `len` non-zero; anything else is a contract
/// breach by the native side, see [`MarshalError::Precondition`].
///
/// # Safety
///
/// `ptr` must be valid for reads of `len` bytes for the duration of the call.
pub unsafe fn extract_bytes(ptr: *const u8, len: usize) -> Result<Vec<u8>, MarshalError> {
    if ptr.is_null() {
        return Err(precondition_violated("null buffer address"));
    }
    if len == 0 {
        return Err(precondition_violated("zero buffer length"));
    }
    Ok(std::slice::from_raw_parts(ptr, len).to_vec())
}

/// Copies the payload an `FA_ImageInfo` describes.
///
/// # Safety
///
/// `info.buffer` must be valid for reads of `info.size` bytes, which holds
/// until the next retrieve call on the camera that filled `info`.
pub unsafe fn get_buffer_from_image_info(info: &FA_ImageInfo) -> Result<Vec<u8>, MarshalError> {
    extract_bytes(info.buffer, info.size)
}

/// Host-owned copy of one grab result.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub pixel_format: u32,
    pub offset_x: u32,
    pub offset_y: u32,
    pub frame_id: u64,
    pub timestamp: u64,
    pub data: Vec<u8>,
}

impl ImageInfo {
    /// # Safety
    ///
    /// Same contract as [`get_buffer_from_image_info`].
    pub unsafe fn from_native(info: &FA_ImageInfo) -> Result<Self, MarshalError> {
        Ok(Self {
            width: info.width,
            height: info.height,
            pixel_format: info.pixel_format,
            offset_x: info.offset_x,
            offset_y: info.offset_y,
            frame_id: info.frame_id,
            timestamp: info.timestamp,
            data: get_buffer_from_image_info(info)?,
        })
    }
}

impl ToHost for ImageInfo {
    fn to_host(self) -> HostValue {
        HostValue::Tuple(vec![
            HostValue::UInt(self.width as u64),
            HostValue::UInt(self.height as u64),
            HostValue::UInt(self.pixel_format as u64),
            HostValue::UInt(self.offset_x as u64),
            HostValue::UInt(self.offset_y as u64),
            HostValue::UInt(self.frame_id),
            HostValue::UInt(self.timestamp),
            HostValue::Bytes(self.data),
        ])
    }
}
