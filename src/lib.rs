// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! # FAI Bridge
//!
//! Marshaling and callback bridging between a dynamically typed host and the
//! FA SDK, a handle-based C API for camera acquisition and GenICam node maps.
//!
//! ## Features
//!
//! - **Opaque Handles**: every native resource is a kinded [`Handle`] that
//!   round trips through an address-sized host integer without loss.
//! - **Output Parameters**: out-pointer results come back as tuples with the
//!   native [`Status`] first, see [`out`].
//! - **Bounded Strings**: text is read through fixed 256-byte buffers that
//!   are never read past their capacity, see [`strbuf`].
//! - **Callbacks**: host closures are routed to native events through static
//!   trampoline tables, see [`callback`].
//! - **Grab Results**: image payloads are copied into host-owned memory at
//!   the boundary, see [`buffer`].
//!
//! ## Example
//!
//! ```no_run
//! use fai_bridge::{Bridge, Callback};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let bridge = Bridge::load(fai_sys::DEFAULT_LIBRARY)?;
//!
//! let (status, camera) = bridge.camera_open(0);
//! status.check()?;
//!
//! let (status, _registration) = bridge.register_image_grabbed(
//!     camera,
//!     Callback::host(|camera| println!("frame ready on {camera:?}")),
//! )?;
//! status.check()?;
//!
//! bridge.camera_start_grabbing(camera).check()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Safety
//!
//! Handles are forwarded to the SDK without validation. A handle is only
//! meaningful between the native call that issued it and the one that
//! invalidates it; the bridge does not track liveness. Thread-safety of
//! handles follows the SDK's own contract.

pub mod bridge;
pub mod buffer;
pub mod callback;
pub mod error;
pub mod handle;
pub mod host;
pub mod native;
pub mod node;
pub mod out;
pub mod sim;
pub mod status;
pub mod strbuf;

pub use bridge::Bridge;
pub use buffer::{extract_bytes, get_buffer_from_image_info, ImageInfo};
pub use callback::{fault_count, Callback, CameraEvents, NodeEvents, TRAMPOLINE_SLOTS};
pub use error::{BridgeError, MarshalError, StatusError};
pub use handle::{
    CallbackHandle, CameraCallbackHandle, CameraHandle, Handle, HandleKind, NodeHandle,
    NodeMapHandle,
};
pub use host::{HostLock, HostValue, ToHost};
pub use native::{FaiLibrary, NativeApi};
pub use node::{AccessMode, NodeInfo, NodeType, Visibility};
pub use sim::SimulatedSdk;
pub use status::{Status, StatusKind};
pub use strbuf::STRING_CAPACITY;
