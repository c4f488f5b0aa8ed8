// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Opaque native handles.
//!
//! A [`Handle<K>`] transports a native resource address without ever
//! dereferencing it. The kind parameter `K` keeps a [`NodeHandle`] from being
//! passed where a [`CameraHandle`] is expected, even though both are a single
//! address at the native boundary and a single integer on the host side.
//!
//! The bridge does not track liveness. A handle is meaningful only to the
//! native subsystem that issued it, between the native call that created it
//! and the one that invalidates it. Decoding an integer the native side never
//! issued produces a handle whose use is undefined at the native layer; the
//! bridge forwards it as is.

use crate::{error::MarshalError, host::HostValue};
use core::{fmt, hash, marker::PhantomData};
use std::ffi::c_void;

/// Marker for one family of native handles.
pub trait HandleKind: 'static {
    const NAME: &'static str;
}

macro_rules! handle_kinds {
    ($($(#[$doc:meta])* $kind:ident => $alias:ident,)*) => {
        $(
            $(#[$doc])*
            #[derive(Debug)]
            pub enum $kind {}

            impl HandleKind for $kind {
                const NAME: &'static str = stringify!($kind);
            }

            pub type $alias = Handle<$kind>;
        )*
    };
}

handle_kinds! {
    /// An opened camera device.
    Camera => CameraHandle,
    /// The feature tree of an opened camera.
    NodeMap => NodeMapHandle,
    /// One feature node of a node map.
    Node => NodeHandle,
    /// A node callback registration.
    Callback => CallbackHandle,
    /// A camera callback registration.
    CameraCallback => CameraCallbackHandle,
}

pub struct Handle<K: HandleKind> {
    addr: usize,
    kind: PhantomData<fn() -> K>,
}

impl<K: HandleKind> Handle<K> {
    pub const fn null() -> Self {
        Self::decode_addr(0)
    }

    const fn decode_addr(addr: usize) -> Self {
        Self {
            addr,
            kind: PhantomData,
        }
    }

    /// Decodes the host representation. `None` is the null handle.
    pub const fn decode(value: Option<usize>) -> Self {
        match value {
            Some(addr) => Self::decode_addr(addr),
            None => Self::null(),
        }
    }

    /// Encodes the handle as an address-sized host integer.
    pub const fn encode(self) -> usize {
        self.addr
    }

    pub fn from_raw(raw: *mut c_void) -> Self {
        Self::decode_addr(raw as usize)
    }

    pub fn as_raw(self) -> *mut c_void {
        self.addr as *mut c_void
    }

    pub const fn is_null(self) -> bool {
        self.addr == 0
    }

    /// Decodes a dynamically typed host value.
    pub fn from_host(value: &HostValue) -> Result<Self, MarshalError> {
        match value {
            HostValue::None => Ok(Self::null()),
            HostValue::UInt(u) => usize::try_from(*u)
                .map(Self::decode_addr)
                .map_err(|_| MarshalError::NumberOutOfRange {
                    value: *u as i64,
                    target: K::NAME,
                }),
            HostValue::Int(i) => usize::try_from(*i)
                .map(Self::decode_addr)
                .map_err(|_| MarshalError::NumberOutOfRange {
                    value: *i,
                    target: K::NAME,
                }),
            other => Err(MarshalError::TypeMismatch {
                expected: K::NAME,
                got: other.type_name(),
            }),
        }
    }
}

impl<K: HandleKind> crate::host::ToHost for Handle<K> {
    fn to_host(self) -> HostValue {
        HostValue::UInt(self.addr as u64)
    }
}

impl<K: HandleKind> Clone for Handle<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K: HandleKind> Copy for Handle<K> {}

impl<K: HandleKind> PartialEq for Handle<K> {
    fn eq(&self, other: &Self) -> bool {
        self.addr == other.addr
    }
}

impl<K: HandleKind> Eq for Handle<K> {}

impl<K: HandleKind> hash::Hash for Handle<K> {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.addr.hash(state)
    }
}

impl<K: HandleKind> Default for Handle<K> {
    fn default() -> Self {
        Self::null()
    }
}

impl<K: HandleKind> fmt::Debug for Handle<K> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}({:#x})", K::NAME, self.addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_is_null() {
        let handle = NodeHandle::decode(None);
        assert!(handle.is_null());
        assert!(handle.as_raw().is_null());
        assert_eq!(handle.encode(), 0);
    }

    fn round_trip<K: HandleKind>() {
        for value in [0, 1, 0xdead_beef, usize::MAX - 1, usize::MAX] {
            let handle = Handle::<K>::decode(Some(value));
            assert_eq!(handle.encode(), value, "{}", K::NAME);
            assert_eq!(Handle::<K>::from_raw(handle.as_raw()), handle);
        }
        assert_eq!(Handle::<K>::decode(None).encode(), 0);
    }

    #[test]
    fn test_round_trip_all_kinds() {
        round_trip::<Camera>();
        round_trip::<NodeMap>();
        round_trip::<Node>();
        round_trip::<Callback>();
        round_trip::<CameraCallback>();
    }

    #[test]
    fn test_from_host() {
        assert_eq!(
            CameraHandle::from_host(&HostValue::UInt(0x1000)),
            Ok(CameraHandle::decode(Some(0x1000)))
        );
        assert!(CameraHandle::from_host(&HostValue::None).unwrap().is_null());
        assert!(matches!(
            CameraHandle::from_host(&HostValue::Int(-1)),
            Err(MarshalError::NumberOutOfRange { .. })
        ));
        assert!(matches!(
            CameraHandle::from_host(&HostValue::Str("cam".into())),
            Err(MarshalError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_debug_names_kind() {
        let handle = NodeMapHandle::decode(Some(0xbeef));
        assert_eq!(format!("{handle:?}"), "NodeMap(0xbeef)");
    }
}
