// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Output-parameter adapter.
//!
//! Native entry points return results through out-pointers. The helpers here
//! allocate call-scoped storage, hand its address to the native call and
//! return the stored values after the status, in the order the parameters
//! appear in the native signature.
//!
//! The stored value is returned even when the call fails. It then holds the
//! initial value or whatever the native side wrote before failing, so check
//! the status before trusting it.

use crate::{
    handle::{Handle, HandleKind},
    node::{AccessMode, NodeType, Visibility},
    status::Status,
};
use fai_sys::{c_void, FA_ACCESS_MODE, FA_NODE_TYPE, FA_STATUS, FA_VISIBILITY};
use std::ptr;

/// A host type the native side can produce through an out-pointer.
pub trait OutParam: Sized {
    /// C storage the native call writes into.
    type Raw: Copy;

    /// Value the slot holds before the call.
    const INIT: Self::Raw;

    fn from_raw(raw: Self::Raw) -> Self;
}

macro_rules! plain_out_param {
    ($($ty:ty = $init:expr,)*) => {
        $(
            impl OutParam for $ty {
                type Raw = $ty;
                const INIT: $ty = $init;

                fn from_raw(raw: $ty) -> Self {
                    raw
                }
            }
        )*
    };
}

plain_out_param! {
    bool = false,
    i64 = 0,
    f64 = 0.0,
    usize = 0,
}

impl<K: HandleKind> OutParam for Handle<K> {
    type Raw = *mut c_void;
    const INIT: *mut c_void = ptr::null_mut();

    fn from_raw(raw: *mut c_void) -> Self {
        Handle::from_raw(raw)
    }
}

impl OutParam for NodeType {
    type Raw = FA_NODE_TYPE;
    const INIT: FA_NODE_TYPE = 0;

    fn from_raw(raw: FA_NODE_TYPE) -> Self {
        NodeType::from_raw(raw)
    }
}

impl OutParam for Visibility {
    type Raw = FA_VISIBILITY;
    const INIT: FA_VISIBILITY = 0;

    fn from_raw(raw: FA_VISIBILITY) -> Self {
        Visibility::from_raw(raw)
    }
}

impl OutParam for AccessMode {
    type Raw = FA_ACCESS_MODE;
    const INIT: FA_ACCESS_MODE = 0;

    fn from_raw(raw: FA_ACCESS_MODE) -> Self {
        AccessMode::from_raw(raw)
    }
}

/// Calls a native entry point that only returns a status.
pub fn call<F>(f: F) -> Status
where
    F: FnOnce() -> FA_STATUS,
{
    Status::from_code(f())
}

/// Calls a native entry point with one output parameter.
pub fn call_out1<A, F>(f: F) -> (Status, A)
where
    A: OutParam,
    F: FnOnce(*mut A::Raw) -> FA_STATUS,
{
    let mut a = A::INIT;
    let status = Status::from_code(f(ptr::addr_of_mut!(a)));
    (status, A::from_raw(a))
}

/// Calls a native entry point with two output parameters.
pub fn call_out2<A, B, F>(f: F) -> (Status, A, B)
where
    A: OutParam,
    B: OutParam,
    F: FnOnce(*mut A::Raw, *mut B::Raw) -> FA_STATUS,
{
    let mut a = A::INIT;
    let mut b = B::INIT;
    let status = Status::from_code(f(ptr::addr_of_mut!(a), ptr::addr_of_mut!(b)));
    (status, A::from_raw(a), B::from_raw(b))
}

/// Collapses a `(status, value)` pair into the value when the call succeeded.
///
/// Identical to calling the two-step form and reading the slot after
/// checking the status.
pub fn normalize<T>((status, value): (Status, T)) -> Result<T, Status> {
    if status.is_success() {
        Ok(value)
    } else {
        Err(status)
    }
}

/// Boolean result normalizer for accessors that report through `bool *`.
pub fn call_bool<F>(f: F) -> Result<bool, Status>
where
    F: FnOnce(*mut bool) -> FA_STATUS,
{
    normalize(call_out1::<bool, _>(f))
}
