// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Host-side value model.
//!
//! The host sees dynamically typed values. Every bridge result can be
//! lowered into a [`HostValue`] with [`ToHost`]; tuples become
//! [`HostValue::Tuple`] with the status first and output parameters after
//! it in native parameter order.

use crate::{error::MarshalError, status::Status};
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use serde_json::{json, Value};
use std::ffi::CString;

#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    None,
    Bool(bool),
    Int(i64),
    /// Unsigned integers: handles, sizes and counts.
    UInt(u64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Tuple(Vec<HostValue>),
}

impl HostValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            HostValue::None => "none",
            HostValue::Bool(_) => "bool",
            HostValue::Int(_) => "int",
            HostValue::UInt(_) => "uint",
            HostValue::Float(_) => "float",
            HostValue::Str(_) => "str",
            HostValue::Bytes(_) => "bytes",
            HostValue::Tuple(_) => "tuple",
        }
    }

    /// C string for a name or value argument.
    pub fn to_cstring(&self) -> Result<CString, MarshalError> {
        match self {
            HostValue::Str(s) => {
                CString::new(s.as_str()).map_err(|err| MarshalError::InvalidString(err.to_string()))
            }
            other => Err(MarshalError::TypeMismatch {
                expected: "str",
                got: other.type_name(),
            }),
        }
    }

    /// JSON rendering used by diagnostics. Byte payloads are summarised by
    /// length rather than dumped.
    pub fn to_json(&self) -> Value {
        match self {
            HostValue::None => Value::Null,
            HostValue::Bool(b) => json!(b),
            HostValue::Int(i) => json!(i),
            HostValue::UInt(u) => json!(u),
            HostValue::Float(f) => json!(f),
            HostValue::Str(s) => json!(s),
            HostValue::Bytes(b) => json!({ "bytes": b.len() }),
            HostValue::Tuple(items) => Value::Array(items.iter().map(HostValue::to_json).collect()),
        }
    }
}

/// Conversion of a bridge result into the host representation.
pub trait ToHost {
    fn to_host(self) -> HostValue;
}

impl ToHost for HostValue {
    fn to_host(self) -> HostValue {
        self
    }
}

impl ToHost for Status {
    fn to_host(self) -> HostValue {
        HostValue::Int(self.code() as i64)
    }
}

impl ToHost for bool {
    fn to_host(self) -> HostValue {
        HostValue::Bool(self)
    }
}

impl ToHost for i64 {
    fn to_host(self) -> HostValue {
        HostValue::Int(self)
    }
}

impl ToHost for usize {
    fn to_host(self) -> HostValue {
        HostValue::UInt(self as u64)
    }
}

impl ToHost for f64 {
    fn to_host(self) -> HostValue {
        HostValue::Float(self)
    }
}

impl ToHost for String {
    fn to_host(self) -> HostValue {
        HostValue::Str(self)
    }
}

impl ToHost for Vec<u8> {
    fn to_host(self) -> HostValue {
        HostValue::Bytes(self)
    }
}

impl<T: ToHost> ToHost for Option<T> {
    fn to_host(self) -> HostValue {
        match self {
            Some(v) => v.to_host(),
            None => HostValue::None,
        }
    }
}

impl<A: ToHost, B: ToHost> ToHost for (A, B) {
    fn to_host(self) -> HostValue {
        HostValue::Tuple(vec![self.0.to_host(), self.1.to_host()])
    }
}

impl<A: ToHost, B: ToHost, C: ToHost> ToHost for (A, B, C) {
    fn to_host(self) -> HostValue {
        HostValue::Tuple(vec![self.0.to_host(), self.1.to_host(), self.2.to_host()])
    }
}

/// Process-wide lock the host runtime requires before running host code.
///
/// Trampolines hold it for the duration of a host callable. It is
/// reentrant: a host callable that causes a nested event on the same thread
/// re-enters without deadlocking.
pub struct HostLock(ReentrantMutex<()>);

pub struct HostGuard<'a> {
    _guard: ReentrantMutexGuard<'a, ()>,
}

static HOST_LOCK: HostLock = HostLock(parking_lot::const_reentrant_mutex(()));

impl HostLock {
    pub fn global() -> &'static HostLock {
        &HOST_LOCK
    }

    pub fn acquire(&self) -> HostGuard<'_> {
        HostGuard {
            _guard: self.0.lock(),
        }
    }

    pub fn try_acquire(&self) -> Option<HostGuard<'_>> {
        self.0.try_lock().map(|guard| HostGuard { _guard: guard })
    }
}
