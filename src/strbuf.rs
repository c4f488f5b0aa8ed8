// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Bounded string buffer adapter.
//!
//! Text-filling entry points receive a caller-owned buffer and its capacity
//! through `(char *buf, size_t *len)`. After the call the buffer is converted
//! into an owned `String`, reading no further than the reported length, the
//! first NUL, or the buffer capacity, whichever comes first.

use crate::status::Status;
use fai_sys::{c_char, size_t, FA_STATUS};
use std::ptr;
use tracing::trace;

/// Capacity, in bytes, of the buffers handed to text-filling entry points.
pub const STRING_CAPACITY: usize = 256;

pub struct StringBuffer<const N: usize = STRING_CAPACITY> {
    buf: [c_char; N],
}

impl<const N: usize> StringBuffer<N> {
    pub const fn new() -> Self {
        Self { buf: [0; N] }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn as_mut_ptr(&mut self) -> *mut c_char {
        self.buf.as_mut_ptr()
    }

    /// Bytes up to the first NUL within `min(reported, N)`.
    pub fn as_bytes(&self, reported: usize) -> &[u8] {
        let limit = reported.min(N);
        // SAFETY: c_char and u8 have the same size and alignment and the
        // slice stays within the array.
        let bytes = unsafe { std::slice::from_raw_parts(self.buf.as_ptr().cast::<u8>(), limit) };
        match bytes.iter().position(|&b| b == 0) {
            Some(end) => &bytes[..end],
            None => bytes,
        }
    }

    pub fn to_string_lossy(&self, reported: usize) -> String {
        String::from_utf8_lossy(self.as_bytes(reported)).into_owned()
    }
}

impl<const N: usize> Default for StringBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Calls a text-filling entry point with a fresh [`STRING_CAPACITY`] buffer.
///
/// The native status is returned unchanged. On truncation the string holds
/// exactly the prefix the native call terminated.
pub fn call_string<F>(f: F) -> (Status, String)
where
    F: FnOnce(*mut c_char, *mut size_t) -> FA_STATUS,
{
    call_string_with::<STRING_CAPACITY, F>(f)
}

pub fn call_string_with<const N: usize, F>(f: F) -> (Status, String)
where
    F: FnOnce(*mut c_char, *mut size_t) -> FA_STATUS,
{
    let mut buffer = StringBuffer::<N>::new();
    let mut len: size_t = N;
    let status = Status::from_code(f(buffer.as_mut_ptr(), ptr::addr_of_mut!(len)));
    if len > N {
        trace!(reported = len, capacity = N, %status, "native text truncated");
    }
    (status, buffer.to_string_lossy(len))
}
