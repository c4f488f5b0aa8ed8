// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::error::StatusError;
use core::fmt;
use fai_sys::*;

/// Result code of a native entry point.
///
/// The bridge passes it through unmodified as the first value of every call.
/// It is never turned into an error on the caller's behalf, use
/// [`Status::check`] for that.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Status(FA_STATUS);

/// Closed set of failure kinds the SDK documents.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StatusKind {
    Success,
    InvalidHandle,
    InvalidArgument,
    NotFound,
    AccessDenied,
    NotAvailable,
    OutOfRange,
    BufferTooSmall,
    Timeout,
    Busy,
    Io,
    NotImplemented,
    Unknown,
    /// A code outside the documented set, preserved verbatim.
    Other(FA_STATUS),
}

impl Status {
    pub const SUCCESS: Status = Status(FA_SUCCESS);

    pub const fn from_code(code: FA_STATUS) -> Self {
        Status(code)
    }

    pub const fn code(self) -> FA_STATUS {
        self.0
    }

    pub const fn is_success(self) -> bool {
        self.0 == FA_SUCCESS
    }

    pub fn kind(self) -> StatusKind {
        match self.0 {
            FA_SUCCESS => StatusKind::Success,
            FA_ERR_INVALID_HANDLE => StatusKind::InvalidHandle,
            FA_ERR_INVALID_ARGUMENT => StatusKind::InvalidArgument,
            FA_ERR_NOT_FOUND => StatusKind::NotFound,
            FA_ERR_ACCESS_DENIED => StatusKind::AccessDenied,
            FA_ERR_NOT_AVAILABLE => StatusKind::NotAvailable,
            FA_ERR_OUT_OF_RANGE => StatusKind::OutOfRange,
            FA_ERR_BUFFER_TOO_SMALL => StatusKind::BufferTooSmall,
            FA_ERR_TIMEOUT => StatusKind::Timeout,
            FA_ERR_BUSY => StatusKind::Busy,
            FA_ERR_IO => StatusKind::Io,
            FA_ERR_NOT_IMPLEMENTED => StatusKind::NotImplemented,
            FA_ERR_UNKNOWN => StatusKind::Unknown,
            code => StatusKind::Other(code),
        }
    }

    /// Converts a failure into a [`StatusError`] so callers can use `?`.
    pub fn check(self) -> Result<(), StatusError> {
        if self.is_success() {
            Ok(())
        } else {
            Err(StatusError {
                status: self,
                kind: self.kind(),
            })
        }
    }
}

impl From<FA_STATUS> for Status {
    fn from(code: FA_STATUS) -> Self {
        Status(code)
    }
}

impl fmt::Debug for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Status({:?}, {})", self.kind(), self.0)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind() {
            StatusKind::Other(code) => write!(f, "status {code}"),
            kind => write!(f, "{kind:?}"),
        }
    }
}
