// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::status::{Status, StatusKind};

/// Errors raised while moving a value across the boundary.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MarshalError {
    /// Host value variant cannot represent the requested native type.
    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        expected: &'static str,
        got: &'static str,
    },

    /// Host number does not fit the native type.
    #[error("{value} out of range for {target}")]
    NumberOutOfRange { value: i64, target: &'static str },

    /// Host string cannot be passed as a C string.
    #[error("invalid string: {0}")]
    InvalidString(String),

    /// A value handed to the bridge broke a memory-safety precondition.
    #[error("marshaling precondition violated: {0}")]
    Precondition(&'static str),
}

/// A non-success native status turned into an error with [`Status::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("native call failed with {kind:?} ({})", .status.code())]
pub struct StatusError {
    pub status: Status,
    pub kind: StatusKind,
}

/// Failures of the bridge itself, as opposed to native status codes.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("failed to load FA SDK library: {0}")]
    Library(#[from] libloading::Error),

    #[error("no free {family} trampoline ({capacity} registrations live)")]
    TrampolinesExhausted {
        family: &'static str,
        capacity: usize,
    },

    #[error(transparent)]
    Marshal(#[from] MarshalError),

    #[error(transparent)]
    Status(#[from] StatusError),
}
