// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::host::{HostValue, ToHost};
use fai_sys::*;
use serde_json::{json, Value};

macro_rules! native_enum {
    ($(#[$doc:meta])* $name:ident : $raw:ty { $($variant:ident = $value:path,)* }) => {
        $(#[$doc])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)*
            /// A value outside the documented set, kept verbatim.
            Unknown($raw),
        }

        impl $name {
            pub fn from_raw(raw: $raw) -> Self {
                match raw {
                    $($value => $name::$variant,)*
                    other => $name::Unknown(other),
                }
            }

            pub fn as_raw(self) -> $raw {
                match self {
                    $($name::$variant => $value,)*
                    $name::Unknown(other) => other,
                }
            }
        }

        impl ToHost for $name {
            fn to_host(self) -> HostValue {
                HostValue::Int(self.as_raw() as i64)
            }
        }
    };
}

native_enum! {
    /// GenApi interface type of a node.
    NodeType: FA_NODE_TYPE {
        Value = FA_NODE_TYPE_VALUE,
        Base = FA_NODE_TYPE_BASE,
        Integer = FA_NODE_TYPE_INTEGER,
        Boolean = FA_NODE_TYPE_BOOLEAN,
        Command = FA_NODE_TYPE_COMMAND,
        Float = FA_NODE_TYPE_FLOAT,
        String = FA_NODE_TYPE_STRING,
        Register = FA_NODE_TYPE_REGISTER,
        Category = FA_NODE_TYPE_CATEGORY,
        Enumeration = FA_NODE_TYPE_ENUMERATION,
        EnumEntry = FA_NODE_TYPE_ENUM_ENTRY,
        Port = FA_NODE_TYPE_PORT,
    }
}

native_enum! {
    /// Recommended visibility of a node in a user interface.
    Visibility: FA_VISIBILITY {
        Beginner = FA_VISIBILITY_BEGINNER,
        Expert = FA_VISIBILITY_EXPERT,
        Guru = FA_VISIBILITY_GURU,
        Invisible = FA_VISIBILITY_INVISIBLE,
    }
}

native_enum! {
    AccessMode: FA_ACCESS_MODE {
        NotImplemented = FA_ACCESS_NI,
        NotAvailable = FA_ACCESS_NA,
        WriteOnly = FA_ACCESS_WO,
        ReadOnly = FA_ACCESS_RO,
        ReadWrite = FA_ACCESS_RW,
    }
}

/// One entry produced by walking the category tree.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeInfo {
    pub name: String,
    pub node_type: NodeType,
    pub visibility: Visibility,
    pub access: AccessMode,
    /// Nesting depth below the root category.
    pub depth: usize,
    /// Value rendered by the SDK, `None` for unreadable nodes and categories.
    pub value: Option<String>,
}

impl NodeInfo {
    pub fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "type": format!("{:?}", self.node_type),
            "visibility": format!("{:?}", self.visibility),
            "access": format!("{:?}", self.access),
            "depth": self.depth,
            "value": self.value,
        })
    }
}
