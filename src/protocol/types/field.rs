//! Field type catalog (spec §3, the "FieldType" table).

use crate::error::{Error, Result};

/// One of the seven closed, numeric field kinds.
///
/// Variant order matches the on-wire identifier (1..=7); all integers and
/// floats are little-endian and fixed-width on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Bool,
    U32,
    U64,
    F32,
    F64,
    I32,
    I64,
}

impl FieldType {
    /// The stable on-wire identifier.
    pub fn id(self) -> u32 {
        match self {
            FieldType::Bool => 1,
            FieldType::U32 => 2,
            FieldType::U64 => 3,
            FieldType::F32 => 4,
            FieldType::F64 => 5,
            FieldType::I32 => 6,
            FieldType::I64 => 7,
        }
    }

    /// Fixed per-point element size in bytes.
    pub fn size(self) -> usize {
        match self {
            FieldType::Bool => 1,
            FieldType::U32 => 4,
            FieldType::U64 => 8,
            FieldType::F32 => 4,
            FieldType::F64 => 8,
            FieldType::I32 => 4,
            FieldType::I64 => 8,
        }
    }

    /// Name used in `typed_fields_str` (`name/type,...`) and `GET_SCHEMA`.
    pub fn name(self) -> &'static str {
        match self {
            FieldType::Bool => "bool",
            FieldType::U32 => "u32",
            FieldType::U64 => "u64",
            FieldType::F32 => "f32",
            FieldType::F64 => "f64",
            FieldType::I32 => "i32",
            FieldType::I64 => "i64",
        }
    }

    /// Map a wire identifier back to a `FieldType`.
    pub fn from_id(id: u32) -> Result<Self> {
        Ok(match id {
            1 => FieldType::Bool,
            2 => FieldType::U32,
            3 => FieldType::U64,
            4 => FieldType::F32,
            5 => FieldType::F64,
            6 => FieldType::I32,
            7 => FieldType::I64,
            other => return Err(Error::protocol(format!("unknown field type id {other}"))),
        })
    }

    /// Parse the name used in `typed_fields_str`.
    pub fn from_name(name: &str) -> Result<Self> {
        Ok(match name {
            "bool" => FieldType::Bool,
            "u32" => FieldType::U32,
            "u64" => FieldType::U64,
            "f32" => FieldType::F32,
            "f64" => FieldType::F64,
            "i32" => FieldType::I32,
            "i64" => FieldType::I64,
            other => return Err(Error::protocol(format!("unknown field type name {other:?}"))),
        })
    }
}

/// A single column of a [`Schema`](super::schema::Schema): a typed,
/// named slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub field_type: FieldType,
    pub name: String,
}

impl Field {
    pub fn new(field_type: FieldType, name: impl Into<String>) -> Self {
        Self {
            field_type,
            name: name.into(),
        }
    }
}
