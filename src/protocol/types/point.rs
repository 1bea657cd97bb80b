//! The typed per-point value model (spec §3 "Point", Design Notes §9
//! "Dynamic per-point field values").
//!
//! Points are modeled as a mapping from field name to a tagged scalar union
//! rather than a generated per-schema struct, since a single `Point` value
//! must flow through code (the PushQueue, the packer) that is schema-generic.

use std::collections::BTreeMap;

use super::field::FieldType;

/// One field's value, tagged by its `FieldType`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Bool(bool),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    I32(i32),
    I64(i64),
}

impl Value {
    /// The `FieldType` this value was tagged with.
    pub fn field_type(&self) -> FieldType {
        match self {
            Value::Bool(_) => FieldType::Bool,
            Value::U32(_) => FieldType::U32,
            Value::U64(_) => FieldType::U64,
            Value::F32(_) => FieldType::F32,
            Value::F64(_) => FieldType::F64,
            Value::I32(_) => FieldType::I32,
            Value::I64(_) => FieldType::I64,
        }
    }
}

/// A single point: a reserved `time_ns` timestamp plus a value (or null) for
/// every field of the schema it's destined for.
///
/// Field order isn't part of `Point` itself — the schema fixes it at pack
/// time — so a `BTreeMap` is used purely for deterministic iteration in
/// tests and `Debug` output.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Point {
    pub time_ns: u64,
    pub fields: BTreeMap<String, Option<Value>>,
}

impl Point {
    pub fn new(time_ns: u64) -> Self {
        Self {
            time_ns,
            fields: BTreeMap::new(),
        }
    }

    /// Set a field to a non-null value, builder-style.
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), Some(value));
        self
    }

    /// Set a field to null, builder-style.
    pub fn with_null(mut self, name: impl Into<String>) -> Self {
        self.fields.insert(name.into(), None);
        self
    }

    /// Value for `name`, or `None` if the field is absent or null.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.fields.get(name).copied().flatten()
    }
}
