//! Schema: the ordered, typed field list for a measurement (spec §3).

use crate::error::{Error, Result};

use super::field::{Field, FieldType};

fn ceil_div(n: u64, d: u64) -> u64 {
    (n + d - 1) / d
}

fn round_up(v: u64, k: u64) -> u64 {
    ceil_div(v, k) * k
}

/// An ordered, typed field list. Field order fixes on-wire payload order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    /// Build a schema from fields, in on-wire order.
    ///
    /// Field names must be unique; `time_ns` is reserved and never appears
    /// as a field name.
    pub fn new(fields: Vec<Field>) -> Result<Self> {
        let mut seen = std::collections::HashSet::new();
        for f in &fields {
            if f.name == "time_ns" {
                return Err(Error::protocol("\"time_ns\" is reserved and can't be a field name"));
            }
            if !seen.insert(f.name.as_str()) {
                return Err(Error::protocol(format!("duplicate field name {:?}", f.name)));
            }
        }
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// The `FieldType` of `name`, if it's a field of this schema.
    pub fn get_field_type(&self, name: &str) -> Option<FieldType> {
        self.fields.iter().find(|f| f.name == name).map(|f| f.field_type)
    }

    /// `name/type,name/type,...` — the `DT_TYPED_FIELDS` wire string.
    pub fn typed_fields_str(&self) -> String {
        self.fields
            .iter()
            .map(|f| format!("{}/{}", f.name, f.field_type.name()))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Parse a `DT_TYPED_FIELDS` string back into fields, in request order.
    pub fn parse_typed_fields(s: &str) -> Result<Vec<Field>> {
        if s.is_empty() {
            return Ok(Vec::new());
        }
        s.split(',')
            .map(|entry| {
                let (name, ty) = entry
                    .split_once('/')
                    .ok_or_else(|| Error::protocol(format!("malformed typed field {entry:?}")))?;
                Ok(Field::new(FieldType::from_name(ty)?, name))
            })
            .collect()
    }

    /// Exact packed payload length (timestamps + per-field bitmap/value/pad
    /// blocks) for `N` points (spec §3 invariant).
    pub fn data_len_for_npoints(&self, n: u64) -> u64 {
        let m = self.fields.len() as u64;
        let s: u64 = self
            .fields
            .iter()
            .map(|f| round_up(n * f.field_type.size() as u64, 8))
            .sum();
        8 * n + ceil_div(n, 64) * 8 * m + s
    }

    /// The largest multiple of 64 points that fit in `data_len` bytes
    /// (spec §3 invariant).
    pub fn max_points_for_data_len(&self, data_len: u64) -> u64 {
        let m = self.fields.len() as f64;
        let s: u64 = self.fields.iter().map(|f| f.field_type.size() as u64).sum();
        let n = ((data_len as f64 / (8.0 + s as f64 + m / 8.0)) / 64.0) as u64;
        n * 64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::types::field::FieldType;

    fn schema_one_f64() -> Schema {
        Schema::new(vec![Field::new(FieldType::F64, "value")]).unwrap()
    }

    #[test]
    fn data_len_matches_spec_example() {
        // spec §8 scenario 3: schema [value/f64], N=3 -> data_len = 56.
        let schema = schema_one_f64();
        assert_eq!(schema.data_len_for_npoints(3), 56);
    }

    #[test]
    fn max_points_is_multiple_of_64() {
        let schema = schema_one_f64();
        for data_len in [0u64, 100, 4096, 1_000_000] {
            let n = schema.max_points_for_data_len(data_len);
            assert_eq!(n % 64, 0);
            assert!(schema.data_len_for_npoints(n) <= data_len);
            assert!(schema.data_len_for_npoints(n + 64) > data_len);
        }
    }

    #[test]
    fn typed_fields_round_trip() {
        let schema = Schema::new(vec![
            Field::new(FieldType::F64, "value"),
            Field::new(FieldType::Bool, "flag"),
        ])
        .unwrap();
        let s = schema.typed_fields_str();
        assert_eq!(s, "value/f64,flag/bool");
        let parsed = Schema::parse_typed_fields(&s).unwrap();
        assert_eq!(parsed, schema.fields().to_vec());
    }
}
