//! Unpacker: decodes a received chunk payload into typed field views
//! (spec §4.6).

use bytes::Bytes;

use crate::error::Result;
use crate::protocol::buffer::ReadBuffer;

use super::field::FieldType;
use super::point::Value;
use super::schema::Schema;

fn ceil_div(n: u64, d: u64) -> u64 {
    (n + d - 1) / d
}

/// One field's worth of decoded values from an inbound chunk: a bitmap
/// (offset-aware) plus the raw little-endian value bytes.
pub struct FieldView {
    bitmap_offset: u32,
    bitmap: Vec<u64>,
    values: Bytes,
    field_type: FieldType,
    len: usize,
}

impl FieldView {
    /// Number of points in this view.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn bit(&self, i: usize) -> bool {
        let idx = self.bitmap_offset as usize + i;
        let word = self.bitmap[idx / 64];
        (word >> (idx % 64)) & 1 != 0
    }

    /// The value at point `i`, or `None` if it was null. Panics if `i` is
    /// out of range, matching the fixed-length nature of a chunk.
    pub fn get(&self, i: usize) -> Option<Value> {
        assert!(i < self.len, "field view index {i} out of range ({})", self.len);
        if !self.bit(i) {
            return None;
        }
        let size = self.field_type.size();
        let start = i * size;
        let bytes = &self.values[start..start + size];
        Some(match self.field_type {
            FieldType::Bool => Value::Bool(bytes[0] != 0),
            FieldType::U32 => Value::U32(u32::from_le_bytes(bytes.try_into().unwrap())),
            FieldType::U64 => Value::U64(u64::from_le_bytes(bytes.try_into().unwrap())),
            FieldType::F32 => Value::F32(f32::from_le_bytes(bytes.try_into().unwrap())),
            FieldType::F64 => Value::F64(f64::from_le_bytes(bytes.try_into().unwrap())),
            FieldType::I32 => Value::I32(i32::from_le_bytes(bytes.try_into().unwrap())),
            FieldType::I64 => Value::I64(i64::from_le_bytes(bytes.try_into().unwrap())),
        })
    }
}

/// A decoded chunk: timestamps plus one `FieldView` per requested field, in
/// request order (spec §4.6).
pub struct Chunk {
    pub npoints: usize,
    pub timestamps: Vec<u64>,
    pub fields: Vec<(String, FieldView)>,
}

impl Chunk {
    /// Value of `name` at point `i`.
    pub fn get(&self, name: &str, i: usize) -> Option<Value> {
        self.fields.iter().find(|(n, _)| n == name)?.1.get(i)
    }
}

/// Decode one chunk payload.
///
/// `requested` is the field list from the request, in request order, each
/// resolved against `schema` to find its `FieldType`. Only these fields are
/// present in the payload (spec §3 "Chunk (inbound)").
pub fn unpack_chunk(
    schema: &Schema,
    requested: &[String],
    npoints: u32,
    bitmap_offset: u32,
    data: Bytes,
) -> Result<Chunk> {
    let n = npoints as usize;
    let mut r = ReadBuffer::new(data);

    let mut timestamps = Vec::with_capacity(n);
    for _ in 0..n {
        timestamps.push(r.read_u64()?);
    }

    let mut fields = Vec::with_capacity(requested.len());
    for name in requested {
        let field_type = schema.get_field_type(name).ok_or_else(|| {
            crate::error::Error::protocol(format!("unpack: no such field {name:?} in schema"))
        })?;

        let bitmap_words = ceil_div(bitmap_offset as u64 + n as u64, 64) as usize;
        let mut bitmap = Vec::with_capacity(bitmap_words);
        for _ in 0..bitmap_words {
            bitmap.push(r.read_u64()?);
        }

        let value_bytes = n * field_type.size();
        let values = r.read_bytes(value_bytes)?;

        let pad = (8 - value_bytes % 8) % 8;
        if pad > 0 {
            r.read_bytes(pad)?;
        }

        fields.push((
            name.clone(),
            FieldView {
                bitmap_offset,
                bitmap,
                values,
                field_type,
                len: n,
            },
        ));
    }

    Ok(Chunk {
        npoints: n,
        timestamps,
        fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::types::field::Field;
    use crate::protocol::types::pack::Packer;
    use crate::protocol::types::point::Point;

    #[test]
    fn round_trips_pack_and_unpack() {
        let schema = Schema::new(vec![Field::new(FieldType::F64, "value")]).unwrap();
        let points = vec![
            Point::new(1).with_field("value", Value::F64(1.5)),
            Point::new(2).with_null("value"),
            Point::new(3).with_field("value", Value::F64(3.5)),
        ];
        let packer = Packer::new(&schema, 4096);
        let payload = packer.pack(&points, 0, 3).unwrap();

        let requested = vec!["value".to_string()];
        let chunk = unpack_chunk(&schema, &requested, 3, 0, payload).unwrap();

        assert_eq!(chunk.timestamps, vec![1, 2, 3]);
        assert_eq!(chunk.get("value", 0), Some(Value::F64(1.5)));
        assert_eq!(chunk.get("value", 1), None);
        assert_eq!(chunk.get("value", 2), Some(Value::F64(3.5)));
    }

    #[test]
    fn honors_nonzero_bitmap_offset() {
        // A bitmap_offset of 3 means point 0 lives at bit 3 of the first word.
        let schema = Schema::new(vec![Field::new(FieldType::Bool, "flag")]).unwrap();
        // one word, bits 3 and 4 set (points 0 and 1 non-null), bit 5 clear.
        let bitmap_word: u64 = (1 << 3) | (1 << 4);
        let mut data = Vec::new();
        for ts in [10u64, 20, 30] {
            data.extend_from_slice(&ts.to_le_bytes());
        }
        data.extend_from_slice(&bitmap_word.to_le_bytes());
        data.extend_from_slice(&[1u8, 1u8, 0u8]); // 3 bool values
        data.extend_from_slice(&[0u8; 5]); // pad to multiple of 8

        let requested = vec!["flag".to_string()];
        let chunk = unpack_chunk(&schema, &requested, 3, 3, Bytes::from(data)).unwrap();
        assert_eq!(chunk.get("flag", 0), Some(Value::Bool(true)));
        assert_eq!(chunk.get("flag", 1), Some(Value::Bool(true)));
        assert_eq!(chunk.get("flag", 2), None);
    }
}
