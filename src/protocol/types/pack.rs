//! Packer: encodes a batch of points into a chunk payload (spec §4.5).

use bytes::{BufMut, BytesMut};

use crate::error::{Error, Result};

use super::point::Point;
use super::schema::Schema;

/// Packs points against one schema, bounded by a server-advertised
/// `max_data_len` (spec §4.7 S0's `DT_READY_FOR_CHUNK`).
///
/// The packer must refuse `n > max_points`; the caller (the write state
/// machine) is responsible for splitting a batch across chunks using
/// `max_points`.
pub struct Packer<'s> {
    schema: &'s Schema,
    max_points: u64,
}

impl<'s> Packer<'s> {
    pub fn new(schema: &'s Schema, max_data_len: u32) -> Self {
        Self {
            schema,
            max_points: schema.max_points_for_data_len(max_data_len as u64),
        }
    }

    /// The maximum number of points this packer will accept per call.
    pub fn max_points(&self) -> u64 {
        self.max_points
    }

    /// Pack `points[index..index+n]` into one chunk payload.
    ///
    /// Layout: `N` little-endian `u64` timestamps, then for each schema
    /// field (in schema order) a block of `ceil(N/64)` all-ones `u64`
    /// bitmap words (bit `i` cleared when point `i` is null), the `N`
    /// little-endian values (zero where null), and zero padding up to a
    /// multiple of 8 bytes.
    pub fn pack(&self, points: &[Point], index: usize, n: usize) -> Result<bytes::Bytes> {
        if n as u64 > self.max_points {
            return Err(Error::ChunkTooLarge {
                n,
                max: self.max_points as usize,
            });
        }
        let data_len = self.schema.data_len_for_npoints(n as u64) as usize;
        let mut buf = BytesMut::with_capacity(data_len);

        for p in &points[index..index + n] {
            buf.put_u64_le(p.time_ns);
        }

        for field in self.schema.fields() {
            let words = n.div_ceil(64);
            let mut bitmap = vec![u64::MAX; words];
            let mut values = BytesMut::with_capacity(n * field.field_type.size());

            for (i, p) in points[index..index + n].iter().enumerate() {
                match p.get(&field.name) {
                    Some(v) => write_value(&mut values, v),
                    None => {
                        bitmap[i / 64] &= !(1u64 << (i % 64));
                        write_zero(&mut values, field.field_type);
                    }
                }
            }

            for word in bitmap {
                buf.put_u64_le(word);
            }
            buf.extend_from_slice(&values);

            let nbytes = n * field.field_type.size();
            let pad = (8 - nbytes % 8) % 8;
            buf.put_bytes(0, pad);
        }

        Ok(buf.freeze())
    }
}

fn write_value(buf: &mut BytesMut, v: super::point::Value) {
    use super::point::Value::*;
    match v {
        Bool(b) => buf.put_u8(b as u8),
        U32(x) => buf.put_u32_le(x),
        U64(x) => buf.put_u64_le(x),
        F32(x) => buf.put_f32_le(x),
        F64(x) => buf.put_f64_le(x),
        I32(x) => buf.put_i32_le(x),
        I64(x) => buf.put_i64_le(x),
    }
}

fn write_zero(buf: &mut BytesMut, ty: super::field::FieldType) {
    buf.put_bytes(0, ty.size());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::types::field::{Field, FieldType};
    use crate::protocol::types::point::Value;

    #[test]
    fn matches_spec_three_point_example() {
        // spec §8 scenario 3: schema [value/f64], timestamps [1,2,3],
        // values [1.5, null, 3.5] -> bitmap 0xFFFFFFFFFFFFFFFD.
        let schema = Schema::new(vec![Field::new(FieldType::F64, "value")]).unwrap();
        let points = vec![
            Point::new(1).with_field("value", Value::F64(1.5)),
            Point::new(2).with_null("value"),
            Point::new(3).with_field("value", Value::F64(3.5)),
        ];
        let packer = Packer::new(&schema, 4096);
        let payload = packer.pack(&points, 0, 3).unwrap();
        assert_eq!(payload.len(), 56);

        let mut ts = [0u8; 24];
        ts.copy_from_slice(&payload[0..24]);
        assert_eq!(u64::from_le_bytes(payload[0..8].try_into().unwrap()), 1);
        assert_eq!(u64::from_le_bytes(payload[8..16].try_into().unwrap()), 2);
        assert_eq!(u64::from_le_bytes(payload[16..24].try_into().unwrap()), 3);

        let bitmap = u64::from_le_bytes(payload[24..32].try_into().unwrap());
        assert_eq!(bitmap, 0xFFFF_FFFF_FFFF_FFFD);
    }

    #[test]
    fn refuses_over_max() {
        let schema = Schema::new(vec![Field::new(FieldType::U64, "x")]).unwrap();
        let packer = Packer::new(&schema, 64); // tiny max_data_len -> max_points 0
        let points = vec![Point::new(0).with_field("x", Value::U64(1))];
        assert!(matches!(
            packer.pack(&points, 0, 1),
            Err(Error::ChunkTooLarge { .. })
        ));
    }
}
