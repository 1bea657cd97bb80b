//! Sums chunk decode (spec §4.8): windowed aggregation payloads for
//! `SUM_POINTS`.

use bytes::Bytes;

use crate::error::Result;
use crate::protocol::buffer::ReadBuffer;

/// One windowed-sums chunk.
///
/// Mins and maxs are present on the wire but not exposed (Design Notes §9,
/// "sums chunk's mins/maxs" — read and discarded, a future client may
/// expose them).
pub struct SumsChunk {
    pub timestamps: Vec<u64>,
    /// `sums[field_index][point_index]`, in request field order.
    pub sums: Vec<Vec<f64>>,
    /// `counts[field_index][point_index]`: non-null counts per window.
    pub counts: Vec<Vec<u64>>,
}

/// Decode one `DT_SUMS_CHUNK` payload for `nfields` requested fields.
///
/// Layout: `chunk_npoints` timestamps, then per field `chunk_npoints` f64
/// sums, then per field `chunk_npoints` f64 mins (skipped), then per field
/// `chunk_npoints` f64 maxs (skipped), then per field `chunk_npoints` u64
/// non-null counts.
pub fn unpack_sums_chunk(nfields: usize, chunk_npoints: u16, data: Bytes) -> Result<SumsChunk> {
    let n = chunk_npoints as usize;
    let mut r = ReadBuffer::new(data);

    let mut timestamps = Vec::with_capacity(n);
    for _ in 0..n {
        timestamps.push(r.read_u64()?);
    }

    let mut sums = Vec::with_capacity(nfields);
    for _ in 0..nfields {
        let mut v = Vec::with_capacity(n);
        for _ in 0..n {
            v.push(f64::from_bits(r.read_u64()?));
        }
        sums.push(v);
    }

    // mins, skipped.
    for _ in 0..nfields {
        for _ in 0..n {
            r.read_u64()?;
        }
    }

    // maxs, skipped.
    for _ in 0..nfields {
        for _ in 0..n {
            r.read_u64()?;
        }
    }

    let mut counts = Vec::with_capacity(nfields);
    for _ in 0..nfields {
        let mut v = Vec::with_capacity(n);
        for _ in 0..n {
            v.push(r.read_u64()?);
        }
        counts.push(v);
    }

    Ok(SumsChunk {
        timestamps,
        sums,
        counts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_one_field_one_point() {
        let mut data = Vec::new();
        data.extend_from_slice(&42u64.to_le_bytes()); // timestamp
        data.extend_from_slice(&3.5f64.to_bits().to_le_bytes()); // sum
        data.extend_from_slice(&0f64.to_bits().to_le_bytes()); // min (skipped)
        data.extend_from_slice(&0f64.to_bits().to_le_bytes()); // max (skipped)
        data.extend_from_slice(&7u64.to_le_bytes()); // count

        let chunk = unpack_sums_chunk(1, 1, Bytes::from(data)).unwrap();
        assert_eq!(chunk.timestamps, vec![42]);
        assert_eq!(chunk.sums, vec![vec![3.5]]);
        assert_eq!(chunk.counts, vec![vec![7]]);
    }
}
