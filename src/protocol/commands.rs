//! Command encoders (spec §4.4): one function per command, building the
//! request body. Response handling lives in `Connection`, since it needs
//! the transport.

use bytes::Bytes;

use super::buffer::WriteBuffer;
use super::constants::*;
use super::types::Schema;

pub fn authenticate(username: &str, password: &str) -> Bytes {
    let mut w = WriteBuffer::new().write_command(CT_AUTHENTICATE);
    w.write_framed_field(DT_USERNAME, username);
    w.write_framed_field(DT_PASSWORD, password);
    w.finish()
}

pub fn create_database(database: &str) -> Bytes {
    let mut w = WriteBuffer::new().write_command(CT_CREATE_DATABASE);
    w.write_framed_field(DT_DATABASE, database);
    w.finish()
}

pub fn create_measurement(database: &str, measurement: &str, schema: &Schema) -> Bytes {
    let mut w = WriteBuffer::new().write_command(CT_CREATE_MEASUREMENT);
    w.write_framed_field(DT_DATABASE, database);
    w.write_framed_field(DT_MEASUREMENT, measurement);
    w.write_framed_field(DT_TYPED_FIELDS, &schema.typed_fields_str());
    w.finish()
}

pub fn list_databases() -> Bytes {
    WriteBuffer::new().write_command(CT_LIST_DATABASES).finish()
}

pub fn list_measurements(database: &str) -> Bytes {
    let mut w = WriteBuffer::new().write_command(CT_LIST_MEASUREMENTS);
    w.write_framed_field(DT_DATABASE, database);
    w.finish()
}

pub fn list_series(database: &str, measurement: &str) -> Bytes {
    let mut w = WriteBuffer::new().write_command(CT_LIST_SERIES);
    w.write_framed_field(DT_DATABASE, database);
    w.write_framed_field(DT_MEASUREMENT, measurement);
    w.finish()
}

pub fn active_series(database: &str, measurement: &str, t0: u64, t1: u64) -> Bytes {
    let mut w = WriteBuffer::new().write_command(CT_ACTIVE_SERIES);
    w.write_framed_field(DT_DATABASE, database);
    w.write_framed_field(DT_MEASUREMENT, measurement);
    w.write_token(DT_TIME_FIRST);
    w.write_u64(t0);
    w.write_token(DT_TIME_LAST);
    w.write_u64(t1);
    w.finish()
}

pub fn get_schema(database: &str, measurement: &str) -> Bytes {
    let mut w = WriteBuffer::new().write_command(CT_GET_SCHEMA);
    w.write_framed_field(DT_DATABASE, database);
    w.write_framed_field(DT_MEASUREMENT, measurement);
    w.finish()
}

/// `WRITE_POINTS`'s opening frame: no `DT_END`, spec §4.7 S0.
pub fn write_points_open(database: &str, measurement: &str, series: &str) -> Bytes {
    let mut w = WriteBuffer::new().write_command(CT_WRITE_POINTS);
    w.write_framed_field(DT_DATABASE, database);
    w.write_framed_field(DT_MEASUREMENT, measurement);
    w.write_framed_field(DT_SERIES, series);
    w.finish_unterminated()
}

pub fn write_points_chunk(npoints: u32, bitmap_offset: u32, payload: &[u8]) -> Bytes {
    let mut w = WriteBuffer::new();
    w.write_token(DT_CHUNK);
    w.write_u32(npoints);
    w.write_u32(bitmap_offset);
    w.write_u32(payload.len() as u32);
    w.write_bytes(payload);
    w.finish_unterminated()
}

pub fn write_points_end() -> Bytes {
    let mut w = WriteBuffer::new();
    w.write_token(DT_END);
    w.finish_unterminated()
}

pub fn delete_points(database: &str, measurement: &str, series: &str, t1: u64) -> Bytes {
    let mut w = WriteBuffer::new().write_command(CT_DELETE_POINTS);
    w.write_framed_field(DT_DATABASE, database);
    w.write_framed_field(DT_MEASUREMENT, measurement);
    w.write_framed_field(DT_SERIES, series);
    w.write_token(DT_TIME_LAST);
    w.write_u64(t1);
    w.finish()
}

fn select_body(
    cmd: u32,
    database: &str,
    measurement: &str,
    series: &str,
    fields: &[String],
    t0: u64,
    t1: u64,
    n_token: u32,
    n: u64,
) -> Bytes {
    let mut w = WriteBuffer::new().write_command(cmd);
    w.write_framed_field(DT_DATABASE, database);
    w.write_framed_field(DT_MEASUREMENT, measurement);
    w.write_framed_field(DT_SERIES, series);
    w.write_framed_field(DT_FIELD_LIST, &fields.join(","));
    w.write_token(DT_TIME_FIRST);
    w.write_u64(t0);
    w.write_token(DT_TIME_LAST);
    w.write_u64(t1);
    w.write_token(n_token);
    w.write_u64(n);
    w.finish()
}

pub fn select_points_limit(
    database: &str,
    measurement: &str,
    series: &str,
    fields: &[String],
    t0: u64,
    t1: u64,
    limit: u64,
) -> Bytes {
    select_body(
        CT_SELECT_POINTS_LIMIT,
        database,
        measurement,
        series,
        fields,
        t0,
        t1,
        DT_NLIMIT,
        limit,
    )
}

pub fn select_points_last(
    database: &str,
    measurement: &str,
    series: &str,
    fields: &[String],
    t0: u64,
    t1: u64,
    last: u64,
) -> Bytes {
    select_body(
        CT_SELECT_POINTS_LAST,
        database,
        measurement,
        series,
        fields,
        t0,
        t1,
        DT_NLAST,
        last,
    )
}

pub fn count_points(database: &str, measurement: &str, series: &str, t0: u64, t1: u64) -> Bytes {
    let mut w = WriteBuffer::new().write_command(CT_COUNT_POINTS);
    w.write_framed_field(DT_DATABASE, database);
    w.write_framed_field(DT_MEASUREMENT, measurement);
    w.write_framed_field(DT_SERIES, series);
    w.write_token(DT_TIME_FIRST);
    w.write_u64(t0);
    w.write_token(DT_TIME_LAST);
    w.write_u64(t1);
    w.finish()
}

#[allow(clippy::too_many_arguments)]
pub fn sum_points(
    database: &str,
    measurement: &str,
    series: &str,
    fields: &[String],
    t0: u64,
    t1: u64,
    window_ns: u64,
) -> Bytes {
    let mut w = WriteBuffer::new().write_command(CT_SUM_POINTS);
    w.write_framed_field(DT_DATABASE, database);
    w.write_framed_field(DT_MEASUREMENT, measurement);
    w.write_framed_field(DT_SERIES, series);
    w.write_framed_field(DT_FIELD_LIST, &fields.join(","));
    w.write_token(DT_TIME_FIRST);
    w.write_u64(t0);
    w.write_token(DT_TIME_LAST);
    w.write_u64(t1);
    w.write_token(DT_WINDOW_NS);
    w.write_u64(window_ns);
    w.finish()
}

pub fn nop() -> Bytes {
    WriteBuffer::new().write_command(CT_NOP).finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_database_matches_golden_vector() {
        // spec §8 scenario 2.
        let mut expected = Vec::new();
        expected.extend_from_slice(&CT_CREATE_DATABASE.to_le_bytes());
        expected.extend_from_slice(&DT_DATABASE.to_le_bytes());
        expected.extend_from_slice(&2u16.to_le_bytes());
        expected.extend_from_slice(b"db");
        expected.extend_from_slice(&DT_END.to_le_bytes());

        assert_eq!(create_database("db").to_vec(), expected);
    }

    #[test]
    fn list_databases_matches_golden_vector() {
        // spec §8 scenario 1.
        let mut expected = Vec::new();
        expected.extend_from_slice(&CT_LIST_DATABASES.to_le_bytes());
        expected.extend_from_slice(&DT_END.to_le_bytes());
        assert_eq!(list_databases().to_vec(), expected);
    }
}
