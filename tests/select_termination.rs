//! Select-stream termination exactness (spec §4.6, §4.8): the iterator stops
//! exactly on `DT_END` followed by a zero `DT_STATUS_CODE`, and any other
//! token sequence is a `ProtocolError`.

mod common;

use std::io::Write;

use tsdb_thin_rs::protocol::commands;
use tsdb_thin_rs::protocol::constants::*;
use tsdb_thin_rs::{Client, ClientConfig, Error, Field, FieldType, Schema};

use common::{expect_request, write_status, MockServer};

fn one_field_schema() -> Schema {
    Schema::new(vec![Field::new(FieldType::F64, "value")]).unwrap()
}

#[test]
fn stops_on_end_and_zero_status() {
    let server = MockServer::spawn(|mut stream| {
        let fields = vec!["value".to_string()];
        expect_request(
            &mut stream,
            &commands::select_points_limit("db", "meas", "s1", &fields, 0, u64::MAX, u64::MAX),
        );

        // One chunk of a single point, then a clean end.
        stream.write_all(&DT_CHUNK.to_le_bytes()).unwrap();
        stream.write_all(&1u32.to_le_bytes()).unwrap(); // npoints
        stream.write_all(&0u32.to_le_bytes()).unwrap(); // bitmap_offset
        let mut payload = Vec::new();
        payload.extend_from_slice(&7u64.to_le_bytes()); // timestamp
        payload.extend_from_slice(&1u64.to_le_bytes()); // bitmap word, bit 0 set
        payload.extend_from_slice(&1.5f64.to_le_bytes()); // value
        stream
            .write_all(&(payload.len() as u32).to_le_bytes())
            .unwrap();
        stream.write_all(&payload).unwrap();

        stream.write_all(&DT_END.to_le_bytes()).unwrap();
        write_status(&mut stream, 0);
    });

    let mut client = Client::new(ClientConfig::new("127.0.0.1", server.port));
    let schema = one_field_schema();
    let fields = vec!["value".to_string()];
    let chunks: Vec<_> = client
        .select_points("db", "meas", "s1", &schema, &fields, None, None, None)
        .unwrap()
        .collect();

    assert_eq!(chunks.len(), 1);
    let chunk = chunks.into_iter().next().unwrap().unwrap();
    assert_eq!(chunk.npoints, 1);
    assert_eq!(chunk.timestamps[0], 7);

    server.join();
}

#[test]
fn raises_protocol_error_on_unexpected_token_after_end() {
    let server = MockServer::spawn(|mut stream| {
        let fields = vec!["value".to_string()];
        expect_request(
            &mut stream,
            &commands::select_points_limit("db", "meas", "s1", &fields, 0, u64::MAX, u64::MAX),
        );

        stream.write_all(&DT_END.to_le_bytes()).unwrap();
        // Wrong: something other than DT_STATUS_CODE after DT_END.
        stream.write_all(&0xDEAD_BEEFu32.to_le_bytes()).unwrap();
    });

    let mut client = Client::new(ClientConfig::new("127.0.0.1", server.port));
    let schema = one_field_schema();
    let fields = vec!["value".to_string()];
    let mut stream = client
        .select_points("db", "meas", "s1", &schema, &fields, None, None, None)
        .unwrap();

    let err = stream.next().unwrap().unwrap_err();
    assert!(matches!(err, Error::Protocol(_)));

    server.join();
}
