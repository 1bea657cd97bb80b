//! The literal end-to-end scenarios and failure-handling properties from
//! spec §8, driven against a loopback mock server.

mod common;

use std::io::Write;
use std::net::TcpStream;

use tsdb_thin_rs::protocol::commands;
use tsdb_thin_rs::protocol::constants::*;
use tsdb_thin_rs::{Client, ClientConfig, Error, Field, FieldType, Point, Schema, Value};

use common::{expect_request, read_n, read_token, write_status, MockServer};

fn client_for(server: &MockServer) -> Client {
    Client::new(ClientConfig::new("127.0.0.1", server.port))
}

#[test]
fn scenario_1_empty_list_databases() {
    let server = MockServer::spawn(|mut stream| {
        expect_request(&mut stream, &commands::list_databases());
        write_status(&mut stream, 0);
    });

    let mut client = client_for(&server);
    let databases = client.list_databases().unwrap();
    assert!(databases.is_empty());

    server.join();
}

#[test]
fn scenario_2_create_database() {
    let server = MockServer::spawn(|mut stream| {
        expect_request(&mut stream, &commands::create_database("db"));
        write_status(&mut stream, 0);
    });

    let mut client = client_for(&server);
    client.create_database("db").unwrap();

    server.join();
}

#[test]
fn scenario_3_write_three_points() {
    let server = MockServer::spawn(|mut stream| {
        expect_request(
            &mut stream,
            &commands::write_points_open("db", "meas", "s1"),
        );
        stream.write_all(&DT_READY_FOR_CHUNK.to_le_bytes()).unwrap();
        stream.write_all(&4096u32.to_le_bytes()).unwrap();

        assert_eq!(read_token(&mut stream), DT_CHUNK);
        let npoints = u32::from_le_bytes(read_n(&mut stream, 4).try_into().unwrap());
        assert_eq!(npoints, 3);
        let bitmap_offset = u32::from_le_bytes(read_n(&mut stream, 4).try_into().unwrap());
        assert_eq!(bitmap_offset, 0);
        let data_len = u32::from_le_bytes(read_n(&mut stream, 4).try_into().unwrap());
        assert_eq!(data_len, 56);
        let payload = read_n(&mut stream, data_len as usize);
        let bitmap = u64::from_le_bytes(payload[24..32].try_into().unwrap());
        assert_eq!(bitmap, 0xFFFF_FFFF_FFFF_FFFD);

        assert_eq!(read_token(&mut stream), DT_END);
        write_status(&mut stream, 0);
    });

    let mut client = client_for(&server);
    let schema = Schema::new(vec![Field::new(FieldType::F64, "value")]).unwrap();
    let points = vec![
        Point::new(1).with_field("value", Value::F64(1.5)),
        Point::new(2).with_null("value"),
        Point::new(3).with_field("value", Value::F64(3.5)),
    ];
    client
        .write_points("db", "meas", "s1", &schema, &points)
        .unwrap();

    server.join();
}

#[test]
fn scenario_4_count_on_empty_range() {
    let server = MockServer::spawn(|mut stream| {
        expect_request(
            &mut stream,
            &commands::count_points("db", "meas", "s1", 0, u64::MAX),
        );
        stream.write_all(&DT_TIME_FIRST.to_le_bytes()).unwrap();
        stream.write_all(&0u64.to_le_bytes()).unwrap();
        stream.write_all(&DT_TIME_LAST.to_le_bytes()).unwrap();
        stream.write_all(&0u64.to_le_bytes()).unwrap();
        stream.write_all(&DT_NPOINTS.to_le_bytes()).unwrap();
        stream.write_all(&0u64.to_le_bytes()).unwrap();
        write_status(&mut stream, 0);
    });

    let mut client = client_for(&server);
    let result = client
        .count_points("db", "meas", "s1", None, None)
        .unwrap();
    assert_eq!(result.npoints, 0);

    server.join();
}

#[test]
fn scenario_5_select_server_error_leaves_connection_open() {
    let server = MockServer::spawn(|mut stream| {
        let fields = vec!["value".to_string()];
        expect_request(
            &mut stream,
            &commands::select_points_limit("db", "meas", "s1", &fields, 0, u64::MAX, u64::MAX),
        );

        // No-such-series: an immediate error, no chunks at all.
        write_status(&mut stream, -17);

        // A following NOP must still succeed on the same connection.
        expect_request(&mut stream, &commands::nop());
        write_status(&mut stream, 0);
    });

    let mut client = client_for(&server);
    let schema = Schema::new(vec![Field::new(FieldType::F64, "value")]).unwrap();
    let fields = vec!["value".to_string()];
    let err = client
        .select_points("db", "meas", "s1", &schema, &fields, None, None, None)
        .err()
        .unwrap();
    assert!(matches!(err, Error::Status(-17)));

    // StatusError doesn't close the connection (spec §4.9, §8 "Failure handling").
    client.nop().unwrap();

    server.join();
}

#[test]
fn protocol_error_closes_connection_and_next_op_reconnects() {
    let server = MockServer::spawn(|mut stream: TcpStream| {
        expect_request(&mut stream, &commands::nop());
        // Respond with garbage instead of DT_STATUS_CODE.
        stream.write_all(&0xDEAD_BEEFu32.to_le_bytes()).unwrap();
        stream.write_all(&0i32.to_le_bytes()).unwrap();
        drop(stream);
    });

    let mut client = client_for(&server);
    let err = client.nop().unwrap_err();
    assert!(matches!(err, Error::Protocol(_)));
    assert!(err.closes_connection());

    server.join();
}
