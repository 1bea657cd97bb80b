//! Loopback mock-server helper shared by the integration tests.
//!
//! Spawns a `TcpListener` on an OS-assigned port in a background thread and
//! hands the accepted stream to a caller-supplied script, mirroring the
//! teacher's integration tests but against a hand-rolled server instead of
//! a live database.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

pub struct MockServer {
    pub port: u16,
    handle: Option<JoinHandle<()>>,
}

impl MockServer {
    /// Bind a loopback listener and run `script` against the first accepted
    /// connection on a background thread.
    pub fn spawn(script: impl FnOnce(TcpStream) + Send + 'static) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock server");
        let port = listener.local_addr().unwrap().port();
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().expect("accept mock connection");
            script(stream);
        });
        Self {
            port,
            handle: Some(handle),
        }
    }

    /// Wait for the server thread to finish its script.
    pub fn join(mut self) {
        if let Some(h) = self.handle.take() {
            h.join().expect("mock server thread panicked");
        }
    }
}

/// Read exactly `n` bytes off `stream`.
pub fn read_n(stream: &mut TcpStream, n: usize) -> Vec<u8> {
    let mut buf = vec![0u8; n];
    stream.read_exact(&mut buf).expect("mock server read");
    buf
}

/// Read a `u32` little-endian token.
pub fn read_token(stream: &mut TcpStream) -> u32 {
    u32::from_le_bytes(read_n(stream, 4).try_into().unwrap())
}

/// Read a framed string (`u16 len || bytes`), returning just the bytes.
pub fn read_framed(stream: &mut TcpStream) -> Vec<u8> {
    let len = u16::from_le_bytes(read_n(stream, 2).try_into().unwrap()) as usize;
    read_n(stream, len)
}

/// Read exactly `expected.len()` bytes and assert they match. Request
/// bodies are built with the crate's own encoders (the same ones covered
/// by the golden-vector unit tests in `protocol::commands`), so this reads
/// an exact, unambiguous number of bytes rather than hunting for a
/// terminator token that could in principle collide with framed string
/// content.
pub fn expect_request(stream: &mut TcpStream, expected: &[u8]) {
    let got = read_n(stream, expected.len());
    assert_eq!(got, expected, "mock server: unexpected request bytes");
}

pub fn write_status(stream: &mut TcpStream, status: i32) {
    const DT_STATUS_CODE: u32 = 0x8C8C_07D9;
    stream.write_all(&DT_STATUS_CODE.to_le_bytes()).unwrap();
    stream.write_all(&status.to_le_bytes()).unwrap();
}
