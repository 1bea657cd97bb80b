//! Byte-stream transport: plain TCP or TLS-wrapped, with exact-length
//! send/receive (spec §4.1).

use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};

use bytes::Bytes;

use crate::error::{Error, Result};

enum Stream {
    Plain(TcpStream),
    Tls(Box<native_tls::TlsStream<TcpStream>>),
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Stream::Plain(s) => s.read(buf),
            Stream::Tls(s) => s.read(buf),
        }
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Stream::Plain(s) => s.write(buf),
            Stream::Tls(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Stream::Plain(s) => s.flush(),
            Stream::Tls(s) => s.flush(),
        }
    }
}

/// A connected byte stream, plain or TLS, with exact-length helpers.
///
/// Credentials imply TLS (spec §4.1, Design Notes "Authentication only over
/// TLS"): the caller that owns authentication decides whether credentials
/// were supplied, `Transport::connect` only does the socket-level work.
pub struct Transport {
    stream: Stream,
}

impl Transport {
    /// Open a plain TCP connection.
    pub fn connect_plain(host: &str, port: u16) -> Result<Self> {
        let tcp = TcpStream::connect((host, port))?;
        tcp.set_nodelay(true)?;
        Ok(Self {
            stream: Stream::Plain(tcp),
        })
    }

    /// Open a TCP connection and upgrade it to TLS with a default
    /// validating context, SNI set to `host`.
    pub fn connect_tls(host: &str, port: u16) -> Result<Self> {
        let tcp = TcpStream::connect((host, port))?;
        tcp.set_nodelay(true)?;
        let connector = native_tls::TlsConnector::new()?;
        let tls = connector.connect(host, tcp)?;
        Ok(Self {
            stream: Stream::Tls(Box::new(tls)),
        })
    }

    /// Write `data` in full. Any partial-write failure surfaces as `IoError`.
    pub fn send_all(&mut self, data: &[u8]) -> Result<()> {
        self.stream.write_all(data)?;
        Ok(())
    }

    /// Read exactly `n` bytes, failing with `ConnectionClosed` if the peer
    /// hangs up before they all arrive.
    pub fn recv_all(&mut self, n: usize) -> Result<Bytes> {
        let mut buf = vec![0u8; n];
        let mut filled = 0;
        while filled < n {
            let read = self.stream.read(&mut buf[filled..])?;
            if read == 0 {
                return Err(Error::ConnectionClosed);
            }
            filled += read;
        }
        Ok(Bytes::from(buf))
    }

    /// Idempotent release of the underlying socket.
    pub fn close(&mut self) {
        match &mut self.stream {
            Stream::Plain(s) => {
                let _ = s.shutdown(Shutdown::Both);
            }
            Stream::Tls(s) => {
                let _ = s.shutdown();
            }
        }
    }
}
