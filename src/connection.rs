//! `Connection`: one live session against the server (spec §4.1–§4.8).
//!
//! A `Connection` owns its `Transport` exclusively. Command/response pairs
//! are strictly FIFO; the select/sums streaming iterators enforce "drain
//! before the next command" structurally, by holding `&mut Connection` for
//! their whole lifetime (Design Notes §9).

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::protocol::commands;
use crate::protocol::constants::*;
use crate::protocol::transport::Transport;
use crate::protocol::types::{unpack_chunk, unpack_sums_chunk, Chunk, Field, Schema, SumsChunk};

/// Result of `COUNT_POINTS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountResult {
    pub time_first: u64,
    pub time_last: u64,
    pub npoints: u64,
}

/// A live session. See module docs.
pub struct Connection {
    transport: Transport,
}

impl Connection {
    /// Open a connection. When `credentials` are given the socket is
    /// upgraded to TLS (SNI = `host`) and `AUTHENTICATE` is sent before any
    /// other traffic (spec §4.1, Design Notes "Authentication only over
    /// TLS").
    pub fn open(host: &str, port: u16, credentials: Option<(&str, &str)>) -> Result<Self> {
        let transport = match credentials {
            Some(_) => Transport::connect_tls(host, port)?,
            None => Transport::connect_plain(host, port)?,
        };
        let mut conn = Self { transport };
        if let Some((username, password)) = credentials {
            conn.authenticate(username, password)?;
        }
        Ok(conn)
    }

    /// Idempotent release of the underlying socket.
    pub fn close(&mut self) {
        self.transport.close();
    }

    // -- low-level token/primitive reads --------------------------------

    fn recv_u16(&mut self) -> Result<u16> {
        let b = self.transport.recv_all(2)?;
        Ok(u16::from_le_bytes(b[..].try_into().unwrap()))
    }

    fn recv_u32(&mut self) -> Result<u32> {
        let b = self.transport.recv_all(4)?;
        Ok(u32::from_le_bytes(b[..].try_into().unwrap()))
    }

    fn recv_i32(&mut self) -> Result<i32> {
        let b = self.transport.recv_all(4)?;
        Ok(i32::from_le_bytes(b[..].try_into().unwrap()))
    }

    fn recv_u64(&mut self) -> Result<u64> {
        let b = self.transport.recv_all(8)?;
        Ok(u64::from_le_bytes(b[..].try_into().unwrap()))
    }

    fn recv_framed_string(&mut self) -> Result<String> {
        let len = self.recv_u16()? as usize;
        let bytes = self.transport.recv_all(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::protocol(format!("non-UTF-8 framed string: {e}")))
    }

    fn recv_status(&mut self) -> Result<()> {
        let status = self.recv_i32()?;
        if status == 0 {
            Ok(())
        } else {
            Err(Error::Status(status))
        }
    }

    /// Send a request body and read a "simple transact" response: a single
    /// `DT_STATUS_CODE` followed by status (spec §4.4).
    fn transact(&mut self, body: Bytes) -> Result<()> {
        self.transport.send_all(&body)?;
        let token = self.recv_u32()?;
        if token != DT_STATUS_CODE {
            return Err(Error::protocol(format!(
                "expected DT_STATUS_CODE, got token {token:#010x}"
            )));
        }
        self.recv_status()
    }

    /// Send a request body and read a "list stream" response: zero or more
    /// `dt_token || framed string` items terminated by status.
    fn list_stream(&mut self, body: Bytes, dt_token: u32) -> Result<Vec<String>> {
        self.transport.send_all(&body)?;
        let mut items = Vec::new();
        loop {
            let token = self.recv_u32()?;
            if token == dt_token {
                items.push(self.recv_framed_string()?);
            } else if token == DT_STATUS_CODE {
                self.recv_status()?;
                return Ok(items);
            } else {
                return Err(Error::protocol(format!(
                    "unexpected token {token:#010x} in list stream"
                )));
            }
        }
    }

    // -- commands ---------------------------------------------------------

    pub fn authenticate(&mut self, username: &str, password: &str) -> Result<()> {
        self.transact(commands::authenticate(username, password))
    }

    pub fn create_database(&mut self, database: &str) -> Result<()> {
        self.transact(commands::create_database(database))
    }

    pub fn create_measurement(
        &mut self,
        database: &str,
        measurement: &str,
        schema: &Schema,
    ) -> Result<()> {
        self.transact(commands::create_measurement(database, measurement, schema))
    }

    pub fn list_databases(&mut self) -> Result<Vec<String>> {
        self.list_stream(commands::list_databases(), DT_DATABASE)
    }

    pub fn list_measurements(&mut self, database: &str) -> Result<Vec<String>> {
        self.list_stream(commands::list_measurements(database), DT_MEASUREMENT)
    }

    pub fn list_series(&mut self, database: &str, measurement: &str) -> Result<Vec<String>> {
        self.list_stream(commands::list_series(database, measurement), DT_SERIES)
    }

    pub fn list_active_series(
        &mut self,
        database: &str,
        measurement: &str,
        t0: u64,
        t1: u64,
    ) -> Result<Vec<String>> {
        self.list_stream(
            commands::active_series(database, measurement, t0, t1),
            DT_SERIES,
        )
    }

    pub fn get_schema(&mut self, database: &str, measurement: &str) -> Result<Schema> {
        self.transport
            .send_all(&commands::get_schema(database, measurement))?;
        let mut fields = Vec::new();
        loop {
            let token = self.recv_u32()?;
            if token == DT_FIELD_TYPE {
                let type_id = self.recv_u32()?;
                let field_type = crate::protocol::types::FieldType::from_id(type_id)?;
                let name_token = self.recv_u32()?;
                if name_token != DT_FIELD_NAME {
                    return Err(Error::protocol(format!(
                        "expected DT_FIELD_NAME, got token {name_token:#010x}"
                    )));
                }
                let name = self.recv_framed_string()?;
                fields.push(Field::new(field_type, name));
            } else if token == DT_STATUS_CODE {
                self.recv_status()?;
                return Schema::new(fields);
            } else {
                return Err(Error::protocol(format!(
                    "unexpected token {token:#010x} in GET_SCHEMA response"
                )));
            }
        }
    }

    pub fn delete_points(
        &mut self,
        database: &str,
        measurement: &str,
        series: &str,
        t1: u64,
    ) -> Result<()> {
        self.transact(commands::delete_points(database, measurement, series, t1))
    }

    pub fn count_points(
        &mut self,
        database: &str,
        measurement: &str,
        series: &str,
        t0: u64,
        t1: u64,
    ) -> Result<CountResult> {
        self.transport.send_all(&commands::count_points(
            database, measurement, series, t0, t1,
        ))?;
        let token = self.recv_u32()?;
        if token != DT_TIME_FIRST {
            return Err(Error::protocol(format!(
                "expected DT_TIME_FIRST, got token {token:#010x}"
            )));
        }
        let time_first = self.recv_u64()?;
        let token = self.recv_u32()?;
        if token != DT_TIME_LAST {
            return Err(Error::protocol(format!(
                "expected DT_TIME_LAST, got token {token:#010x}"
            )));
        }
        let time_last = self.recv_u64()?;
        let token = self.recv_u32()?;
        if token != DT_NPOINTS {
            return Err(Error::protocol(format!(
                "expected DT_NPOINTS, got token {token:#010x}"
            )));
        }
        let npoints = self.recv_u64()?;
        let token = self.recv_u32()?;
        if token != DT_STATUS_CODE {
            return Err(Error::protocol(format!(
                "expected DT_STATUS_CODE, got token {token:#010x}"
            )));
        }
        self.recv_status()?;
        Ok(CountResult {
            time_first,
            time_last,
            npoints,
        })
    }

    /// Run the `WRITE_POINTS` state machine (spec §4.7) to completion,
    /// writing every point in `points` in chunks sized to the server's
    /// first-advertised `max_data_len`.
    pub fn write_points(
        &mut self,
        database: &str,
        measurement: &str,
        series: &str,
        schema: &Schema,
        points: &[crate::protocol::types::Point],
    ) -> Result<()> {
        self.transport.send_all(&commands::write_points_open(
            database,
            measurement,
            series,
        ))?;

        let token = self.recv_u32()?;
        let max_data_len = if token == DT_STATUS_CODE {
            return self.recv_status();
        } else if token == DT_READY_FOR_CHUNK {
            self.recv_u32()?
        } else {
            return Err(Error::protocol(format!(
                "expected DT_READY_FOR_CHUNK or DT_STATUS_CODE, got token {token:#010x}"
            )));
        };

        // S1: the first max_data_len binds the whole transaction (Design
        // Notes §9, Open Question) — subsequent DT_READY_FOR_CHUNK values
        // are read (to stay on-protocol) but ignored.
        let packer = crate::protocol::types::Packer::new(schema, max_data_len);
        let max_points = packer.max_points() as usize;
        if max_points == 0 && !points.is_empty() {
            return Err(Error::protocol(format!(
                "server-advertised max_data_len {max_data_len} can't fit a single chunk of 64 points"
            )));
        }

        let mut index = 0;
        while index < points.len() {
            let n = (points.len() - index).min(max_points);
            let payload = packer.pack(points, index, n)?;
            self.transport.send_all(&commands::write_points_chunk(
                n as u32,
                0,
                &payload,
            ))?;
            index += n;

            let token = self.recv_u32()?;
            if token == DT_STATUS_CODE {
                return self.recv_status();
            } else if token == DT_READY_FOR_CHUNK {
                self.recv_u32()?; // ignored past the first
            } else {
                return Err(Error::protocol(format!(
                    "expected DT_READY_FOR_CHUNK or DT_STATUS_CODE, got token {token:#010x}"
                )));
            }
        }

        // S3 Finalize.
        self.transport.send_all(&commands::write_points_end())?;
        let token = self.recv_u32()?;
        if token != DT_STATUS_CODE {
            return Err(Error::protocol(format!(
                "expected DT_STATUS_CODE, got token {token:#010x}"
            )));
        }
        self.recv_status()
    }

    /// `SELECT_POINTS_LIMIT`: at most `limit` points with `time_ns >= t0`.
    pub fn select_points<'a>(
        &'a mut self,
        database: &str,
        measurement: &str,
        series: &str,
        schema: &'a Schema,
        fields: &[String],
        t0: u64,
        t1: u64,
        limit: u64,
    ) -> Result<SelectStream<'a>> {
        let body = commands::select_points_limit(database, measurement, series, fields, t0, t1, limit);
        self.transport.send_all(&body)?;
        let first_token = self.peek_stream_token()?;
        Ok(SelectStream::new(self, schema, fields.to_vec(), first_token))
    }

    /// `SELECT_POINTS_LAST`: the most recent `last` points.
    pub fn select_last_points<'a>(
        &'a mut self,
        database: &str,
        measurement: &str,
        series: &str,
        schema: &'a Schema,
        fields: &[String],
        t0: u64,
        t1: u64,
        last: u64,
    ) -> Result<SelectStream<'a>> {
        let body = commands::select_points_last(database, measurement, series, fields, t0, t1, last);
        self.transport.send_all(&body)?;
        let first_token = self.peek_stream_token()?;
        Ok(SelectStream::new(self, schema, fields.to_vec(), first_token))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn sum_points<'a>(
        &'a mut self,
        database: &str,
        measurement: &str,
        series: &str,
        fields: &[String],
        t0: u64,
        t1: u64,
        window_ns: u64,
    ) -> Result<SumsStream<'a>> {
        let body = commands::sum_points(database, measurement, series, fields, t0, t1, window_ns);
        self.transport.send_all(&body)?;
        let first_token = self.peek_stream_token()?;
        Ok(SumsStream::new(self, fields.len(), first_token))
    }

    pub fn nop(&mut self) -> Result<()> {
        self.transact(commands::nop())
    }

    /// Read the first token of a chunk-stream response. A `DT_STATUS_CODE`
    /// here means the server rejected the request before any chunk (spec
    /// §8 scenario 5) and is surfaced as a `StatusError` right away, rather
    /// than on the iterator's first `next()` call.
    fn peek_stream_token(&mut self) -> Result<u32> {
        let token = self.recv_u32()?;
        if token == DT_STATUS_CODE {
            return Err(Error::Status(self.recv_i32()?));
        }
        Ok(token)
    }
}

/// A chunk-stream iterator over `SELECT_POINTS_LIMIT`/`SELECT_POINTS_LAST`
/// results. Borrows the `Connection` exclusively for its entire lifetime
/// (Design Notes §9): the borrow checker refuses any other command on the
/// same `Connection` until this iterator is dropped.
pub struct SelectStream<'a> {
    conn: &'a mut Connection,
    schema: &'a Schema,
    fields: Vec<String>,
    pending_token: u32,
    done: bool,
}

impl<'a> SelectStream<'a> {
    fn new(conn: &'a mut Connection, schema: &'a Schema, fields: Vec<String>, first_token: u32) -> Self {
        Self {
            conn,
            schema,
            fields,
            pending_token: first_token,
            done: false,
        }
    }

    fn next_chunk(&mut self) -> Result<Option<Chunk>> {
        if self.done {
            return Ok(None);
        }
        let conn = &mut *self.conn;
        if self.pending_token == DT_END {
            let status_token = conn.recv_u32()?;
            if status_token != DT_STATUS_CODE {
                return Err(Error::protocol(format!(
                    "expected DT_STATUS_CODE after DT_END, got token {status_token:#010x}"
                )));
            }
            conn.recv_status()?;
            self.done = true;
            return Ok(None);
        }
        if self.pending_token != DT_CHUNK {
            return Err(Error::protocol(format!(
                "expected DT_CHUNK or DT_END, got token {:#010x}",
                self.pending_token
            )));
        }
        let npoints = conn.recv_u32()?;
        let bitmap_offset = conn.recv_u32()?;
        let data_len = conn.recv_u32()? as usize;
        let data = conn.transport.recv_all(data_len)?;
        let chunk = unpack_chunk(self.schema, &self.fields, npoints, bitmap_offset, data)?;
        self.pending_token = conn.recv_u32()?;
        Ok(Some(chunk))
    }
}

impl Iterator for SelectStream<'_> {
    type Item = Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_chunk() {
            Ok(Some(chunk)) => Some(Ok(chunk)),
            Ok(None) => None,
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// A chunk-stream iterator over `SUM_POINTS` results. Same exclusive-borrow
/// discipline as [`SelectStream`].
pub struct SumsStream<'a> {
    conn: &'a mut Connection,
    nfields: usize,
    pending_token: u32,
    done: bool,
}

impl<'a> SumsStream<'a> {
    fn new(conn: &'a mut Connection, nfields: usize, first_token: u32) -> Self {
        Self {
            conn,
            nfields,
            pending_token: first_token,
            done: false,
        }
    }

    fn next_chunk(&mut self) -> Result<Option<SumsChunk>> {
        if self.done {
            return Ok(None);
        }
        let conn = &mut *self.conn;
        if self.pending_token == DT_END {
            let status_token = conn.recv_u32()?;
            if status_token != DT_STATUS_CODE {
                return Err(Error::protocol(format!(
                    "expected DT_STATUS_CODE after DT_END, got token {status_token:#010x}"
                )));
            }
            conn.recv_status()?;
            self.done = true;
            return Ok(None);
        }
        if self.pending_token != DT_SUMS_CHUNK {
            return Err(Error::protocol(format!(
                "expected DT_SUMS_CHUNK or DT_END, got token {:#010x}",
                self.pending_token
            )));
        }
        let chunk_npoints = conn.recv_u16()?;
        let data_len = (chunk_npoints as usize) * (8 + self.nfields * 32);
        let data = conn.transport.recv_all(data_len)?;
        let chunk = unpack_sums_chunk(self.nfields, chunk_npoints, data)?;
        self.pending_token = conn.recv_u32()?;
        Ok(Some(chunk))
    }
}

impl Iterator for SumsStream<'_> {
    type Item = Result<SumsChunk>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_chunk() {
            Ok(Some(chunk)) => Some(Ok(chunk)),
            Ok(None) => None,
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
