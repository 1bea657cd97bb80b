//! `Client`: the session-level API (spec §4.9).
//!
//! Owns at most one `Connection`, opened lazily. A `StatusError` leaves the
//! connection in place (still on a command boundary); anything else closes
//! it, and the next operation reconnects.

use crate::connection::{Connection, CountResult, SelectStream, SumsStream};
use crate::error::{Error, Result};
use crate::protocol::constants::{DEFAULT_N, DEFAULT_TIME_FIRST, DEFAULT_TIME_LAST};
use crate::protocol::types::{Point, Schema};

/// Connection parameters for a [`Client`] (spec §6 "Configuration surface").
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub credentials: Option<(String, String)>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 4000,
            credentials: None,
        }
    }
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            credentials: None,
        }
    }

    /// Attach credentials. Per Design Notes §9, credentials imply TLS.
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }
}

/// The session-level client. Not `Sync`: each instance serializes commands
/// through a single `Connection` (spec §5).
pub struct Client {
    config: ClientConfig,
    conn: Option<Connection>,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        Self { config, conn: None }
    }

    fn connection(&mut self) -> Result<&mut Connection> {
        if self.conn.is_none() {
            log::debug!("connecting to {}:{}", self.config.host, self.config.port);
            let creds = self
                .config
                .credentials
                .as_ref()
                .map(|(u, p)| (u.as_str(), p.as_str()));
            let conn = Connection::open(&self.config.host, self.config.port, creds)?;
            self.conn = Some(conn);
        }
        Ok(self.conn.as_mut().unwrap())
    }

    /// Run `op` against the live connection, applying spec §4.9's policy: a
    /// `StatusError` leaves the connection open; anything else closes it so
    /// the next call reconnects.
    fn run<T>(&mut self, op: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let conn = self.connection()?;
        match op(conn) {
            Ok(v) => Ok(v),
            Err(e) => {
                self.close_on_error(&e);
                Err(e)
            }
        }
    }

    /// Apply spec §4.9's policy: close the connection unless `e` is a
    /// `StatusError`, which leaves the session on a command boundary.
    fn close_on_error(&mut self, e: &Error) {
        if e.closes_connection() {
            log::warn!("closing connection after error: {e}");
            if let Some(mut conn) = self.conn.take() {
                conn.close();
            }
        }
    }

    pub fn create_database(&mut self, database: &str) -> Result<()> {
        self.run(|c| c.create_database(database))
    }

    pub fn create_measurement(&mut self, database: &str, measurement: &str, schema: &Schema) -> Result<()> {
        self.run(|c| c.create_measurement(database, measurement, schema))
    }

    pub fn list_databases(&mut self) -> Result<Vec<String>> {
        self.run(|c| c.list_databases())
    }

    pub fn list_measurements(&mut self, database: &str) -> Result<Vec<String>> {
        self.run(|c| c.list_measurements(database))
    }

    pub fn list_series(&mut self, database: &str, measurement: &str) -> Result<Vec<String>> {
        self.run(|c| c.list_series(database, measurement))
    }

    pub fn list_active_series(
        &mut self,
        database: &str,
        measurement: &str,
        t0: Option<u64>,
        t1: Option<u64>,
    ) -> Result<Vec<String>> {
        self.run(|c| {
            c.list_active_series(
                database,
                measurement,
                t0.unwrap_or(DEFAULT_TIME_FIRST),
                t1.unwrap_or(DEFAULT_TIME_LAST),
            )
        })
    }

    pub fn get_schema(&mut self, database: &str, measurement: &str) -> Result<Schema> {
        self.run(|c| c.get_schema(database, measurement))
    }

    pub fn write_points(
        &mut self,
        database: &str,
        measurement: &str,
        series: &str,
        schema: &Schema,
        points: &[Point],
    ) -> Result<()> {
        self.run(|c| c.write_points(database, measurement, series, schema, points))
    }

    pub fn delete_points(
        &mut self,
        database: &str,
        measurement: &str,
        series: &str,
        t1: Option<u64>,
    ) -> Result<()> {
        self.run(|c| c.delete_points(database, measurement, series, t1.unwrap_or(DEFAULT_TIME_LAST)))
    }

    /// Borrows the `Client`'s connection for the stream's lifetime: no other
    /// `Client` method can be called until the returned `SelectStream` is
    /// dropped (or fully drained), enforced by the borrow checker.
    #[allow(clippy::too_many_arguments)]
    pub fn select_points(
        &mut self,
        database: &str,
        measurement: &str,
        series: &str,
        schema: &Schema,
        fields: &[String],
        t0: Option<u64>,
        t1: Option<u64>,
        limit: Option<u64>,
    ) -> Result<SelectStream<'_>> {
        match self.connection()?.select_points(
            database,
            measurement,
            series,
            schema,
            fields,
            t0.unwrap_or(DEFAULT_TIME_FIRST),
            t1.unwrap_or(DEFAULT_TIME_LAST),
            limit.unwrap_or(DEFAULT_N),
        ) {
            Ok(stream) => Ok(stream),
            Err(e) => {
                self.close_on_error(&e);
                Err(e)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn select_last_points(
        &mut self,
        database: &str,
        measurement: &str,
        series: &str,
        schema: &Schema,
        fields: &[String],
        t0: Option<u64>,
        t1: Option<u64>,
        last: Option<u64>,
    ) -> Result<SelectStream<'_>> {
        match self.connection()?.select_last_points(
            database,
            measurement,
            series,
            schema,
            fields,
            t0.unwrap_or(DEFAULT_TIME_FIRST),
            t1.unwrap_or(DEFAULT_TIME_LAST),
            last.unwrap_or(DEFAULT_N),
        ) {
            Ok(stream) => Ok(stream),
            Err(e) => {
                self.close_on_error(&e);
                Err(e)
            }
        }
    }

    pub fn count_points(
        &mut self,
        database: &str,
        measurement: &str,
        series: &str,
        t0: Option<u64>,
        t1: Option<u64>,
    ) -> Result<CountResult> {
        self.run(|c| {
            c.count_points(
                database,
                measurement,
                series,
                t0.unwrap_or(DEFAULT_TIME_FIRST),
                t1.unwrap_or(DEFAULT_TIME_LAST),
            )
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn sum_points(
        &mut self,
        database: &str,
        measurement: &str,
        series: &str,
        fields: &[String],
        t0: Option<u64>,
        t1: Option<u64>,
        window_ns: u64,
    ) -> Result<SumsStream<'_>> {
        match self.connection()?.sum_points(
            database,
            measurement,
            series,
            fields,
            t0.unwrap_or(DEFAULT_TIME_FIRST),
            t1.unwrap_or(DEFAULT_TIME_LAST),
            window_ns,
        ) {
            Ok(stream) => Ok(stream),
            Err(e) => {
                self.close_on_error(&e);
                Err(e)
            }
        }
    }

    pub fn nop(&mut self) -> Result<()> {
        self.run(|c| c.nop())
    }

    /// Close the live connection, if any. The next operation reconnects.
    pub fn close(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            conn.close();
        }
    }
}
