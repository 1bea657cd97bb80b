//! Client-side core for a binary wire-protocol time-series database.
//!
//! Connects over TCP (optionally TLS-wrapped) to a TSDB server and issues
//! typed requests: database/measurement/series administration, point
//! writes, range selects, counts, and windowed aggregation sums. Also
//! provides a [`PushQueue`] for decoupling producer latency from server
//! write latency.
//!
//! # Example
//!
//! ```no_run
//! use tsdb_thin_rs::{Client, ClientConfig, Field, FieldType, Point, Schema, Value};
//!
//! fn main() -> tsdb_thin_rs::Result<()> {
//!     let mut client = Client::new(ClientConfig::new("localhost", 4000));
//!     client.create_database("demo")?;
//!
//!     let schema = Schema::new(vec![Field::new(FieldType::F64, "value")])?;
//!     client.create_measurement("demo", "readings", &schema)?;
//!
//!     let points = vec![Point::new(1).with_field("value", Value::F64(1.5))];
//!     client.write_points("demo", "readings", "sensor-1", &schema, &points)?;
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod connection;
pub mod error;
pub mod protocol;
pub mod push_queue;

pub use client::{Client, ClientConfig};
pub use connection::{Connection, CountResult, SelectStream, SumsStream};
pub use error::{Error, Result};
pub use protocol::types::{Chunk, Field, FieldType, FieldView, Packer, Point, Schema, SumsChunk, Value};
pub use push_queue::PushQueue;
