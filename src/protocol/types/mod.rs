//! Schema & field model, and the Packer/Unpacker typed point engine.

pub mod field;
pub mod pack;
pub mod point;
pub mod schema;
pub mod sums;
pub mod unpack;

pub use field::{Field, FieldType};
pub use pack::Packer;
pub use point::{Point, Value};
pub use schema::Schema;
pub use sums::{unpack_sums_chunk, SumsChunk};
pub use unpack::{unpack_chunk, Chunk, FieldView};
