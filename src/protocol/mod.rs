//! Wire-protocol building blocks: tokens, codec primitives, transport, and
//! the typed point packing/unpacking engine.

pub mod buffer;
pub mod commands;
pub mod constants;
pub mod transport;
pub mod types;
