//! A calculator served over TCP.
//!
//! Clients send one `<number> <op> <number>` line per frame and get one line
//! back. Frames are a 2-byte big-endian length followed by UTF-8 text; see
//! [`protocol`]. The server comes in two flavours: [`vanilla`] serves one
//! client at a time, [`threads`] gives every client its own thread.

pub mod client;
pub mod connection;
pub mod eval;
pub mod protocol;
pub mod threads;
pub mod utils;
pub mod vanilla;

pub use utils::init_tracing;
