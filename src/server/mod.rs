//! Quiz server module.
//!
//! Provides the WebSocket transport over the synchronization core.

mod server;

pub use server::run;
