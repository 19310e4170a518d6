//! REST API implementation for the practice service
//!
//! - `server`: router, shared context, serve loop
//! - `handlers`: REST endpoints
//! - `sse`: event stream

pub mod handlers;
pub mod server;
pub mod sse;

pub use server::{router, run, AppContext};
