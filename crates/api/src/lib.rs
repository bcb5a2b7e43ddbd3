//! HTTP and WebSocket surface.

pub mod error;
pub mod routes;
pub mod websocket;

pub use error::*;
pub use routes::*;
pub use websocket::*;
