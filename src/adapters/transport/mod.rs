//! WebSocket transport.
//!
//! Sub-modules:
//! - `messages`: inbound envelope, request payloads, replies
//! - `dispatch`: request → use case routing and error mapping
//! - `server`: tokio-tungstenite accept loop and client tasks

pub mod dispatch;
pub mod messages;
pub mod server;

pub use dispatch::Dispatcher;
pub use messages::{ClientRequest, ServerMessage};
pub use server::{WebSocketServer, WebSocketServerConfig};
