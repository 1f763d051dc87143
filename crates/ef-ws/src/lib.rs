//! ef-ws: WebSocket event feed
//!
//! Upgrades `GET /` to a WebSocket and streams the canned event sequence
//! to the peer, keeping the connection alive with Ping/Pong probes.
//! Built with axum for HTTP handling and tokio for the per-connection tasks.

pub mod cancel;
pub mod error;
pub mod handler;
pub mod origin;
pub mod payload;
pub mod prober;
pub mod server;
pub mod session;
pub mod writer;

pub use cancel::CancelSignal;
pub use error::{Result, WsError};
pub use handler::websocket_handler;
pub use origin::OriginPolicy;
pub use payload::{EVENT_IDS, EventFrame};
pub use prober::ProbeReport;
pub use server::{WsState, routes};
pub use session::{Session, SessionEnd, SessionTiming};
pub use writer::FrameWriter;
