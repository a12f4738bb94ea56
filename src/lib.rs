//! Realtime store/customer chat client with a strategy-report sub-protocol.
//!
//! Everything with correctness constraints lives here, independent of any
//! view layer:
//!
//! - [`transport`] — one WebSocket's lifecycle behind an owned
//!   [`transport::Connection`] handle, with fail-closed decoding of inbound
//!   frames.
//! - [`session`] — the ordered message log, local role and terminal `ended`
//!   flag, applied as atomic state transitions.
//! - [`policy`] — pure role-dependent derivations consumed by a view layer.
//! - [`report`] — the single request / single response exchange producing a
//!   [`models::StrategyReport`].
//! - [`persist`] — the durable end-of-chat flag surviving restarts.
//!
//! The `storefront-chat` binary is a thin terminal front-end over these
//! modules; it only wires configuration and renders state.

pub mod errors;
pub mod models;
pub mod persist;
pub mod policy;
pub mod report;
pub mod session;
pub mod transport;

pub use errors::ClientError;
pub use models::{ChatMessage, Role, StrategyReport, WireMessage};
pub use session::{ChatSession, SessionConfig};
