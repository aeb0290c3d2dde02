//! Client side of the conformance harness.
//!
//! - [`transport::Transport`] owns one plain or TLS stream
//! - [`collector::ResponseCollector`] reads a reply by waiting for the server
//!   to go quiet
//! - [`session::SessionRunner`] replays one test case on a fresh connection

pub mod collector;
pub mod error;
pub mod session;
pub mod transport;

pub use collector::ResponseCollector;
pub use error::{ClientError, ConnectionError, DecodeError, Result};
pub use session::{Exchange, SessionError, SessionRunner};
pub use transport::Transport;
