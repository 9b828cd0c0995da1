//! Agent runtime client.
//!
//! - [`AgentInvoker`] validates input, owns session ids and maps provider
//!   error codes onto [`AgentError`](crate::error::AgentError).
//! - [`AgentTransport`] is the wire seam; [`HttpAgentTransport`] is the
//!   production implementation.

pub mod invoker;
pub mod transport;

pub use invoker::{AgentInvoker, MIN_SESSION_ID_LEN, new_session_id};
pub use transport::{AgentTransport, HttpAgentTransport, SESSION_HEADER};
