//! Request surface of the echo service
//!
//! Requests arrive as [`EchoRequest`] values, each paired with a
//! [`CommandHandle`] naming the call to answer. Answers leave through a
//! [`Responder`]; [`Transcript`] is the in-memory one used by the harness and
//! tests. Payloads are encoded with MessagePack, as in
//! [`EchoRequest::from_msgpack`].

mod command;
mod protocol;
mod respond;

pub use command::CommandHandle;
pub use protocol::{EchoRequest, EchoResponse, ProtocolError};
pub use respond::{Responder, Transcript};
