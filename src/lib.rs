//! IPC echo server core
//!
//! This library implements the asynchronous dispatch core of an echo service:
//! every request is answered later, from the event loop, with the value it
//! carried. Out-of-line payloads are held in fixed-capacity pools until the
//! deferred response runs.
//!
//! - [`FixedPool`] - bounded block allocator with RAII blocks
//! - [`DeferredQueue`] - FIFO of pending continuations
//! - [`NotificationRegistry`] - single-subscriber event channels
//! - [`EchoServer`] - the per-method handlers tying them together
//!
//! # Example
//!
//! ```rust
//! use ipc_echo::ipc::{CommandHandle, EchoRequest, EchoResponse, Transcript};
//! use ipc_echo::EchoServer;
//!
//! let mut server = EchoServer::new();
//! let mut transcript = Transcript::new();
//!
//! server.dispatch(
//!     CommandHandle::new(1),
//!     EchoRequest::EchoString { value: "Hello".to_string(), out_size: 4 },
//! );
//! assert!(transcript.is_empty());
//!
//! server.drain(&mut transcript);
//! assert_eq!(
//!     transcript.response_for(1),
//!     Some(&EchoResponse::EchoString("Hel".to_string())),
//! );
//! ```
//!
//! # Notifications
//!
//! ```rust
//! use ipc_echo::ipc::{CommandHandle, Transcript};
//! use ipc_echo::EchoServer;
//!
//! let mut server = EchoServer::new();
//! let token = server
//!     .add_echo_event_handler(|cookie| println!("fired with {cookie}"))
//!     .expect("channel is free");
//!
//! server.echo_trigger_event(CommandHandle::new(7), 42);
//! server.drain(&mut Transcript::new());
//! server.remove_echo_event_handler(token);
//! ```

mod config;
mod error;
pub mod ipc;
mod notify;
mod payload;
mod pool;
mod queue;
mod server;
mod types;

pub use config::{EchoConfig, EchoConfigBuilder, MAX_VALUE_SIZE, VALUE_ENTRIES};
pub use error::{Error, Result};
pub use ipc::{CommandHandle, Responder};
pub use notify::{
    EchoComplexHandler, EchoComplexHandlerRef, EchoHandler, EchoHandlerRef, NotificationRegistry,
};
pub use payload::{ArrayPayload, BlockCodec, PayloadBox, RECORD_SIZE, StringPayload};
pub use pool::{FixedPool, PoolBlock, PoolStats};
pub use queue::{Deferred, DeferredQueue};
pub use server::EchoServer;
pub use types::{
    LargeBitMask, LargeEnum, NAME_MAX_LEN, OnOff, ResultCode, SimpleRef, SmallBitMask, SmallEnum,
    TheStruct,
};
