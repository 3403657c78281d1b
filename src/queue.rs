//! Deferred call queue
//!
//! Handlers never answer synchronously. They push a [`Deferred`] continuation
//! carrying the command handle and the captured payload; the event loop later
//! pops continuations one at a time, in submission order, and runs each to
//! completion against a [`Responder`].

use std::collections::VecDeque;

use crate::ipc::{CommandHandle, Responder};
use crate::payload::{ArrayPayload, PayloadBox, StringPayload};
use crate::types::{
    LargeBitMask, LargeEnum, OnOff, ResultCode, SimpleRef, SmallBitMask, SmallEnum, TheStruct,
};

/// A pending response: the command to answer and what to answer it with
///
/// Inline variants carry their value directly. Boxed variants own pool
/// blocks, which are released when the continuation consumes them.
#[derive(Debug)]
pub enum Deferred {
    EchoSimple { cmd: CommandHandle, value: i32 },
    EchoSmallEnum { cmd: CommandHandle, value: SmallEnum },
    EchoLargeEnum { cmd: CommandHandle, value: PayloadBox<LargeEnum> },
    EchoSmallBitMask { cmd: CommandHandle, value: SmallBitMask },
    EchoLargeBitMask { cmd: CommandHandle, value: PayloadBox<LargeBitMask> },
    EchoBoolean { cmd: CommandHandle, value: bool },
    EchoResult { cmd: CommandHandle, value: ResultCode },
    ReturnResult { cmd: CommandHandle, value: ResultCode },
    EchoOnOff { cmd: CommandHandle, value: OnOff },
    EchoDouble { cmd: CommandHandle, value: PayloadBox<f64> },
    EchoReference { cmd: CommandHandle, value: SimpleRef },
    EchoString { cmd: CommandHandle, value: StringPayload },
    EchoArray { cmd: CommandHandle, value: ArrayPayload<i64> },
    EchoByteString { cmd: CommandHandle, value: ArrayPayload<u8> },
    EchoStruct { cmd: CommandHandle, value: PayloadBox<TheStruct> },
    EchoStructArray { cmd: CommandHandle, value: ArrayPayload<TheStruct> },
    EchoTriggerEvent { cmd: CommandHandle },
    EchoTriggerComplexEvent { cmd: CommandHandle },
}

impl Deferred {
    /// Method this continuation answers
    pub fn method(&self) -> &'static str {
        match self {
            Self::EchoSimple { .. } => "echo_simple",
            Self::EchoSmallEnum { .. } => "echo_small_enum",
            Self::EchoLargeEnum { .. } => "echo_large_enum",
            Self::EchoSmallBitMask { .. } => "echo_small_bit_mask",
            Self::EchoLargeBitMask { .. } => "echo_large_bit_mask",
            Self::EchoBoolean { .. } => "echo_boolean",
            Self::EchoResult { .. } => "echo_result",
            Self::ReturnResult { .. } => "return_result",
            Self::EchoOnOff { .. } => "echo_on_off",
            Self::EchoDouble { .. } => "echo_double",
            Self::EchoReference { .. } => "echo_reference",
            Self::EchoString { .. } => "echo_string",
            Self::EchoArray { .. } => "echo_array",
            Self::EchoByteString { .. } => "echo_byte_string",
            Self::EchoStruct { .. } => "echo_struct",
            Self::EchoStructArray { .. } => "echo_struct_array",
            Self::EchoTriggerEvent { .. } => "echo_trigger_event",
            Self::EchoTriggerComplexEvent { .. } => "echo_trigger_complex_event",
        }
    }

    /// Decode the payload, respond, and release any pool blocks
    pub fn complete<R: Responder + ?Sized>(self, responder: &mut R) {
        match self {
            Self::EchoSimple { cmd, value } => responder.echo_simple_respond(cmd, value),
            Self::EchoSmallEnum { cmd, value } => responder.echo_small_enum_respond(cmd, value),
            Self::EchoLargeEnum { cmd, value } => {
                responder.echo_large_enum_respond(cmd, value.peek());
                drop(value);
            }
            Self::EchoSmallBitMask { cmd, value } => {
                responder.echo_small_bit_mask_respond(cmd, value)
            }
            Self::EchoLargeBitMask { cmd, value } => {
                responder.echo_large_bit_mask_respond(cmd, value.peek());
                drop(value);
            }
            Self::EchoBoolean { cmd, value } => responder.echo_boolean_respond(cmd, value),
            Self::EchoResult { cmd, value } => responder.echo_result_respond(cmd, value),
            Self::ReturnResult { cmd, value } => responder.return_result_respond(cmd, value),
            Self::EchoOnOff { cmd, value } => responder.echo_on_off_respond(cmd, value),
            Self::EchoDouble { cmd, value } => {
                responder.echo_double_respond(cmd, value.peek());
                drop(value);
            }
            Self::EchoReference { cmd, value } => responder.echo_reference_respond(cmd, value),
            Self::EchoString { cmd, value } => {
                responder.echo_string_respond(cmd, &value.as_str());
                drop(value);
            }
            Self::EchoArray { cmd, value } => {
                responder.echo_array_respond(cmd, &value.elements());
                value.release();
            }
            Self::EchoByteString { cmd, value } => {
                responder.echo_byte_string_respond(cmd, &value.elements());
                value.release();
            }
            Self::EchoStruct { cmd, value } => {
                responder.echo_struct_respond(cmd, &value.peek());
                drop(value);
            }
            Self::EchoStructArray { cmd, value } => {
                responder.echo_struct_array_respond(cmd, &value.elements());
                value.release();
            }
            Self::EchoTriggerEvent { cmd } => responder.echo_trigger_event_respond(cmd),
            Self::EchoTriggerComplexEvent { cmd } => {
                responder.echo_trigger_complex_event_respond(cmd)
            }
        }
    }
}

/// Single-consumer FIFO of pending continuations
#[derive(Debug, Default)]
pub struct DeferredQueue {
    entries: VecDeque<Deferred>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a continuation behind everything already pending
    pub fn push(&mut self, deferred: Deferred) {
        tracing::trace!(
            method = deferred.method(),
            pending = self.entries.len() + 1,
            "queued continuation"
        );
        self.entries.push_back(deferred);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run the oldest continuation, if any
    ///
    /// Returns `false` when the queue was empty.
    pub fn run_next<R: Responder + ?Sized>(&mut self, responder: &mut R) -> bool {
        match self.entries.pop_front() {
            Some(deferred) => {
                tracing::trace!(method = deferred.method(), "running continuation");
                deferred.complete(responder);
                true
            }
            None => false,
        }
    }

    /// Run continuations until the queue is empty; returns how many ran
    pub fn drain<R: Responder + ?Sized>(&mut self, responder: &mut R) -> usize {
        let mut count = 0;
        while self.run_next(responder) {
            count += 1;
        }
        count
    }
}
