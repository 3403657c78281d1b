//! Echo dispatch core
//!
//! Every inbound method captures its arguments and queues a continuation;
//! nothing is answered before the handler returns. Values that fit in a
//! machine word ride inline in the continuation, everything else is copied
//! into pool blocks that the continuation releases after responding.

use crate::config::EchoConfig;
use crate::ipc::{CommandHandle, EchoRequest, Responder};
use crate::notify::{EchoComplexHandlerRef, EchoHandlerRef, NotificationRegistry};
use crate::payload::{ArrayPayload, BlockCodec, PayloadBox, RECORD_SIZE, StringPayload};
use crate::pool::{FixedPool, PoolStats};
use crate::queue::{Deferred, DeferredQueue};
use crate::types::{
    LargeBitMask, LargeEnum, OnOff, ResultCode, SimpleRef, SmallBitMask, SmallEnum, TheStruct,
};

/// The asynchronous echo server
///
/// Owns the payload pools, the deferred call queue and the notification
/// registry. The enclosing event loop submits requests through the handler
/// methods (or [`dispatch`](Self::dispatch)) and drives responses with
/// [`run_next`](Self::run_next) / [`drain`](Self::drain).
#[derive(Debug)]
pub struct EchoServer {
    config: EchoConfig,
    value_pool: FixedPool,
    record_pool: FixedPool,
    struct_pool: FixedPool,
    queue: DeferredQueue,
    registry: NotificationRegistry,
}

impl EchoServer {
    /// Create a server with the default pool layout
    pub fn new() -> Self {
        Self::with_config(EchoConfig::default())
    }

    pub fn with_config(config: EchoConfig) -> Self {
        let entries = config.value_entries();
        Self {
            value_pool: FixedPool::new("value", entries, config.max_value_size()),
            record_pool: FixedPool::new("out_array_info", entries, RECORD_SIZE),
            struct_pool: FixedPool::new("the_struct", entries, TheStruct::ENCODED_LEN),
            queue: DeferredQueue::new(),
            registry: NotificationRegistry::new(),
            config,
        }
    }

    pub fn config(&self) -> &EchoConfig {
        &self.config
    }

    /// Usage of the value, record and struct pools, in that order
    pub fn pool_stats(&self) -> Vec<PoolStats> {
        vec![
            self.value_pool.stats(),
            self.record_pool.stats(),
            self.struct_pool.stats(),
        ]
    }

    /// Number of continuations waiting to run
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Run the oldest pending continuation; `false` if none was pending
    pub fn run_next<R: Responder + ?Sized>(&mut self, responder: &mut R) -> bool {
        self.queue.run_next(responder)
    }

    /// Run every pending continuation in submission order
    pub fn drain<R: Responder + ?Sized>(&mut self, responder: &mut R) -> usize {
        self.queue.drain(responder)
    }

    pub fn registry(&self) -> &NotificationRegistry {
        &self.registry
    }

    /// Route a decoded request to its handler
    pub fn dispatch(&mut self, cmd: CommandHandle, request: EchoRequest) {
        tracing::debug!(id = cmd.id(), method = request.method(), "dispatching request");
        match request {
            EchoRequest::EchoSimple { value } => self.echo_simple(cmd, value),
            EchoRequest::EchoSmallEnum { value } => self.echo_small_enum(cmd, value),
            EchoRequest::EchoLargeEnum { value } => self.echo_large_enum(cmd, value),
            EchoRequest::EchoSmallBitMask { value } => self.echo_small_bit_mask(cmd, value),
            EchoRequest::EchoLargeBitMask { value } => self.echo_large_bit_mask(cmd, value),
            EchoRequest::EchoBoolean { value } => self.echo_boolean(cmd, value),
            EchoRequest::EchoResult { value } => self.echo_result(cmd, value),
            EchoRequest::ReturnResult { value } => self.return_result(cmd, value),
            EchoRequest::EchoOnOff { value } => self.echo_on_off(cmd, value),
            EchoRequest::EchoDouble { value } => self.echo_double(cmd, value),
            EchoRequest::EchoReference { value } => self.echo_reference(cmd, value),
            EchoRequest::EchoString { value, out_size } => self.echo_string(cmd, &value, out_size),
            EchoRequest::EchoArray { value, out_len } => self.echo_array(cmd, &value, out_len),
            EchoRequest::EchoByteString { value, out_len } => {
                self.echo_byte_string(cmd, &value, out_len)
            }
            EchoRequest::EchoStruct { value } => self.echo_struct(cmd, &value),
            EchoRequest::EchoStructArray { value, out_len } => {
                self.echo_struct_array(cmd, &value, out_len)
            }
            EchoRequest::EchoTriggerEvent { cookie } => self.echo_trigger_event(cmd, cookie),
            EchoRequest::EchoTriggerComplexEvent {
                cookie,
                cookie_string,
                cookie_array,
            } => self.echo_trigger_complex_event(cmd, cookie, &cookie_string, &cookie_array),
            EchoRequest::ExitServer => self.exit_server(cmd),
        }
    }

    pub fn echo_simple(&mut self, cmd: CommandHandle, value: i32) {
        self.queue.push(Deferred::EchoSimple { cmd, value });
    }

    pub fn echo_small_enum(&mut self, cmd: CommandHandle, value: SmallEnum) {
        self.queue.push(Deferred::EchoSmallEnum { cmd, value });
    }

    pub fn echo_large_enum(&mut self, cmd: CommandHandle, value: LargeEnum) {
        let value = PayloadBox::capture(&self.value_pool, &value);
        self.queue.push(Deferred::EchoLargeEnum { cmd, value });
    }

    pub fn echo_small_bit_mask(&mut self, cmd: CommandHandle, value: SmallBitMask) {
        self.queue.push(Deferred::EchoSmallBitMask { cmd, value });
    }

    pub fn echo_large_bit_mask(&mut self, cmd: CommandHandle, value: LargeBitMask) {
        let value = PayloadBox::capture(&self.value_pool, &value);
        self.queue.push(Deferred::EchoLargeBitMask { cmd, value });
    }

    pub fn echo_boolean(&mut self, cmd: CommandHandle, value: bool) {
        self.queue.push(Deferred::EchoBoolean { cmd, value });
    }

    pub fn echo_result(&mut self, cmd: CommandHandle, value: ResultCode) {
        self.queue.push(Deferred::EchoResult { cmd, value });
    }

    pub fn return_result(&mut self, cmd: CommandHandle, value: ResultCode) {
        self.queue.push(Deferred::ReturnResult { cmd, value });
    }

    pub fn echo_on_off(&mut self, cmd: CommandHandle, value: OnOff) {
        self.queue.push(Deferred::EchoOnOff { cmd, value });
    }

    pub fn echo_double(&mut self, cmd: CommandHandle, value: f64) {
        let value = PayloadBox::capture(&self.value_pool, &value);
        self.queue.push(Deferred::EchoDouble { cmd, value });
    }

    pub fn echo_reference(&mut self, cmd: CommandHandle, value: SimpleRef) {
        self.queue.push(Deferred::EchoReference { cmd, value });
    }

    /// Echo at most `out_size - 1` bytes of `value`
    ///
    /// `out_size` counts the terminator and is silently capped at the value
    /// block size.
    pub fn echo_string(&mut self, cmd: CommandHandle, value: &str, out_size: usize) {
        let value = StringPayload::capture(&self.value_pool, value, out_size);
        self.queue.push(Deferred::EchoString { cmd, value });
    }

    pub fn echo_array(&mut self, cmd: CommandHandle, value: &[i64], out_len: usize) {
        let value = ArrayPayload::capture(&self.value_pool, &self.record_pool, value, out_len);
        self.queue.push(Deferred::EchoArray { cmd, value });
    }

    pub fn echo_byte_string(&mut self, cmd: CommandHandle, value: &[u8], out_len: usize) {
        let value = ArrayPayload::capture(&self.value_pool, &self.record_pool, value, out_len);
        self.queue.push(Deferred::EchoByteString { cmd, value });
    }

    pub fn echo_struct(&mut self, cmd: CommandHandle, value: &TheStruct) {
        let value = PayloadBox::capture(&self.struct_pool, value);
        self.queue.push(Deferred::EchoStruct { cmd, value });
    }

    pub fn echo_struct_array(&mut self, cmd: CommandHandle, value: &[TheStruct], out_len: usize) {
        let value = ArrayPayload::capture(&self.value_pool, &self.record_pool, value, out_len);
        self.queue.push(Deferred::EchoStructArray { cmd, value });
    }

    /// Abort the process without answering
    ///
    /// Fault-injection hook for exercising client crash handling.
    pub fn exit_server(&mut self, cmd: CommandHandle) -> ! {
        tracing::error!(id = cmd.id(), "exit requested, aborting");
        std::process::abort()
    }

    pub fn add_echo_event_handler(
        &mut self,
        handler: impl FnMut(i32) + 'static,
    ) -> Option<EchoHandlerRef> {
        self.registry.add_echo_handler(handler)
    }

    pub fn remove_echo_event_handler(&mut self, handler_ref: EchoHandlerRef) {
        self.registry.remove_echo_handler(handler_ref);
    }

    /// Notify the plain-channel subscriber, then acknowledge the trigger
    pub fn echo_trigger_event(&mut self, cmd: CommandHandle, cookie: i32) {
        self.registry.fire_echo(cookie);
        self.queue.push(Deferred::EchoTriggerEvent { cmd });
    }

    pub fn add_echo_complex_event_handler(
        &mut self,
        handler: impl FnMut(i32, &str, &[i16]) + 'static,
    ) -> Option<EchoComplexHandlerRef> {
        self.registry.add_echo_complex_handler(handler)
    }

    pub fn remove_echo_complex_event_handler(&mut self, handler_ref: EchoComplexHandlerRef) {
        self.registry.remove_echo_complex_handler(handler_ref);
    }

    /// Notify the complex-channel subscriber, then acknowledge the trigger
    pub fn echo_trigger_complex_event(
        &mut self,
        cmd: CommandHandle,
        cookie: i32,
        cookie_string: &str,
        cookie_array: &[i16],
    ) {
        self.registry.fire_echo_complex(cookie, cookie_string, cookie_array);
        self.queue.push(Deferred::EchoTriggerComplexEvent { cmd });
    }
}

impl Default for EchoServer {
    fn default() -> Self {
        Self::new()
    }
}
