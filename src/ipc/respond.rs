//! Respond primitives of the request surface

use crate::ipc::command::CommandHandle;
use crate::ipc::protocol::EchoResponse;
use crate::types::{
    LargeBitMask, LargeEnum, OnOff, ResultCode, SimpleRef, SmallBitMask, SmallEnum, TheStruct,
};

/// Typed respond primitives, one per method
///
/// Each call consumes the command handle of the request it answers.
/// Implementations must call [`CommandHandle::complete`] once the response
/// has been handed to the transport.
pub trait Responder {
    fn echo_simple_respond(&mut self, cmd: CommandHandle, value: i32);
    fn echo_small_enum_respond(&mut self, cmd: CommandHandle, value: SmallEnum);
    fn echo_large_enum_respond(&mut self, cmd: CommandHandle, value: LargeEnum);
    fn echo_small_bit_mask_respond(&mut self, cmd: CommandHandle, value: SmallBitMask);
    fn echo_large_bit_mask_respond(&mut self, cmd: CommandHandle, value: LargeBitMask);
    fn echo_boolean_respond(&mut self, cmd: CommandHandle, value: bool);
    fn echo_result_respond(&mut self, cmd: CommandHandle, value: ResultCode);
    fn return_result_respond(&mut self, cmd: CommandHandle, value: ResultCode);
    fn echo_on_off_respond(&mut self, cmd: CommandHandle, value: OnOff);
    fn echo_double_respond(&mut self, cmd: CommandHandle, value: f64);
    fn echo_reference_respond(&mut self, cmd: CommandHandle, value: SimpleRef);
    fn echo_string_respond(&mut self, cmd: CommandHandle, value: &str);
    fn echo_array_respond(&mut self, cmd: CommandHandle, value: &[i64]);
    fn echo_byte_string_respond(&mut self, cmd: CommandHandle, value: &[u8]);
    fn echo_struct_respond(&mut self, cmd: CommandHandle, value: &TheStruct);
    fn echo_struct_array_respond(&mut self, cmd: CommandHandle, value: &[TheStruct]);
    fn echo_trigger_event_respond(&mut self, cmd: CommandHandle);
    fn echo_trigger_complex_event_respond(&mut self, cmd: CommandHandle);
}

/// Responder that records every response in emission order
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<(u64, EchoResponse)>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded `(command id, response)` pairs, oldest first
    pub fn entries(&self) -> &[(u64, EchoResponse)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Take the recorded entries, leaving the transcript empty
    pub fn take(&mut self) -> Vec<(u64, EchoResponse)> {
        std::mem::take(&mut self.entries)
    }

    /// The response recorded for command `id`, if any
    pub fn response_for(&self, id: u64) -> Option<&EchoResponse> {
        self.entries
            .iter()
            .find(|(entry_id, _)| *entry_id == id)
            .map(|(_, response)| response)
    }

    fn record(&mut self, cmd: CommandHandle, response: EchoResponse) {
        let id = cmd.complete();
        tracing::trace!(id, ?response, "recorded response");
        self.entries.push((id, response));
    }
}

impl Responder for Transcript {
    fn echo_simple_respond(&mut self, cmd: CommandHandle, value: i32) {
        self.record(cmd, EchoResponse::EchoSimple(value));
    }

    fn echo_small_enum_respond(&mut self, cmd: CommandHandle, value: SmallEnum) {
        self.record(cmd, EchoResponse::EchoSmallEnum(value));
    }

    fn echo_large_enum_respond(&mut self, cmd: CommandHandle, value: LargeEnum) {
        self.record(cmd, EchoResponse::EchoLargeEnum(value));
    }

    fn echo_small_bit_mask_respond(&mut self, cmd: CommandHandle, value: SmallBitMask) {
        self.record(cmd, EchoResponse::EchoSmallBitMask(value));
    }

    fn echo_large_bit_mask_respond(&mut self, cmd: CommandHandle, value: LargeBitMask) {
        self.record(cmd, EchoResponse::EchoLargeBitMask(value));
    }

    fn echo_boolean_respond(&mut self, cmd: CommandHandle, value: bool) {
        self.record(cmd, EchoResponse::EchoBoolean(value));
    }

    fn echo_result_respond(&mut self, cmd: CommandHandle, value: ResultCode) {
        self.record(cmd, EchoResponse::EchoResult(value));
    }

    fn return_result_respond(&mut self, cmd: CommandHandle, value: ResultCode) {
        self.record(cmd, EchoResponse::ReturnResult(value));
    }

    fn echo_on_off_respond(&mut self, cmd: CommandHandle, value: OnOff) {
        self.record(cmd, EchoResponse::EchoOnOff(value));
    }

    fn echo_double_respond(&mut self, cmd: CommandHandle, value: f64) {
        self.record(cmd, EchoResponse::EchoDouble(value));
    }

    fn echo_reference_respond(&mut self, cmd: CommandHandle, value: SimpleRef) {
        self.record(cmd, EchoResponse::EchoReference(value));
    }

    fn echo_string_respond(&mut self, cmd: CommandHandle, value: &str) {
        self.record(cmd, EchoResponse::EchoString(value.to_string()));
    }

    fn echo_array_respond(&mut self, cmd: CommandHandle, value: &[i64]) {
        self.record(cmd, EchoResponse::EchoArray(value.to_vec()));
    }

    fn echo_byte_string_respond(&mut self, cmd: CommandHandle, value: &[u8]) {
        self.record(cmd, EchoResponse::EchoByteString(value.to_vec()));
    }

    fn echo_struct_respond(&mut self, cmd: CommandHandle, value: &TheStruct) {
        self.record(cmd, EchoResponse::EchoStruct(value.clone()));
    }

    fn echo_struct_array_respond(&mut self, cmd: CommandHandle, value: &[TheStruct]) {
        self.record(cmd, EchoResponse::EchoStructArray(value.to_vec()));
    }

    fn echo_trigger_event_respond(&mut self, cmd: CommandHandle) {
        self.record(cmd, EchoResponse::EchoTriggerEvent);
    }

    fn echo_trigger_complex_event_respond(&mut self, cmd: CommandHandle) {
        self.record(cmd, EchoResponse::EchoTriggerComplexEvent);
    }
}
