//! Typed request and response payloads
//!
//! These enums stand in for the generated call surface: one variant per
//! method, tagged by its snake_case name. Only payload encoding is handled
//! here (MessagePack or JSON); framing belongs to the transport.
//!
//! ```text
//! request:  {"method": "echo_string", "params": {"value": "hi", "out_size": 10}}
//! response: {"method": "echo_string", "value": "hi"}
//! ```

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::types::{
    LargeBitMask, LargeEnum, OnOff, ResultCode, SimpleRef, SmallBitMask, SmallEnum, TheStruct,
};

/// Errors that can occur while encoding or decoding payloads
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("serialization error: {0}")]
    Serialization(#[from] rmp_serde::encode::Error),

    #[error("deserialization error: {0}")]
    Deserialization(#[from] rmp_serde::decode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// An inbound call with its typed arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "snake_case")]
pub enum EchoRequest {
    EchoSimple { value: i32 },
    EchoSmallEnum { value: SmallEnum },
    EchoLargeEnum { value: LargeEnum },
    EchoSmallBitMask { value: SmallBitMask },
    EchoLargeBitMask { value: LargeBitMask },
    EchoBoolean { value: bool },
    EchoResult { value: ResultCode },
    ReturnResult { value: ResultCode },
    EchoOnOff { value: OnOff },
    EchoDouble { value: f64 },
    EchoReference { value: SimpleRef },
    EchoString { value: String, out_size: usize },
    EchoArray { value: Vec<i64>, out_len: usize },
    EchoByteString { value: Vec<u8>, out_len: usize },
    EchoStruct { value: TheStruct },
    EchoStructArray { value: Vec<TheStruct>, out_len: usize },
    EchoTriggerEvent { cookie: i32 },
    EchoTriggerComplexEvent {
        cookie: i32,
        cookie_string: String,
        cookie_array: Vec<i16>,
    },
    ExitServer,
}

impl EchoRequest {
    /// Method name, as used on the wire
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
            Self::ExitServer => "exit_server",
        }
    }

    pub fn from_msgpack(data: &[u8]) -> Result<Self, ProtocolError> {
        from_msgpack(data)
    }

    pub fn to_msgpack(&self) -> Result<Vec<u8>, ProtocolError> {
        to_msgpack(self)
    }
}

/// The value delivered by a respond primitive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "value", rename_all = "snake_case")]
pub enum EchoResponse {
    EchoSimple(i32),
    EchoSmallEnum(SmallEnum),
    EchoLargeEnum(LargeEnum),
    EchoSmallBitMask(SmallBitMask),
    EchoLargeBitMask(LargeBitMask),
    EchoBoolean(bool),
    EchoResult(ResultCode),
    ReturnResult(ResultCode),
    EchoOnOff(OnOff),
    EchoDouble(f64),
    EchoReference(SimpleRef),
    EchoString(String),
    EchoArray(Vec<i64>),
    EchoByteString(Vec<u8>),
    EchoStruct(TheStruct),
    EchoStructArray(Vec<TheStruct>),
    EchoTriggerEvent,
    EchoTriggerComplexEvent,
}

impl EchoResponse {
    pub fn from_msgpack(data: &[u8]) -> Result<Self, ProtocolError> {
        from_msgpack(data)
    }

    pub fn to_msgpack(&self) -> Result<Vec<u8>, ProtocolError> {
        to_msgpack(self)
    }
}

fn to_msgpack<T: Serialize>(value: &T) -> Result<Vec<u8>, ProtocolError> {
    Ok(rmp_serde::to_vec_named(value)?)
}

fn from_msgpack<T: DeserializeOwned>(data: &[u8]) -> Result<T, ProtocolError> {
    Ok(rmp_serde::from_slice(data)?)
}
