//! Control service calls.
//!
//! The server-management procedures that exist before any descriptor has
//! been ingested: client identification, status, descriptor retrieval and
//! subscription management. These are built as plain [`CallObject`]s from
//! fixed names (see [`ControlConfig`]) so the bootstrap path has no
//! dependency on proxy synthesis.

use bytes::Bytes;
use serde::Deserialize;
use serde_json::Value;

use crate::codec::{self, ValueCodec};
use crate::config::ControlConfig;
use crate::error::{Result, RpcError};
use crate::schema::{ServiceDescriptor, TypeDescriptor};
use crate::transport::{CallArgument, CallObject, CallResult};

/// Structured server-status record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerStatus {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub bytes_read: u64,
    #[serde(default)]
    pub bytes_written: u64,
    #[serde(default)]
    pub rpcs_executed: u64,
    #[serde(default)]
    pub rpc_rate: f64,
    #[serde(default)]
    pub stream_rpcs: u64,
    #[serde(default)]
    pub stream_rpcs_executed: u64,
    #[serde(default)]
    pub stream_rpc_rate: f64,
}

/// Wire shape of the descriptor-set result.
#[derive(Debug, Deserialize)]
struct ServicesRecord {
    #[serde(default)]
    services: Vec<ServiceDescriptor>,
}

/// The call that fetches the opaque identifier for this client.
pub fn get_client_id_call() -> CallObject {
    CallObject::empty(ControlConfig::SERVICE, ControlConfig::GET_CLIENT_ID)
}

/// The call that fetches the structured server-status record.
pub fn get_status_call() -> CallObject {
    CallObject::empty(ControlConfig::SERVICE, ControlConfig::GET_STATUS)
}

/// The call that fetches the full descriptor set for every service.
pub fn get_services_call() -> CallObject {
    CallObject::empty(ControlConfig::SERVICE, ControlConfig::GET_SERVICES)
}

/// The call that opens a server-side value subscription.
///
/// The argument is the subscribed call itself, already encoded into its
/// wire message form by the transport's codec layer.
pub fn add_stream_call(encoded_inner: Bytes) -> CallObject {
    CallObject {
        service: ControlConfig::SERVICE.to_string(),
        procedure: ControlConfig::ADD_STREAM.to_string(),
        arguments: vec![CallArgument {
            position: 0,
            value: encoded_inner,
        }],
    }
}

/// The call that closes a server-side value subscription by id.
pub fn remove_stream_call(id: u64, codec: &dyn ValueCodec) -> Result<CallObject> {
    let wire = codec.encode(&Value::from(id), &TypeDescriptor::scalar("UINT64"))?;
    Ok(CallObject {
        service: ControlConfig::SERVICE.to_string(),
        procedure: ControlConfig::REMOVE_STREAM.to_string(),
        arguments: vec![CallArgument {
            position: 0,
            value: wire,
        }],
    })
}

/// Decode the result of [`get_client_id_call`]: the raw identifier bytes.
pub fn decode_client_id(result: CallResult) -> Result<Bytes> {
    codec::take_single(result, ControlConfig::GET_CLIENT_ID)?.ok_or_else(|| {
        RpcError::ValueDecoding {
            procedure: ControlConfig::GET_CLIENT_ID.to_string(),
            message: "result carries no value".to_string(),
        }
    })
}

/// Decode the result of [`get_status_call`].
pub fn decode_status(result: CallResult, codec: &dyn ValueCodec) -> Result<ServerStatus> {
    let value = decode_message(result, codec, ControlConfig::GET_STATUS, "Status")?;
    serde_json::from_value(value).map_err(|e| RpcError::ValueDecoding {
        procedure: ControlConfig::GET_STATUS.to_string(),
        message: e.to_string(),
    })
}

/// Decode the result of [`get_services_call`] into the descriptor set.
pub fn decode_services(result: CallResult, codec: &dyn ValueCodec) -> Result<Vec<ServiceDescriptor>> {
    let value = decode_message(result, codec, ControlConfig::GET_SERVICES, "Services")?;
    let record: ServicesRecord =
        serde_json::from_value(value).map_err(|e| RpcError::ValueDecoding {
            procedure: ControlConfig::GET_SERVICES.to_string(),
            message: e.to_string(),
        })?;
    Ok(record.services)
}

fn decode_message(
    result: CallResult,
    codec: &dyn ValueCodec,
    procedure: &str,
    message: &str,
) -> Result<Value> {
    let wire = codec::take_single(result, procedure)?.ok_or_else(|| RpcError::ValueDecoding {
        procedure: procedure.to_string(),
        message: "result carries no value".to_string(),
    })?;
    codec
        .decode(
            &wire,
            &TypeDescriptor::qualified("MESSAGE", ControlConfig::SERVICE, message),
        )
        .map_err(|e| RpcError::ValueDecoding {
            procedure: procedure.to_string(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct JsonCodec;

    impl ValueCodec for JsonCodec {
        fn encode(&self, value: &Value, _ty: &TypeDescriptor) -> Result<Bytes> {
            Ok(Bytes::from(serde_json::to_vec(value)?))
        }

        fn decode(&self, wire: &Bytes, _ty: &TypeDescriptor) -> Result<Value> {
            Ok(serde_json::from_slice(wire)?)
        }
    }

    #[test]
    fn test_call_builders_target_fixed_procedures() {
        assert_eq!(get_client_id_call().service, "KRPC");
        assert_eq!(get_client_id_call().procedure, "GetClientID");
        assert_eq!(get_status_call().procedure, "GetStatus");
        assert_eq!(get_services_call().procedure, "GetServices");

        for call in [get_client_id_call(), get_status_call(), get_services_call()] {
            assert!(call.arguments.is_empty());
        }
    }

    #[test]
    fn test_add_stream_wraps_encoded_call() {
        let inner = Bytes::from_static(b"encoded call message");
        let call = add_stream_call(inner.clone());
        assert_eq!(call.service, "KRPC");
        assert_eq!(call.procedure, "AddStream");
        assert_eq!(call.arguments.len(), 1);
        assert_eq!(call.arguments[0].position, 0);
        assert_eq!(call.arguments[0].value, inner);
    }

    #[test]
    fn test_remove_stream_encodes_id() {
        let call = remove_stream_call(42, &JsonCodec).unwrap();
        assert_eq!(call.procedure, "RemoveStream");
        assert_eq!(call.arguments[0].value.as_ref(), b"42");
    }

    #[test]
    fn test_decode_client_id() {
        let result = CallResult::single(Bytes::from_static(b"\x01\x02\x03"));
        let id = decode_client_id(result).unwrap();
        assert_eq!(id.as_ref(), b"\x01\x02\x03");
    }

    #[test]
    fn test_decode_status() {
        let wire = serde_json::to_vec(&serde_json::json!({
            "version": "0.5.4",
            "bytes_read": 128,
            "rpcs_executed": 7
        }))
        .unwrap();
        let status = decode_status(CallResult::single(Bytes::from(wire)), &JsonCodec).unwrap();
        assert_eq!(status.version, "0.5.4");
        assert_eq!(status.bytes_read, 128);
        assert_eq!(status.rpcs_executed, 7);
        assert_eq!(status.stream_rpcs, 0);
    }

    #[test]
    fn test_decode_services() {
        let wire = serde_json::to_vec(&serde_json::json!({
            "services": [
                {"name": "KRPC"},
                {"name": "SpaceCenter", "classes": [{"name": "Vessel"}]}
            ]
        }))
        .unwrap();
        let services =
            decode_services(CallResult::single(Bytes::from(wire)), &JsonCodec).unwrap();
        assert_eq!(services.len(), 2);
        assert_eq!(services[1].name, "SpaceCenter");
        assert_eq!(services[1].classes[0].name, "Vessel");
    }

    #[test]
    fn test_decode_status_surfaces_remote_error() {
        let result = CallResult::failed(crate::transport::RemoteErrorInfo {
            service: String::new(),
            name: String::new(),
            description: "server shutting down".into(),
        });
        assert!(decode_status(result, &JsonCodec).unwrap_err().is_remote());
    }
}
