//! Call encoding and result decoding.
//!
//! A pure mapping driven by descriptors: each positional argument is
//! transcoded against its declared parameter type, each result against the
//! declared return type. Byte-level transcoding of individual values is
//! the [`ValueCodec`] collaborator's job; this module owns arity checking,
//! error wrapping and the result-shape handling around it.

use bytes::Bytes;
use serde_json::Value;

use crate::error::{Result, RpcError};
use crate::schema::{ProcedureDescriptor, TypeDescriptor};
use crate::transport::{CallArgument, CallObject, CallResult};

/// Byte-level value transcoding collaborator.
///
/// Implementations interpret [`TypeDescriptor`]s; the runtime never does.
pub trait ValueCodec: Send + Sync {
    /// Encode a logical value under its declared type.
    fn encode(&self, value: &Value, ty: &TypeDescriptor) -> Result<Bytes>;

    /// Decode a wire value under its declared type.
    fn decode(&self, wire: &Bytes, ty: &TypeDescriptor) -> Result<Value>;
}

/// Encode a logical call into a transport-ready call object.
///
/// Fails with `ArityMismatch` before any value is encoded if the argument
/// count does not match the parameter count, and with `ArgumentEncoding`
/// if a value cannot be represented under its declared type.
pub fn encode_call(
    service: &str,
    procedure: &ProcedureDescriptor,
    args: &[Value],
    codec: &dyn ValueCodec,
) -> Result<CallObject> {
    if args.len() != procedure.parameters.len() {
        return Err(RpcError::ArityMismatch {
            procedure: procedure.name.clone(),
            expected: procedure.parameters.len(),
            actual: args.len(),
        });
    }

    let mut arguments = Vec::with_capacity(args.len());
    for (position, (value, parameter)) in args.iter().zip(&procedure.parameters).enumerate() {
        let wire = codec
            .encode(value, &parameter.param_type)
            .map_err(|e| RpcError::ArgumentEncoding {
                procedure: procedure.name.clone(),
                position,
                message: e.to_string(),
            })?;
        arguments.push(CallArgument {
            position: position as u32,
            value: wire,
        });
    }

    Ok(CallObject {
        service: service.to_string(),
        procedure: procedure.name.clone(),
        arguments,
    })
}

/// Decode a raw call result against the procedure's declared return type.
///
/// Yields `None` for procedures that declare no return type. Top-level and
/// per-result remote errors surface as `RpcError::Remote` either way.
pub fn decode_return(
    result: CallResult,
    procedure: &ProcedureDescriptor,
    codec: &dyn ValueCodec,
) -> Result<Option<Value>> {
    match &procedure.return_type {
        Some(return_type) => {
            let wire = take_single(result, &procedure.name)?.ok_or_else(|| {
                RpcError::ValueDecoding {
                    procedure: procedure.name.clone(),
                    message: "result carries no value".to_string(),
                }
            })?;
            let value =
                codec
                    .decode(&wire, return_type)
                    .map_err(|e| RpcError::ValueDecoding {
                        procedure: procedure.name.clone(),
                        message: e.to_string(),
                    })?;
            Ok(Some(value))
        }
        None => {
            // No declared return, but a per-result error must still surface.
            take_single(result, &procedure.name).map(|_| None)
        }
    }
}

/// Unwrap the single result position of a call exchange, surfacing the
/// top-level and per-result errors in that order.
pub(crate) fn take_single(result: CallResult, procedure: &str) -> Result<Option<Bytes>> {
    if let Some(error) = result.error {
        return Err(error.into());
    }

    match result.results.into_iter().next() {
        Some(first) => {
            if let Some(error) = first.error {
                return Err(error.into());
            }
            Ok(first.value)
        }
        None => Err(RpcError::ValueDecoding {
            procedure: procedure.to_string(),
            message: "empty result set".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{ProcedureResult, RemoteErrorInfo};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Trivial codec: JSON bytes, type descriptors ignored. Counts encodes
    /// so arity tests can assert the codec was never consulted.
    #[derive(Default)]
    struct JsonCodec {
        encodes: AtomicUsize,
    }

    impl ValueCodec for JsonCodec {
        fn encode(&self, value: &Value, _ty: &TypeDescriptor) -> Result<Bytes> {
            self.encodes.fetch_add(1, Ordering::Relaxed);
            Ok(Bytes::from(serde_json::to_vec(value)?))
        }

        fn decode(&self, wire: &Bytes, _ty: &TypeDescriptor) -> Result<Value> {
            Ok(serde_json::from_slice(wire)?)
        }
    }

    fn procedure(parameters: usize, returns: bool) -> ProcedureDescriptor {
        serde_json::from_value(serde_json::json!({
            "name": "SetThrottle",
            "parameters": (0..parameters)
                .map(|i| serde_json::json!({"name": format!("p{i}"), "type": {"code": "DOUBLE"}}))
                .collect::<Vec<_>>(),
            "return_type": if returns { Some(serde_json::json!({"code": "DOUBLE"})) } else { None }
        }))
        .unwrap()
    }

    #[test]
    fn test_encode_call_positions_arguments() {
        let codec = JsonCodec::default();
        let call = encode_call(
            "SpaceCenter",
            &procedure(2, false),
            &[serde_json::json!(0.5), serde_json::json!(1.0)],
            &codec,
        )
        .unwrap();

        assert_eq!(call.service, "SpaceCenter");
        assert_eq!(call.procedure, "SetThrottle");
        assert_eq!(call.arguments.len(), 2);
        assert_eq!(call.arguments[0].position, 0);
        assert_eq!(call.arguments[1].position, 1);
    }

    #[test]
    fn test_arity_mismatch_checked_before_encoding() {
        let codec = JsonCodec::default();
        let err = encode_call(
            "SpaceCenter",
            &procedure(2, false),
            &[serde_json::json!(0.5)],
            &codec,
        )
        .unwrap_err();

        match err {
            RpcError::ArityMismatch {
                expected, actual, ..
            } => {
                assert_eq!(expected, 2);
                assert_eq!(actual, 1);
            }
            other => panic!("Expected ArityMismatch, got: {:?}", other),
        }
        assert_eq!(codec.encodes.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_decode_return_with_value() {
        let codec = JsonCodec::default();
        let result = CallResult::single(Bytes::from_static(b"0.75"));
        let value = decode_return(result, &procedure(0, true), &codec).unwrap();
        assert_eq!(value, Some(serde_json::json!(0.75)));
    }

    #[test]
    fn test_decode_return_void() {
        let codec = JsonCodec::default();
        let value = decode_return(CallResult::void(), &procedure(0, false), &codec).unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn test_top_level_error_surfaces() {
        let codec = JsonCodec::default();
        let result = CallResult::failed(RemoteErrorInfo {
            service: "SpaceCenter".into(),
            name: "InvalidOperationException".into(),
            description: "boom".into(),
        });

        let err = decode_return(result, &procedure(0, true), &codec).unwrap_err();
        assert!(err.is_remote());
    }

    #[test]
    fn test_per_result_error_surfaces_even_without_return_type() {
        let codec = JsonCodec::default();
        let result = CallResult {
            error: None,
            results: vec![ProcedureResult {
                error: Some(RemoteErrorInfo {
                    service: String::new(),
                    name: String::new(),
                    description: "setter rejected".into(),
                }),
                value: None,
            }],
        };

        let err = decode_return(result, &procedure(0, false), &codec).unwrap_err();
        assert!(err.is_remote());
    }
}
