//! Transport collaborator interface and wire-facing call shapes.
//!
//! The runtime never touches sockets. It hands a fully encoded
//! [`CallObject`] to a [`Transport`] implementation and gets back a
//! [`CallResult`]; subscriptions arrive as a bounded channel of pushed wire
//! values. Connection lifecycle, framing, retries and timeouts all live on
//! the other side of this trait and surface here as ordinary failures.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::{Result, RpcError};

/// A transport-ready remote procedure call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallObject {
    pub service: String,
    pub procedure: String,
    pub arguments: Vec<CallArgument>,
}

impl CallObject {
    /// A call with no arguments.
    pub fn empty(service: impl Into<String>, procedure: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            procedure: procedure.into(),
            arguments: Vec::new(),
        }
    }
}

/// One positional argument, already encoded by the value codec.
#[derive(Debug, Clone, PartialEq)]
pub struct CallArgument {
    pub position: u32,
    pub value: Bytes,
}

/// Error information reported by the remote side, either for the whole
/// call or for one result position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteErrorInfo {
    /// Service that declared the exception, empty for generic failures.
    pub service: String,
    /// Exception name, empty for generic failures.
    pub name: String,
    pub description: String,
}

impl From<RemoteErrorInfo> for RpcError {
    fn from(info: RemoteErrorInfo) -> Self {
        RpcError::Remote {
            service: info.service,
            name: info.name,
            description: info.description,
        }
    }
}

/// Outcome of one result position.
#[derive(Debug, Clone, Default)]
pub struct ProcedureResult {
    pub error: Option<RemoteErrorInfo>,
    pub value: Option<Bytes>,
}

/// Outcome of a whole call exchange.
#[derive(Debug, Clone, Default)]
pub struct CallResult {
    /// Top-level error; set when the call never reached its procedure.
    pub error: Option<RemoteErrorInfo>,
    pub results: Vec<ProcedureResult>,
}

impl CallResult {
    /// A successful result carrying one encoded value.
    pub fn single(value: Bytes) -> Self {
        Self {
            error: None,
            results: vec![ProcedureResult {
                error: None,
                value: Some(value),
            }],
        }
    }

    /// A successful result carrying nothing (procedures with no return).
    pub fn void() -> Self {
        Self {
            error: None,
            results: vec![ProcedureResult::default()],
        }
    }

    /// A failed exchange.
    pub fn failed(error: RemoteErrorInfo) -> Self {
        Self {
            error: Some(error),
            results: Vec::new(),
        }
    }
}

/// One push event on an open subscription channel.
#[derive(Debug)]
pub enum StreamEvent {
    /// A new wire value for the subscribed call.
    Value(Bytes),
    /// The server closed the subscription.
    Closed,
}

/// Handle to an open server-side value subscription.
///
/// The channel should be bounded with
/// [`StreamConfig::CHANNEL_CAPACITY`](crate::config::StreamConfig::CHANNEL_CAPACITY);
/// the consumer only ever needs the latest value. Dropping the receiver
/// does not close the subscription on the server; that requires
/// [`Transport::close_stream`].
#[derive(Debug)]
pub struct StreamHandle {
    /// Server-assigned subscription id.
    pub id: u64,
    /// Pushed values, in arrival order. The transport is the single writer.
    pub values: mpsc::Receiver<StreamEvent>,
}

/// The narrow interface the runtime consumes from the network layer.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one call and wait for its result exchange.
    async fn send_call(&self, call: CallObject) -> Result<CallResult>;

    /// Open a server-side value subscription for the given call.
    ///
    /// Implementations build this on the control service's `AddStream`
    /// procedure (see `control::add_stream_call`).
    async fn open_stream(&self, call: CallObject) -> Result<StreamHandle>;

    /// Close a previously opened subscription. Must be idempotent.
    async fn close_stream(&self, id: u64) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_result_constructors() {
        let ok = CallResult::single(Bytes::from_static(b"x"));
        assert!(ok.error.is_none());
        assert_eq!(ok.results.len(), 1);
        assert!(ok.results[0].value.is_some());

        let void = CallResult::void();
        assert!(void.results[0].value.is_none());
        assert!(void.results[0].error.is_none());

        let failed = CallResult::failed(RemoteErrorInfo {
            service: "SpaceCenter".into(),
            name: "InvalidOperationException".into(),
            description: "no vessel".into(),
        });
        assert!(failed.error.is_some());
    }

    #[test]
    fn test_remote_error_info_converts_to_typed_error() {
        let err: RpcError = RemoteErrorInfo {
            service: "SpaceCenter".into(),
            name: "InvalidOperationException".into(),
            description: "no vessel".into(),
        }
        .into();

        match err {
            RpcError::Remote { service, name, .. } => {
                assert_eq!(service, "SpaceCenter");
                assert_eq!(name, "InvalidOperationException");
            }
            other => panic!("Expected Remote, got: {:?}", other),
        }
    }
}
