//! Bootstrap a client against an in-process stub transport and walk the
//! synthesized proxy surface.
//!
//! Run with `cargo run --example basic_usage`.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;

use periscope::{
    CallObject, CallResult, Client, Result, RpcError, StreamHandle, Transport, TypeDescriptor,
    ValueCodec,
};

/// A tiny in-process server: answers a fixed set of procedures.
struct StubTransport;

#[async_trait]
impl Transport for StubTransport {
    async fn send_call(&self, call: CallObject) -> Result<CallResult> {
        let respond = |v: Value| CallResult::single(Bytes::from(serde_json::to_vec(&v).unwrap()));
        match (call.service.as_str(), call.procedure.as_str()) {
            ("KRPC", "GetServices") => Ok(respond(serde_json::json!({
                "services": [
                    {"name": "KRPC"},
                    {
                        "name": "SpaceCenter",
                        "procedures": [
                            {"name": "get_ActiveVessel", "return_type": {"code": "CLASS", "service": "SpaceCenter", "name": "Vessel"}},
                            {"name": "Vessel_get_Name", "parameters": [{"name": "this", "type": {"code": "CLASS", "service": "SpaceCenter", "name": "Vessel"}}], "return_type": {"code": "STRING"}}
                        ],
                        "classes": [{"name": "Vessel"}],
                        "enumerations": [
                            {"name": "GameMode", "values": [{"name": "Sandbox"}, {"name": "Career"}]}
                        ]
                    }
                ]
            }))),
            ("SpaceCenter", "get_ActiveVessel") => Ok(respond(serde_json::json!(1))),
            ("SpaceCenter", "Vessel_get_Name") => Ok(respond(serde_json::json!("Kerbal 1"))),
            _ => Err(RpcError::transport(format!(
                "unhandled procedure {}.{}",
                call.service, call.procedure
            ))),
        }
    }

    async fn open_stream(&self, _call: CallObject) -> Result<StreamHandle> {
        Err(RpcError::transport("streams not supported by this stub"))
    }

    async fn close_stream(&self, _id: u64) -> Result<()> {
        Ok(())
    }
}

/// JSON passthrough codec.
struct JsonCodec;

impl ValueCodec for JsonCodec {
    fn encode(&self, value: &Value, _ty: &TypeDescriptor) -> Result<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(value)?))
    }

    fn decode(&self, wire: &Bytes, _ty: &TypeDescriptor) -> Result<Value> {
        Ok(serde_json::from_slice(wire)?)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "periscope=debug".into()),
        )
        .init();

    let client = Client::bootstrap(Arc::new(StubTransport), Arc::new(JsonCodec)).await?;

    let space_center = client.service("SpaceCenter")?;
    println!("services: {:?}", client.service_names().collect::<Vec<_>>());

    let vessel_id = space_center.get("activeVessel").await?;
    let vessel = space_center
        .class("Vessel")?
        .instance(vessel_id.as_u64().unwrap_or_default());
    println!("active vessel: {}", vessel.get("name").await?);

    let game_mode = space_center.enumeration("GameMode")?;
    println!(
        "game modes: {:?}",
        game_mode.names().collect::<Vec<_>>()
    );

    Ok(())
}
