//! Reflective RPC client runtime.
//!
//! Periscope builds a callable client surface from a server's own
//! description of itself. At connect time the server reports its services
//! as descriptors (procedures, classes, enumerations, exceptions); this
//! crate ingests those descriptors and synthesizes proxies, so remote calls
//! read like local ones without any generated code.
//!
//! The runtime stands on two external collaborators supplied at
//! construction: a [`Transport`] that moves encoded calls and subscription
//! pushes, and a [`ValueCodec`] that transcodes individual values against
//! their declared types. Everything in between is this crate: descriptor
//! ingestion, procedure-name classification, proxy synthesis, per-instance
//! identity, and stream-backed property caching.
//!
//! ```rust,ignore
//! use periscope::Client;
//!
//! let client = Client::bootstrap(transport, codec).await?;
//! let space_center = client.service("SpaceCenter")?;
//!
//! let vessel_id = space_center.get("activeVessel").await?;
//! let vessel = space_center
//!     .class("Vessel")?
//!     .instance(vessel_id.as_u64().unwrap_or_default());
//!
//! let name = vessel.get("name").await?;
//! let subscription = vessel.stream("name", None).await?;
//! // Later reads of `name` are served from the subscription's cache.
//! subscription.close().await?;
//! ```

pub mod client;
pub mod codec;
pub mod config;
pub mod control;
pub mod error;
pub mod proxy;
pub mod schema;
pub mod transport;

pub use client::Client;
pub use codec::ValueCodec;
pub use config::{ControlConfig, NamingConfig, StreamConfig};
pub use control::ServerStatus;
pub use error::{DefinitionKind, Result, RpcError};
pub use proxy::{
    ClassDefinition, EnumDefinition, ExceptionDefinition, ObjectRegistry, PropertySlot,
    RemoteObject, ServiceProxy, StreamCache, StreamObserver, StreamUpdate, Subscription,
};
pub use schema::resolve::{camel_case, resolve_procedure, ProcedureRole, ResolvedProcedure};
pub use schema::{
    ClassDescriptor, EnumDescriptor, EnumValueDescriptor, ExceptionDescriptor,
    ParameterDescriptor, ProcedureDescriptor, ServiceDescriptor, TypeDescriptor,
};
pub use transport::{
    CallArgument, CallObject, CallResult, ProcedureResult, RemoteErrorInfo, StreamEvent,
    StreamHandle, Transport,
};
