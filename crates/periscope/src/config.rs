//! Centralized configuration for the periscope client runtime.
//!
//! Constants only: the control-service procedure names the runtime depends
//! on before any descriptor has been ingested, and the naming-convention
//! markers the resolver classifies procedure names with.

/// Built-in control service configuration.
///
/// These procedures are always present on the server regardless of
/// descriptor content. Once descriptors are ingested they also resolve as
/// ordinary plain procedures of the control service.
pub struct ControlConfig;

impl ControlConfig {
    /// Name of the service-management service.
    pub const SERVICE: &'static str = "KRPC";
    /// Returns the opaque identifier for the current client.
    pub const GET_CLIENT_ID: &'static str = "GetClientID";
    /// Returns the structured server-status record.
    pub const GET_STATUS: &'static str = "GetStatus";
    /// Returns the full descriptor set for all services.
    pub const GET_SERVICES: &'static str = "GetServices";
    /// Opens a server-side value subscription for an encoded call.
    pub const ADD_STREAM: &'static str = "AddStream";
    /// Closes a server-side value subscription by id.
    pub const REMOVE_STREAM: &'static str = "RemoveStream";
}

/// Procedure naming conventions.
///
/// A procedure name is classified by these fixed markers; see
/// `schema::resolve` for the ordered rules.
pub struct NamingConfig;

impl NamingConfig {
    pub const SEPARATOR: char = '_';
    pub const GETTER_MARKER: &'static str = "get_";
    pub const SETTER_MARKER: &'static str = "set_";
    pub const STATIC_MARKER: &'static str = "static_";
}

/// Stream plumbing configuration.
pub struct StreamConfig;

impl StreamConfig {
    /// Bound of the per-subscription push channel. The server coalesces
    /// updates, so a small buffer is enough; the consumer only ever needs
    /// the latest value.
    pub const CHANNEL_CAPACITY: usize = 32;
}
