//! Client session bootstrap and service lookup.
//!
//! A [`Client`] owns one session: the transport and codec collaborators,
//! the shared identity registry, and one [`ServiceProxy`] per ingested
//! service. Bootstrap fetches the descriptor set through the control
//! service and synthesizes every proxy before the client is handed out, so
//! a constructed client is always fully built.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use tracing::info;

use crate::codec::ValueCodec;
use crate::control::{self, ServerStatus};
use crate::error::{DefinitionKind, Result, RpcError};
use crate::proxy::{ServiceProxy, SessionCore};
use crate::schema::ServiceDescriptor;
use crate::transport::Transport;

pub struct Client {
    core: Arc<SessionCore>,
    services: HashMap<String, Arc<ServiceProxy>>,
}

impl Client {
    /// Connect-time bootstrap: fetch the full descriptor set from the
    /// server's control service and build every proxy from it.
    pub async fn bootstrap(
        transport: Arc<dyn Transport>,
        codec: Arc<dyn ValueCodec>,
    ) -> Result<Self> {
        let result = transport.send_call(control::get_services_call()).await?;
        let descriptors = control::decode_services(result, codec.as_ref())?;
        Self::from_descriptors(transport, codec, &descriptors)
    }

    /// Build a client from an already obtained descriptor set.
    ///
    /// Duplicate service names are an ingestion error; no partially built
    /// client escapes.
    pub fn from_descriptors(
        transport: Arc<dyn Transport>,
        codec: Arc<dyn ValueCodec>,
        descriptors: &[ServiceDescriptor],
    ) -> Result<Self> {
        let core = Arc::new(SessionCore::new(transport, codec));

        let mut services = HashMap::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let proxy = ServiceProxy::build(descriptor, Arc::clone(&core))?;
            if services
                .insert(descriptor.name.clone(), Arc::new(proxy))
                .is_some()
            {
                return Err(RpcError::DuplicateDefinition {
                    service: descriptor.name.clone(),
                    kind: DefinitionKind::Service,
                    name: descriptor.name.clone(),
                });
            }
        }

        info!(services = services.len(), "ingested service descriptors");
        Ok(Self { core, services })
    }

    /// The proxy for one ingested service.
    pub fn service(&self, name: &str) -> Result<&Arc<ServiceProxy>> {
        self.services
            .get(name)
            .ok_or_else(|| RpcError::UnknownService {
                name: name.to_string(),
            })
    }

    /// Names of all ingested services.
    pub fn service_names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }

    /// The server-assigned opaque identifier for this client.
    pub async fn client_id(&self) -> Result<Bytes> {
        let result = self
            .core
            .transport
            .send_call(control::get_client_id_call())
            .await?;
        control::decode_client_id(result)
    }

    /// The structured server-status record.
    pub async fn server_status(&self) -> Result<ServerStatus> {
        let result = self
            .core
            .transport
            .send_call(control::get_status_call())
            .await?;
        control::decode_status(result, self.core.codec.as_ref())
    }

    /// Number of live remote object instances in this session's registry.
    pub fn live_objects(&self) -> usize {
        self.core.registry.live_count()
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("services", &self.services.len())
            .finish()
    }
}
