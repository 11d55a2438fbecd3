//! Proxy synthesis.
//!
//! Turns indexed descriptor tables plus resolved procedure roles into the
//! callable surface: one [`ServiceProxy`] per service and one
//! [`ClassDefinition`] per remote class, each holding a fixed operation
//! table built once at ingestion. No partially built service is ever
//! exposed: any ingestion error aborts the whole build.

pub mod class;
pub mod defs;
pub mod registry;
pub mod stream;

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;
use tracing::{debug, warn};

use crate::codec::{self, ValueCodec};
use crate::error::{Result, RpcError};
use crate::schema::resolve::{resolve_procedure, ProcedureRole, ResolvedProcedure};
use crate::schema::tables::ServiceTables;
use crate::schema::{ProcedureDescriptor, ServiceDescriptor};
use crate::transport::{CallObject, Transport};

pub use class::{ClassDefinition, RemoteObject};
pub use defs::{EnumDefinition, ExceptionDefinition};
pub use registry::ObjectRegistry;
pub use stream::{StreamCache, StreamObserver, StreamUpdate, Subscription};

use stream::StreamDecoder;

/// Shared per-session state: the two external collaborators plus the
/// identity registry. Scoped to one client session, never global.
pub(crate) struct SessionCore {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) codec: Arc<dyn ValueCodec>,
    pub(crate) registry: ObjectRegistry,
}

impl SessionCore {
    pub(crate) fn new(transport: Arc<dyn Transport>, codec: Arc<dyn ValueCodec>) -> Self {
        Self {
            transport,
            codec,
            registry: ObjectRegistry::new(),
        }
    }
}

/// One bound remote operation: a resolved procedure closed over the
/// session. Invocation encodes, sends and decodes in one step.
pub struct Operation {
    service: String,
    procedure: Arc<ProcedureDescriptor>,
    core: Arc<SessionCore>,
}

impl Operation {
    fn new(service: &str, procedure: Arc<ProcedureDescriptor>, core: Arc<SessionCore>) -> Self {
        Self {
            service: service.to_string(),
            procedure,
            core,
        }
    }

    pub fn procedure_name(&self) -> &str {
        &self.procedure.name
    }

    pub fn documentation(&self) -> &str {
        &self.procedure.documentation
    }

    /// Encode the arguments, send the call, decode the result.
    pub(crate) async fn invoke(&self, args: &[Value]) -> Result<Option<Value>> {
        let call = self.build_call(args)?;
        debug!(service = %self.service, procedure = %self.procedure.name, "invoking remote procedure");
        let result = self.core.transport.send_call(call).await?;
        codec::decode_return(result, &self.procedure, self.core.codec.as_ref())
    }

    /// Encode the arguments into a transport-ready call without sending
    /// it. Used to open subscriptions.
    pub(crate) fn build_call(&self, args: &[Value]) -> Result<CallObject> {
        codec::encode_call(&self.service, &self.procedure, args, self.core.codec.as_ref())
    }

    /// Decoder for pushed values, bound to this operation's return type.
    pub(crate) fn stream_decoder(&self) -> StreamDecoder {
        let codec = Arc::clone(&self.core.codec);
        let procedure = Arc::clone(&self.procedure);
        Arc::new(move |wire: &Bytes| match &procedure.return_type {
            Some(return_type) => {
                codec
                    .decode(wire, return_type)
                    .map_err(|e| RpcError::ValueDecoding {
                        procedure: procedure.name.clone(),
                        message: e.to_string(),
                    })
            }
            None => Err(RpcError::ValueDecoding {
                procedure: procedure.name.clone(),
                message: "streamed procedure declares no return type".to_string(),
            }),
        })
    }

    pub(crate) fn no_value_error(&self) -> RpcError {
        RpcError::ValueDecoding {
            procedure: self.procedure.name.clone(),
            message: "getter returned no value".to_string(),
        }
    }
}

impl std::fmt::Debug for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation")
            .field("service", &self.service)
            .field("procedure", &self.procedure.name)
            .finish()
    }
}

/// Capability record for one property: independent optional get/set.
///
/// A property with only a getter is read-only; only a setter, write-only.
/// Probing either capability never errors.
#[derive(Debug, Default)]
pub struct PropertySlot {
    pub(crate) get: Option<Operation>,
    pub(crate) set: Option<Operation>,
}

impl PropertySlot {
    pub fn readable(&self) -> bool {
        self.get.is_some()
    }

    pub fn writable(&self) -> bool {
        self.set.is_some()
    }
}

/// The root proxy for one service: plain operations, service-level
/// properties, and the nested enum/exception/class namespaces.
pub struct ServiceProxy {
    name: String,
    documentation: String,
    operations: HashMap<String, Operation>,
    properties: HashMap<String, PropertySlot>,
    enums: HashMap<String, EnumDefinition>,
    exceptions: HashMap<String, ExceptionDefinition>,
    classes: HashMap<String, Arc<ClassDefinition>>,
    cache: StreamCache,
    core: Arc<SessionCore>,
}

/// Per-class accumulation while walking the procedure list.
#[derive(Default)]
struct ClassBucket {
    methods: HashMap<String, Operation>,
    properties: HashMap<String, PropertySlot>,
    statics: HashMap<String, Operation>,
}

impl ServiceProxy {
    /// Build the full proxy surface for one service descriptor.
    pub(crate) fn build(descriptor: &ServiceDescriptor, core: Arc<SessionCore>) -> Result<Self> {
        let tables = ServiceTables::build(descriptor)?;
        let service = descriptor.name.clone();

        let mut enums = HashMap::with_capacity(descriptor.enumerations.len());
        for enumeration in &descriptor.enumerations {
            enums.insert(
                enumeration.name.clone(),
                EnumDefinition::build(&service, enumeration)?,
            );
        }

        let mut exceptions = HashMap::with_capacity(descriptor.exceptions.len());
        for exception in &descriptor.exceptions {
            exceptions.insert(
                exception.name.clone(),
                ExceptionDefinition::new(&service, exception),
            );
        }

        let mut operations: HashMap<String, Operation> = HashMap::new();
        let mut properties: HashMap<String, PropertySlot> = HashMap::new();
        let mut buckets: HashMap<String, ClassBucket> = descriptor
            .classes
            .iter()
            .map(|c| (c.name.clone(), ClassBucket::default()))
            .collect();

        for procedure in &descriptor.procedures {
            let resolved = resolve_procedure(&procedure.name, &tables);
            let indexed = tables
                .procedure(&procedure.name)
                .expect("procedure indexed during table build");
            let operation = Operation::new(&service, Arc::clone(indexed), Arc::clone(&core));

            match &resolved.role {
                ProcedureRole::ServicePlain => {
                    insert_operation(&mut operations, &resolved, operation, &service);
                }
                ProcedureRole::ServiceGetter => {
                    insert_accessor(&mut properties, &mut operations, &resolved, operation, true, &service);
                }
                ProcedureRole::ServiceSetter => {
                    insert_accessor(&mut properties, &mut operations, &resolved, operation, false, &service);
                }
                ProcedureRole::ClassMethod { class } => {
                    let bucket = buckets
                        .get_mut(class)
                        .expect("resolver only emits known classes");
                    insert_operation(&mut bucket.methods, &resolved, operation, class);
                }
                ProcedureRole::ClassGetter { class } => {
                    let bucket = buckets
                        .get_mut(class)
                        .expect("resolver only emits known classes");
                    insert_accessor(&mut bucket.properties, &mut bucket.methods, &resolved, operation, true, class);
                }
                ProcedureRole::ClassSetter { class } => {
                    let bucket = buckets
                        .get_mut(class)
                        .expect("resolver only emits known classes");
                    insert_accessor(&mut bucket.properties, &mut bucket.methods, &resolved, operation, false, class);
                }
                ProcedureRole::ClassStatic { class } => {
                    let bucket = buckets
                        .get_mut(class)
                        .expect("resolver only emits known classes");
                    // Statics keep the raw member remainder.
                    bucket.statics.insert(resolved.member.clone(), operation);
                }
            }
        }

        let mut classes = HashMap::with_capacity(descriptor.classes.len());
        for class_descriptor in &descriptor.classes {
            let bucket = buckets.remove(&class_descriptor.name).unwrap_or_default();
            classes.insert(
                class_descriptor.name.clone(),
                Arc::new(ClassDefinition {
                    service: service.clone(),
                    name: class_descriptor.name.clone(),
                    documentation: class_descriptor.documentation.clone(),
                    methods: bucket.methods,
                    properties: bucket.properties,
                    statics: bucket.statics,
                    core: Arc::clone(&core),
                }),
            );
        }

        debug!(
            service = %service,
            operations = operations.len(),
            properties = properties.len(),
            classes = classes.len(),
            "built service proxy"
        );

        Ok(Self {
            name: service,
            documentation: descriptor.documentation.clone(),
            operations,
            properties,
            enums,
            exceptions,
            classes,
            cache: StreamCache::new(),
            core,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn documentation(&self) -> &str {
        &self.documentation
    }

    /// Invoke a plain service operation under its normalized member name.
    pub async fn call(&self, member: &str, args: &[Value]) -> Result<Option<Value>> {
        let operation = self
            .operations
            .get(member)
            .ok_or_else(|| self.unknown(member))?;
        operation.invoke(args).await
    }

    /// Read a service-level property: stream cache first, direct call on
    /// a miss. The direct call does not populate the cache.
    pub async fn get(&self, member: &str) -> Result<Value> {
        let slot = self
            .properties
            .get(member)
            .ok_or_else(|| self.unknown(member))?;
        let getter = slot.get.as_ref().ok_or_else(|| self.unknown(member))?;

        if let Some(cached) = self.cache.read(member) {
            return Ok(cached);
        }

        getter
            .invoke(&[])
            .await?
            .ok_or_else(|| getter.no_value_error())
    }

    /// Write a service-level property. Always a remote call; never touches
    /// the cache.
    pub async fn set(&self, member: &str, value: Value) -> Result<()> {
        let slot = self
            .properties
            .get(member)
            .ok_or_else(|| self.unknown(member))?;
        let setter = slot.set.as_ref().ok_or_else(|| self.unknown(member))?;
        setter.invoke(&[value]).await.map(|_| ())
    }

    /// Open a value subscription for a service-level property.
    pub async fn stream(
        &self,
        member: &str,
        observer: Option<StreamObserver>,
    ) -> Result<Subscription> {
        let slot = self
            .properties
            .get(member)
            .ok_or_else(|| self.unknown(member))?;
        let getter = slot.get.as_ref().ok_or_else(|| self.unknown(member))?;

        let call = getter.build_call(&[])?;
        let handle = self.core.transport.open_stream(call).await?;
        Ok(self.cache.subscribe(
            member,
            handle,
            getter.stream_decoder(),
            observer,
            Arc::clone(&self.core.transport),
        ))
    }

    /// Capability record for a service-level property, if declared.
    pub fn property(&self, member: &str) -> Option<&PropertySlot> {
        self.properties.get(member)
    }

    /// The proxy class for a declared remote class.
    pub fn class(&self, name: &str) -> Result<&Arc<ClassDefinition>> {
        self.classes.get(name).ok_or_else(|| self.unknown(name))
    }

    /// A declared enumeration namespace.
    pub fn enumeration(&self, name: &str) -> Result<&EnumDefinition> {
        self.enums.get(name).ok_or_else(|| self.unknown(name))
    }

    /// A declared exception namespace.
    pub fn exception(&self, name: &str) -> Result<&ExceptionDefinition> {
        self.exceptions.get(name).ok_or_else(|| self.unknown(name))
    }

    pub fn operation_names(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }

    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    fn unknown(&self, member: &str) -> RpcError {
        RpcError::unknown_member(&self.name, member)
    }
}

impl std::fmt::Debug for ServiceProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceProxy")
            .field("name", &self.name)
            .field("operations", &self.operations.len())
            .field("properties", &self.properties.len())
            .field("classes", &self.classes.len())
            .finish()
    }
}

/// Insert under the normalized member, falling back to the raw member on a
/// collision so distinct raw names are never silently merged. A procedure
/// whose raw member is also taken is left unmapped, with a warning; it is
/// never allowed to displace an earlier entry.
fn insert_operation(
    table: &mut HashMap<String, Operation>,
    resolved: &ResolvedProcedure,
    operation: Operation,
    owner: &str,
) {
    use std::collections::hash_map::Entry;

    if !table.contains_key(&resolved.normalized) {
        table.insert(resolved.normalized.clone(), operation);
        return;
    }

    warn!(
        owner,
        procedure = %resolved.procedure,
        member = %resolved.normalized,
        "normalized member collision; exposing under raw member name"
    );
    match table.entry(resolved.member.clone()) {
        Entry::Vacant(slot) => {
            slot.insert(operation);
        }
        Entry::Occupied(_) => {
            warn!(
                owner,
                procedure = %resolved.procedure,
                member = %resolved.member,
                "raw member also taken; procedure left unmapped"
            );
        }
    }
}

/// Attach a getter or setter to its property slot. If the capability is
/// already occupied, the displaced procedure stays invocable under its raw
/// member name in the sibling operation table, subject to the same
/// no-overwrite guard as [`insert_operation`].
fn insert_accessor(
    properties: &mut HashMap<String, PropertySlot>,
    overflow: &mut HashMap<String, Operation>,
    resolved: &ResolvedProcedure,
    operation: Operation,
    getter: bool,
    owner: &str,
) {
    use std::collections::hash_map::Entry;

    let slot = properties.entry(resolved.normalized.clone()).or_default();
    let target = if getter { &mut slot.get } else { &mut slot.set };
    if target.is_none() {
        *target = Some(operation);
        return;
    }

    warn!(
        owner,
        procedure = %resolved.procedure,
        member = %resolved.normalized,
        "accessor collision; exposing under raw member name"
    );
    match overflow.entry(resolved.member.clone()) {
        Entry::Vacant(slot) => {
            slot.insert(operation);
        }
        Entry::Occupied(_) => {
            warn!(
                owner,
                procedure = %resolved.procedure,
                member = %resolved.member,
                "raw member also taken; procedure left unmapped"
            );
        }
    }
}
