//! Proxy classes and remote object instances.
//!
//! One [`ClassDefinition`] per declared remote class, with a fixed
//! operation table built at ingestion. Instances are obtained through
//! [`ClassDefinition::instance`], which delegates to the identity registry
//! so construction is idempotent per id.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{Result, RpcError};
use crate::proxy::stream::{StreamCache, StreamObserver, Subscription};
use crate::proxy::{Operation, PropertySlot, SessionCore};

/// A remote class: fixed tables of instance methods, instance properties
/// and statics, plus the idempotent instance constructor.
pub struct ClassDefinition {
    pub(crate) service: String,
    pub(crate) name: String,
    pub(crate) documentation: String,
    pub(crate) methods: HashMap<String, Operation>,
    pub(crate) properties: HashMap<String, PropertySlot>,
    pub(crate) statics: HashMap<String, Operation>,
    pub(crate) core: Arc<SessionCore>,
}

impl ClassDefinition {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn documentation(&self) -> &str {
        &self.documentation
    }

    /// The canonical instance for `id`. Two calls with the same id return
    /// the same instance, so remote mutation observed through one
    /// reference is visible through any other.
    pub fn instance(self: &Arc<Self>, id: u64) -> Arc<RemoteObject> {
        self.core.registry.resolve(self, id)
    }

    /// Invoke a static operation. Statics keep their raw member name.
    pub async fn call_static(&self, member: &str, args: &[Value]) -> Result<Option<Value>> {
        let operation = self
            .statics
            .get(member)
            .ok_or_else(|| self.unknown(member))?;
        operation.invoke(args).await
    }

    /// Capability record for an instance property, if declared.
    pub fn property(&self, member: &str) -> Option<&PropertySlot> {
        self.properties.get(member)
    }

    /// Normalized instance method names.
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    /// Static member names (raw form).
    pub fn static_names(&self) -> impl Iterator<Item = &str> {
        self.statics.keys().map(String::as_str)
    }

    /// Normalized instance property names.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    fn unknown(&self, member: &str) -> RpcError {
        RpcError::unknown_member(format!("{}.{}", self.service, self.name), member)
    }
}

impl std::fmt::Debug for ClassDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassDefinition")
            .field("service", &self.service)
            .field("name", &self.name)
            .field("methods", &self.methods.len())
            .field("properties", &self.properties.len())
            .field("statics", &self.statics.len())
            .finish()
    }
}

/// A local proxy for one remote entity, identified by a numeric id scoped
/// to its class. Owns the instance-level stream cache.
pub struct RemoteObject {
    class: Arc<ClassDefinition>,
    id: u64,
    cache: StreamCache,
}

impl RemoteObject {
    pub(crate) fn new(class: Arc<ClassDefinition>, id: u64) -> Self {
        Self {
            class,
            id,
            cache: StreamCache::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn class_name(&self) -> &str {
        &self.class.name
    }

    pub fn class(&self) -> &Arc<ClassDefinition> {
        &self.class
    }

    /// The instance id as the implicit first argument of instance calls.
    fn this_value(&self) -> Value {
        Value::from(self.id)
    }

    /// Invoke an instance method under its normalized member name.
    pub async fn call(&self, member: &str, args: &[Value]) -> Result<Option<Value>> {
        let operation = self
            .class
            .methods
            .get(member)
            .ok_or_else(|| self.unknown(member))?;

        let mut full = Vec::with_capacity(args.len() + 1);
        full.push(self.this_value());
        full.extend_from_slice(args);
        operation.invoke(&full).await
    }

    /// Read a getter-backed property.
    ///
    /// Served from the stream cache when a subscription is active;
    /// otherwise a direct remote call, which does not populate the cache.
    pub async fn get(&self, member: &str) -> Result<Value> {
        let slot = self
            .class
            .properties
            .get(member)
            .ok_or_else(|| self.unknown(member))?;
        let getter = slot.get.as_ref().ok_or_else(|| self.unknown(member))?;

        if let Some(cached) = self.cache.read(member) {
            return Ok(cached);
        }

        getter
            .invoke(&[self.this_value()])
            .await?
            .ok_or_else(|| getter.no_value_error())
    }

    /// Write a setter-backed property. Always issues the remote call and
    /// never touches the cache.
    pub async fn set(&self, member: &str, value: Value) -> Result<()> {
        let slot = self
            .class
            .properties
            .get(member)
            .ok_or_else(|| self.unknown(member))?;
        let setter = slot.set.as_ref().ok_or_else(|| self.unknown(member))?;

        setter.invoke(&[self.this_value(), value]).await.map(|_| ())
    }

    /// Open a value subscription for a getter-backed property and wire it
    /// into this instance's stream cache.
    pub async fn stream(
        &self,
        member: &str,
        observer: Option<StreamObserver>,
    ) -> Result<Subscription> {
        let slot = self
            .class
            .properties
            .get(member)
            .ok_or_else(|| self.unknown(member))?;
        let getter = slot.get.as_ref().ok_or_else(|| self.unknown(member))?;

        let call = getter.build_call(&[self.this_value()])?;
        let handle = self.class.core.transport.open_stream(call).await?;
        Ok(self.cache.subscribe(
            member,
            handle,
            getter.stream_decoder(),
            observer,
            Arc::clone(&self.class.core.transport),
        ))
    }

    /// Capability record for a property, if declared.
    pub fn property(&self, member: &str) -> Option<&PropertySlot> {
        self.class.properties.get(member)
    }

    fn unknown(&self, member: &str) -> RpcError {
        RpcError::unknown_member(
            format!("{}.{}#{}", self.class.service, self.class.name, self.id),
            member,
        )
    }
}

impl std::fmt::Debug for RemoteObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteObject")
            .field("class", &self.class.name)
            .field("id", &self.id)
            .finish()
    }
}
