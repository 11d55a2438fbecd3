//! Identity registry for remote object references.
//!
//! One canonical local instance per `(service, class, id)`. The registry
//! holds weak back-references: identity is guaranteed for as long as any
//! caller keeps the instance alive, and instances are reclaimed when the
//! last strong reference drops. Ids are scoped per service-class, not
//! globally: class names are unique only within one service, so two
//! services may each declare a class of the same name.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use tracing::debug;

use crate::proxy::class::{ClassDefinition, RemoteObject};

#[derive(Default)]
pub struct ObjectRegistry {
    instances: Mutex<HashMap<(String, String, u64), Weak<RemoteObject>>>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the canonical instance for `(service, class, id)`, creating
    /// it on first reference. Idempotent: repeated calls return
    /// pointer-equal `Arc`s while any strong reference is alive.
    pub(crate) fn resolve(&self, class: &Arc<ClassDefinition>, id: u64) -> Arc<RemoteObject> {
        let key = (class.service.clone(), class.name().to_string(), id);
        let mut instances = self
            .instances
            .lock()
            .expect("object registry mutex poisoned");

        if let Some(existing) = instances.get(&key).and_then(Weak::upgrade) {
            return existing;
        }

        debug!(service = %class.service, class = %class.name(), id, "registering remote object instance");
        let instance = Arc::new(RemoteObject::new(Arc::clone(class), id));

        // Dead entries accumulate as callers drop instances; sweep them
        // while the lock is held anyway.
        instances.retain(|_, weak| weak.strong_count() > 0);
        instances.insert(key, Arc::downgrade(&instance));
        instance
    }

    /// Eviction hook for external teardown logic. Not exercised by the
    /// runtime itself. Returns whether an entry was present.
    pub fn evict(&self, service: &str, class: &str, id: u64) -> bool {
        self.instances
            .lock()
            .expect("object registry mutex poisoned")
            .remove(&(service.to_string(), class.to_string(), id))
            .is_some()
    }

    /// Number of currently live instances.
    pub fn live_count(&self) -> usize {
        self.instances
            .lock()
            .expect("object registry mutex poisoned")
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}

impl std::fmt::Debug for ObjectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectRegistry")
            .field("live", &self.live_count())
            .finish()
    }
}
