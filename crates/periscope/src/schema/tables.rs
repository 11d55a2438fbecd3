//! Indexed lookup tables over one service descriptor.
//!
//! Built once at ingestion. A duplicate name within a kind is a fatal
//! ingestion error: silently overwriting would corrupt every later lookup,
//! so the whole service is rejected instead.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::{DefinitionKind, Result, RpcError};
use crate::schema::{
    ClassDescriptor, EnumDescriptor, ExceptionDescriptor, ProcedureDescriptor, ServiceDescriptor,
};

/// Name-keyed indexes for the four definition kinds of one service.
#[derive(Debug, Clone)]
pub struct ServiceTables {
    service: String,
    procedures: HashMap<String, Arc<ProcedureDescriptor>>,
    classes: HashMap<String, ClassDescriptor>,
    enums: HashMap<String, EnumDescriptor>,
    exceptions: HashMap<String, ExceptionDescriptor>,
    /// Class names sorted longest-first, so prefix matching in the resolver
    /// can never pick `Part` when `PartModule` also matches.
    class_order: Vec<String>,
}

impl ServiceTables {
    /// Index a service descriptor, failing on any duplicate definition.
    pub fn build(descriptor: &ServiceDescriptor) -> Result<Self> {
        let service = descriptor.name.clone();

        let mut procedures = HashMap::with_capacity(descriptor.procedures.len());
        for procedure in &descriptor.procedures {
            if procedures
                .insert(procedure.name.clone(), Arc::new(procedure.clone()))
                .is_some()
            {
                return Err(duplicate(&service, DefinitionKind::Procedure, &procedure.name));
            }
        }

        let mut classes = HashMap::with_capacity(descriptor.classes.len());
        for class in &descriptor.classes {
            if classes.insert(class.name.clone(), class.clone()).is_some() {
                return Err(duplicate(&service, DefinitionKind::Class, &class.name));
            }
        }

        let mut enums = HashMap::with_capacity(descriptor.enumerations.len());
        for enumeration in &descriptor.enumerations {
            if enums
                .insert(enumeration.name.clone(), enumeration.clone())
                .is_some()
            {
                return Err(duplicate(&service, DefinitionKind::Enumeration, &enumeration.name));
            }
        }

        let mut exceptions = HashMap::with_capacity(descriptor.exceptions.len());
        for exception in &descriptor.exceptions {
            if exceptions
                .insert(exception.name.clone(), exception.clone())
                .is_some()
            {
                return Err(duplicate(&service, DefinitionKind::Exception, &exception.name));
            }
        }

        let mut class_order: Vec<String> = classes.keys().cloned().collect();
        class_order.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        debug!(
            service = %service,
            procedures = procedures.len(),
            classes = classes.len(),
            enums = enums.len(),
            exceptions = exceptions.len(),
            "indexed service descriptor"
        );

        Ok(Self {
            service,
            procedures,
            classes,
            enums,
            exceptions,
            class_order,
        })
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn procedure(&self, name: &str) -> Option<&Arc<ProcedureDescriptor>> {
        self.procedures.get(name)
    }

    pub fn class(&self, name: &str) -> Option<&ClassDescriptor> {
        self.classes.get(name)
    }

    pub fn enumeration(&self, name: &str) -> Option<&EnumDescriptor> {
        self.enums.get(name)
    }

    pub fn exception(&self, name: &str) -> Option<&ExceptionDescriptor> {
        self.exceptions.get(name)
    }

    /// Class names, longest first.
    pub fn class_names(&self) -> &[String] {
        &self.class_order
    }
}

fn duplicate(service: &str, kind: DefinitionKind, name: &str) -> RpcError {
    RpcError::DuplicateDefinition {
        service: service.to_string(),
        kind,
        name: name.to_string(),
    }
}
