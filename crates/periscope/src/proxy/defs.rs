//! Enum and exception namespaces derived from descriptors.

use std::collections::{BTreeMap, HashMap};

use crate::error::{DefinitionKind, Result, RpcError};
use crate::schema::{EnumDescriptor, ExceptionDescriptor};

/// A declared enumeration with its two derived indexes.
///
/// Both maps are bijective over the declared value set; a descriptor that
/// violates that (duplicate name or duplicate integer) is rejected at
/// ingestion rather than silently overwritten.
#[derive(Debug, Clone)]
pub struct EnumDefinition {
    name: String,
    documentation: String,
    names: HashMap<String, i64>,
    values: BTreeMap<i64, String>,
    docs: HashMap<String, String>,
}

impl EnumDefinition {
    pub(crate) fn build(service: &str, descriptor: &EnumDescriptor) -> Result<Self> {
        let mut names = HashMap::with_capacity(descriptor.values.len());
        let mut values = BTreeMap::new();
        let mut docs = HashMap::with_capacity(descriptor.values.len());

        for (index, value) in descriptor.values.iter().enumerate() {
            // Missing explicit integers default to the positional index.
            let number = value.value.unwrap_or(index as i64);

            let name_clash = names.insert(value.name.clone(), number).is_some();
            let value_clash = values.insert(number, value.name.clone()).is_some();
            if name_clash || value_clash {
                return Err(RpcError::DuplicateDefinition {
                    service: service.to_string(),
                    kind: DefinitionKind::Enumeration,
                    name: format!("{}.{}", descriptor.name, value.name),
                });
            }
            docs.insert(value.name.clone(), value.documentation.clone());
        }

        Ok(Self {
            name: descriptor.name.clone(),
            documentation: descriptor.documentation.clone(),
            names,
            values,
            docs,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn documentation(&self) -> &str {
        &self.documentation
    }

    /// Integer for a declared value name.
    pub fn value_of(&self, name: &str) -> Option<i64> {
        self.names.get(name).copied()
    }

    /// Declared value name for an integer.
    pub fn name_of(&self, value: i64) -> Option<&str> {
        self.values.get(&value).map(String::as_str)
    }

    /// Documentation for one declared value.
    pub fn value_documentation(&self, name: &str) -> Option<&str> {
        self.docs.get(name).map(String::as_str)
    }

    /// Declared value names, in integer order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.values().map(String::as_str)
    }
}

/// A declared exception, constructible as a distinct error identity.
///
/// Distinctness is by `(service, name)`: the descriptor arrives at runtime,
/// so the identity lives in data rather than in a Rust type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionDefinition {
    service: String,
    name: String,
    documentation: String,
}

impl ExceptionDefinition {
    pub(crate) fn new(service: &str, descriptor: &ExceptionDescriptor) -> Self {
        Self {
            service: service.to_string(),
            name: descriptor.name.clone(),
            documentation: descriptor.documentation.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn documentation(&self) -> &str {
        &self.documentation
    }

    /// Construct an error of this exception's identity.
    pub fn instantiate(&self, description: impl Into<String>) -> RpcError {
        RpcError::Remote {
            service: self.service.clone(),
            name: self.name.clone(),
            description: description.into(),
        }
    }

    /// Whether a remote error carries this exception's identity.
    pub fn matches(&self, error: &RpcError) -> bool {
        matches!(
            error,
            RpcError::Remote { service, name, .. }
                if *service == self.service && *name == self.name
        )
    }
}
