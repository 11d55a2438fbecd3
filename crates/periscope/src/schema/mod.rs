//! Service descriptor schema.
//!
//! The reflective shape a server reports about itself: procedures, classes,
//! enumerations and exceptions. Descriptors are deserialized once at
//! ingestion and never mutated afterwards; everything the proxy layer
//! exposes is derived from them.

pub mod resolve;
pub mod tables;

use serde::{Deserialize, Serialize};

/// Declared type of a parameter or return value.
///
/// Opaque to this crate: only the external value codec interprets it. The
/// `code` names the value category (scalar, collection, class, enumeration,
/// message); `service` and `name` qualify class/enum types; `types` carries
/// element types for collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<TypeDescriptor>,
}

impl TypeDescriptor {
    /// A scalar or otherwise unqualified type.
    pub fn scalar(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            service: None,
            name: None,
            types: Vec::new(),
        }
    }

    /// A type qualified by the service that declares it (class, enumeration
    /// or message type).
    pub fn qualified(
        code: impl Into<String>,
        service: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            service: Some(service.into()),
            name: Some(name.into()),
            types: Vec::new(),
        }
    }
}

/// A declared procedure parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: TypeDescriptor,
}

/// A named remote-callable operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcedureDescriptor {
    pub name: String,
    #[serde(default)]
    pub documentation: String,
    #[serde(default)]
    pub parameters: Vec<ParameterDescriptor>,
    /// Declared return type, or `None` for procedures returning nothing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<TypeDescriptor>,
}

/// A remote class. Purely nominal: membership is derived from procedure
/// name prefixes by the resolver, not carried here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDescriptor {
    pub name: String,
    #[serde(default)]
    pub documentation: String,
}

/// One declared enumeration value. A missing explicit integer defaults to
/// the positional index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumValueDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
    #[serde(default)]
    pub documentation: String,
}

/// A declared enumeration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumDescriptor {
    pub name: String,
    #[serde(default)]
    pub documentation: String,
    #[serde(default)]
    pub values: Vec<EnumValueDescriptor>,
}

/// A declared exception. Each produces its own distinct error identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExceptionDescriptor {
    pub name: String,
    #[serde(default)]
    pub documentation: String,
}

/// The full reflective schema of one remote service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub name: String,
    #[serde(default)]
    pub documentation: String,
    #[serde(default)]
    pub procedures: Vec<ProcedureDescriptor>,
    #[serde(default)]
    pub classes: Vec<ClassDescriptor>,
    #[serde(default)]
    pub enumerations: Vec<EnumDescriptor>,
    #[serde(default)]
    pub exceptions: Vec<ExceptionDescriptor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_deserializes_with_defaults() {
        let descriptor: ServiceDescriptor = serde_json::from_str(
            r#"{
                "name": "SpaceCenter",
                "procedures": [
                    {"name": "ClearTarget"},
                    {
                        "name": "Vessel_get_Name",
                        "parameters": [
                            {"name": "this", "type": {"code": "CLASS", "service": "SpaceCenter", "name": "Vessel"}}
                        ],
                        "return_type": {"code": "STRING"}
                    }
                ],
                "classes": [{"name": "Vessel"}]
            }"#,
        )
        .unwrap();

        assert_eq!(descriptor.name, "SpaceCenter");
        assert_eq!(descriptor.procedures.len(), 2);
        assert!(descriptor.procedures[0].parameters.is_empty());
        assert!(descriptor.procedures[0].return_type.is_none());
        assert!(descriptor.enumerations.is_empty());
        assert!(descriptor.exceptions.is_empty());

        let getter = &descriptor.procedures[1];
        assert_eq!(getter.parameters[0].param_type.code, "CLASS");
        assert_eq!(
            getter.parameters[0].param_type.name.as_deref(),
            Some("Vessel")
        );
    }

    #[test]
    fn test_type_descriptor_constructors() {
        let scalar = TypeDescriptor::scalar("UINT64");
        assert_eq!(scalar.code, "UINT64");
        assert!(scalar.service.is_none());

        let class = TypeDescriptor::qualified("CLASS", "SpaceCenter", "Vessel");
        assert_eq!(class.service.as_deref(), Some("SpaceCenter"));
        assert_eq!(class.name.as_deref(), Some("Vessel"));
    }
}
