//! Procedure-name classification.
//!
//! Procedure names carry their role by convention: `Vessel_get_Name` is a
//! getter on the `Vessel` class, `get_ActiveVessel` a service-level getter,
//! `ClearTarget` a plain call. This module turns that stringly convention
//! into a closed tagged variant once, at ingestion, so downstream code
//! never re-derives roles from substrings.
//!
//! The rules, evaluated in order per service:
//!
//! 1. `<Class>_get_<Member>` → class getter
//! 2. `<Class>_set_<Member>` → class setter
//! 3. `<Class>_static_<Member>` → class static
//! 4. `<Class>_<Member>` → class method
//! 5. service level: `get_<Member>` getter, `set_<Member>` setter,
//!    anything else a plain call with the full name as member. The
//!    fallback is deliberate: names outside the convention stay reachable
//!    rather than being dropped.
//!
//! The partition is total: every name resolves to exactly one role.

use crate::config::NamingConfig;
use crate::schema::tables::ServiceTables;

/// Resolved semantic category of a procedure name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcedureRole {
    ServicePlain,
    ServiceGetter,
    ServiceSetter,
    ClassMethod { class: String },
    ClassGetter { class: String },
    ClassSetter { class: String },
    ClassStatic { class: String },
}

impl ProcedureRole {
    /// The owning class name, if this is a class-scoped role.
    pub fn class(&self) -> Option<&str> {
        match self {
            ProcedureRole::ClassMethod { class }
            | ProcedureRole::ClassGetter { class }
            | ProcedureRole::ClassSetter { class }
            | ProcedureRole::ClassStatic { class } => Some(class),
            _ => None,
        }
    }
}

/// A classified procedure name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProcedure {
    /// The raw procedure name as declared in the descriptor.
    pub procedure: String,
    pub role: ProcedureRole,
    /// Member remainder after stripping prefix and marker, unnormalized.
    pub member: String,
    /// Lower-camel form of the member, the name the proxy exposes.
    pub normalized: String,
}

/// Classify one procedure name against the known class set of its service.
///
/// Class prefixes are tried longest-first (see `ServiceTables::class_names`)
/// so overlapping class names cannot misclassify.
pub fn resolve_procedure(name: &str, tables: &ServiceTables) -> ResolvedProcedure {
    for class in tables.class_names() {
        let Some(rest) = name.strip_prefix(class.as_str()) else {
            continue;
        };
        let Some(rest) = rest.strip_prefix(NamingConfig::SEPARATOR) else {
            continue;
        };

        let (role, member) = if let Some(member) = rest.strip_prefix(NamingConfig::GETTER_MARKER) {
            (ProcedureRole::ClassGetter { class: class.clone() }, member)
        } else if let Some(member) = rest.strip_prefix(NamingConfig::SETTER_MARKER) {
            (ProcedureRole::ClassSetter { class: class.clone() }, member)
        } else if let Some(member) = rest.strip_prefix(NamingConfig::STATIC_MARKER) {
            (ProcedureRole::ClassStatic { class: class.clone() }, member)
        } else {
            (ProcedureRole::ClassMethod { class: class.clone() }, rest)
        };

        return ResolvedProcedure {
            procedure: name.to_string(),
            role,
            member: member.to_string(),
            normalized: camel_case(member),
        };
    }

    let (role, member) = if let Some(member) = name.strip_prefix(NamingConfig::GETTER_MARKER) {
        (ProcedureRole::ServiceGetter, member)
    } else if let Some(member) = name.strip_prefix(NamingConfig::SETTER_MARKER) {
        (ProcedureRole::ServiceSetter, member)
    } else {
        // Covers both names with no separator at all and the fallback for
        // unanticipated naming schemes: the full name stays the member.
        (ProcedureRole::ServicePlain, name)
    };

    ResolvedProcedure {
        procedure: name.to_string(),
        role,
        member: member.to_string(),
        normalized: camel_case(member),
    }
}

/// Normalize an underscore-separated member name to lower camel case.
///
/// Segments keep their internal casing except all-caps acronym segments,
/// which are folded to lowercase so `MET` and `UT` come out as `met` and
/// `ut` rather than capitalized fragments.
pub fn camel_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for (i, segment) in raw
        .split(NamingConfig::SEPARATOR)
        .filter(|s| !s.is_empty())
        .enumerate()
    {
        let acronym = segment.chars().all(|c| !c.is_ascii_lowercase());
        let body: String = if acronym {
            segment.to_ascii_lowercase()
        } else {
            segment.to_string()
        };

        let mut chars = body.chars();
        match chars.next() {
            Some(first) if i == 0 => {
                out.extend(first.to_lowercase());
                out.push_str(chars.as_str());
            }
            Some(first) => {
                out.extend(first.to_uppercase());
                out.push_str(chars.as_str());
            }
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ServiceDescriptor;

    fn tables(classes: &[&str]) -> ServiceTables {
        let descriptor: ServiceDescriptor = serde_json::from_value(serde_json::json!({
            "name": "SpaceCenter",
            "classes": classes.iter().map(|c| serde_json::json!({"name": c})).collect::<Vec<_>>()
        }))
        .unwrap();
        ServiceTables::build(&descriptor).unwrap()
    }

    #[test]
    fn test_class_roles() {
        let tables = tables(&["Vessel", "Part"]);

        let resolved = resolve_procedure("Vessel_get_Name", &tables);
        assert_eq!(
            resolved.role,
            ProcedureRole::ClassGetter { class: "Vessel".into() }
        );
        assert_eq!(resolved.member, "Name");
        assert_eq!(resolved.normalized, "name");

        let resolved = resolve_procedure("Vessel_set_Name", &tables);
        assert_eq!(
            resolved.role,
            ProcedureRole::ClassSetter { class: "Vessel".into() }
        );
        assert_eq!(resolved.normalized, "name");

        let resolved = resolve_procedure("Part_static_All", &tables);
        assert_eq!(
            resolved.role,
            ProcedureRole::ClassStatic { class: "Part".into() }
        );
        assert_eq!(resolved.member, "All");

        let resolved = resolve_procedure("Vessel_Recover", &tables);
        assert_eq!(
            resolved.role,
            ProcedureRole::ClassMethod { class: "Vessel".into() }
        );
        assert_eq!(resolved.normalized, "recover");
    }

    #[test]
    fn test_no_cross_class_leakage() {
        let tables = tables(&["Vessel", "Part"]);

        // A getter on Vessel must never be attributed to Part.
        let resolved = resolve_procedure("Vessel_get_Name", &tables);
        assert_eq!(resolved.role.class(), Some("Vessel"));

        let resolved = resolve_procedure("Part_static_All", &tables);
        assert_eq!(resolved.role.class(), Some("Part"));
    }

    #[test]
    fn test_longest_class_prefix_wins() {
        let tables = tables(&["Part", "PartModule"]);

        let resolved = resolve_procedure("PartModule_get_Stage", &tables);
        assert_eq!(
            resolved.role,
            ProcedureRole::ClassGetter { class: "PartModule".into() }
        );

        // Still matches the short class when the long one does not apply.
        let resolved = resolve_procedure("Part_get_Mass", &tables);
        assert_eq!(
            resolved.role,
            ProcedureRole::ClassGetter { class: "Part".into() }
        );
    }

    #[test]
    fn test_service_roles() {
        let tables = tables(&["Vessel"]);

        let resolved = resolve_procedure("get_ActiveVessel", &tables);
        assert_eq!(resolved.role, ProcedureRole::ServiceGetter);
        assert_eq!(resolved.normalized, "activeVessel");

        let resolved = resolve_procedure("set_ActiveVessel", &tables);
        assert_eq!(resolved.role, ProcedureRole::ServiceSetter);

        let resolved = resolve_procedure("ClearTarget", &tables);
        assert_eq!(resolved.role, ProcedureRole::ServicePlain);
        assert_eq!(resolved.normalized, "clearTarget");
    }

    #[test]
    fn test_fallback_keeps_unconventional_names() {
        let tables = tables(&["Vessel"]);

        // Unknown prefix with underscores: plain call, full name as member.
        let resolved = resolve_procedure("do_something_odd", &tables);
        assert_eq!(resolved.role, ProcedureRole::ServicePlain);
        assert_eq!(resolved.member, "do_something_odd");
        assert_eq!(resolved.normalized, "doSomethingOdd");
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("Name"), "name");
        assert_eq!(camel_case("CurrentGameScene"), "currentGameScene");
        assert_eq!(camel_case("Game_Scene"), "gameScene");
        assert_eq!(camel_case("UT"), "ut");
        assert_eq!(camel_case("MET"), "met");
        assert_eq!(camel_case("do_something_odd"), "doSomethingOdd");
        assert_eq!(camel_case(""), "");
    }

    #[test]
    fn test_getter_setter_share_normalized_member() {
        let tables = tables(&["Vessel"]);
        let getter = resolve_procedure("Vessel_get_MaxThrust", &tables);
        let setter = resolve_procedure("Vessel_set_MaxThrust", &tables);
        assert_eq!(getter.normalized, setter.normalized);
    }
}
