//! Static grammar for serialized XML documents

use crate::registry::{Arity, Registry, ScalarType, Shape};

/// Public identifier written in the multi-object DOCTYPE.
pub const XML_PUBLIC_ID: &str = "-//idgate//DTD Serialized Objects 1.0//EN";

/// System identifier written in the multi-object DOCTYPE.
pub const XML_SYSTEM_ID: &str = "idgate-objects-1.0.dtd";

/// Root element of a multi-object document.
pub const MULTI_OBJECT_ELEMENT: &str = "MultiObject";

/// The DTD of documents written with the standard registry.
pub fn dtd() -> String {
    dtd_for(Registry::standard())
}

/// The DTD of documents written with `registry`.
///
/// Every registered tag is declared. Scalars and primitive arrays hold
/// character data; composites hold as many values as their arity admits.
pub fn dtd_for(registry: &Registry) -> String {
    let tags: Vec<&str> = registry.handlers().map(|h| h.tag()).collect();

    let mut dtd = format!("<!ENTITY % value \"{}\">\n", tags.join(" | "));
    dtd.push_str(&format!("<!ELEMENT {MULTI_OBJECT_ELEMENT} (%value;)*>\n"));
    for handler in registry.handlers() {
        let content = match handler.shape() {
            Shape::Scalar(ScalarType::Null) => "EMPTY".to_string(),
            Shape::Scalar(_) | Shape::PrimitiveArray(_) => "(#PCDATA)".to_string(),
            Shape::Composite(arity) => content_model(arity),
        };
        dtd.push_str(&format!("<!ELEMENT {} {content}>\n", handler.tag()));
    }
    dtd
}

/// Element content admitting exactly the child counts `arity` admits.
fn content_model(arity: Arity) -> String {
    let (required, variadic) = match arity {
        Arity::Exact(n) => (n, false),
        Arity::AtLeast(n) => (n, true),
    };
    let mut particles = vec!["%value;"; required];
    if variadic {
        particles.push("(%value;)*");
    }
    match particles.as_slice() {
        [] => "EMPTY".to_string(),
        ["(%value;)*"] => "(%value;)*".to_string(),
        _ => format!("({})", particles.join(", ")),
    }
}
