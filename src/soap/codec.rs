//! SOAP envelope codec for the legacy recetas facade.
//!
//! # Parsing
//! The inbound envelope is matched with an explicit, ordered sequence of
//! lookup rules (exact tag → case variant → nested search → fallback
//! container) so the tolerance of the legacy clients is preserved without
//! any reflection-style traversal:
//! 1. Body: first element anywhere with local name `body` (any case)
//! 2. Operation: first child element of Body
//! 3. `nombre`: direct child `nombre`, else direct child `Nombre`, else
//!    first descendant named `nombre` (any case); blank after trimming is
//!    treated as missing
//! 4. products: direct child `productos`, else `Productos`, else first
//!    descendant named `productos` (any case); each child whose tag ends in
//!    `nombre` (any case) contributes its text, otherwise the child's own
//!    text is taken; without a container, direct children named `producto`
//!    are used instead
//!
//! Document order and duplicates are preserved throughout.
//!
//! # Serialization
//! Responses and faults are small fixed shapes, rendered by string assembly
//! with `quick_xml::escape` for text content. Faults travel in-band: the
//! transport status is always success.

use quick_xml::escape::escape;

use crate::error::ProtocolError;
use crate::orchestration::RecetaCreationResult;
use crate::soap::document::{self, Element};

pub const SOAP_ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Parsed form of the one operation the facade accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapOperationRequest {
    /// Tag of the Body's first child, e.g. `CreateReceta`.
    pub operation: String,

    /// The recipe name, trimmed, guaranteed non-blank.
    pub nombre: String,

    /// Product names in document order, duplicates preserved.
    pub productos: Vec<String>,
}

/// Parse a create-receta SOAP envelope.
pub fn parse_create_receta(bytes: &[u8]) -> Result<SoapOperationRequest, ProtocolError> {
    let root = document::parse(bytes)?;

    let body = find_body(&root).ok_or(ProtocolError::MissingBody)?;
    let operation = body.children.first().ok_or(ProtocolError::NoOperation)?;

    let nombre = find_nombre(operation)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or(ProtocolError::MissingNombre)?
        .to_string();

    Ok(SoapOperationRequest {
        operation: operation.tag.clone(),
        nombre,
        productos: collect_productos(operation),
    })
}

fn find_body(root: &Element) -> Option<&Element> {
    if root.tag.eq_ignore_ascii_case("body") {
        return Some(root);
    }
    root.descendant_ci("body")
}

fn find_nombre(operation: &Element) -> Option<&str> {
    operation
        .child("nombre")
        .or_else(|| operation.child("Nombre"))
        .or_else(|| operation.descendant_ci("nombre"))
        .map(Element::trimmed_text)
}

fn collect_productos(operation: &Element) -> Vec<String> {
    let container = operation
        .child("productos")
        .or_else(|| operation.child("Productos"))
        .or_else(|| operation.descendant_ci("productos"));

    if let Some(container) = container {
        let mut productos = Vec::new();
        for child in &container.children {
            let text = child.trimmed_text();
            if text.is_empty() {
                continue;
            }
            // A `<nombre>`-suffixed tag and a plain product element are both
            // accepted; either way the text is the product name.
            productos.push(text.to_string());
        }
        return productos;
    }

    operation
        .children
        .iter()
        .filter(|c| c.tag.eq_ignore_ascii_case("producto"))
        .map(Element::trimmed_text)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Render a SOAP 1.1 fault. `code` is `Client` or `Server`.
pub fn build_fault(code: &str, message: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
         <soap:Envelope xmlns:soap=\"{SOAP_ENVELOPE_NS}\">\
         <soap:Body><soap:Fault>\
         <faultcode>{}</faultcode>\
         <faultstring>{}</faultstring>\
         </soap:Fault></soap:Body></soap:Envelope>",
        escape(code),
        escape(message),
    )
}

/// Render a CreateRecetaResponse envelope. `id` is omitted when the backend
/// reply did not carry one.
pub fn build_create_receta_response(result: &RecetaCreationResult) -> String {
    let mut inner = String::new();
    if let Some(id) = result.id {
        inner.push_str(&format!("<id>{id}</id>"));
    }
    inner.push_str(&format!("<nombre>{}</nombre>", escape(&result.nombre)));
    inner.push_str("<productos>");
    for producto in &result.productos {
        inner.push_str(&format!("<nombre>{}</nombre>", escape(producto)));
    }
    inner.push_str("</productos>");

    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
         <soap:Envelope xmlns:soap=\"{SOAP_ENVELOPE_NS}\">\
         <soap:Body><CreateRecetaResponse>{inner}</CreateRecetaResponse>\
         </soap:Body></soap:Envelope>"
    )
}
