//! XML serialization contract for the invoice document.
//!
//! Two renderings exist, selected by [`XmlDeclaration`]:
//!
//! * **Declaration-free** — what the signing service consumes. The signer
//!   applies an enveloped signature to the root element and rejects a
//!   leading XML declaration.
//! * **Declared** — every other consumer gets a standard
//!   `<?xml version="1.0" encoding="UTF-8"?>` prologue.
//!
//! Element order is the struct declaration order in [`crate::document`],
//! which mirrors the schema's declared order; nothing here reorders fields.

use crate::document::FacturaeDocument;
use crate::error::FacturaeError;

/// Whether the rendered XML carries the `<?xml …?>` prologue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlDeclaration {
    /// Declaration-free, for the enveloped-signature service.
    Omit,
    /// UTF-8 declaration included, for storage and any other consumer.
    Include,
}

const XML_PROLOGUE: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";

/// Render the document to XML.
pub fn to_xml(
    document: &FacturaeDocument,
    declaration: XmlDeclaration,
) -> Result<String, FacturaeError> {
    let body = quick_xml::se::to_string(document)
        .map_err(|e| FacturaeError::Internal(format!("XML serialization failed: {e}")))?;
    Ok(match declaration {
        XmlDeclaration::Omit => body,
        XmlDeclaration::Include => format!("{XML_PROLOGUE}{body}"),
    })
}

/// Render the document to UTF-8 XML bytes.
pub fn to_xml_bytes(
    document: &FacturaeDocument,
    declaration: XmlDeclaration,
) -> Result<Vec<u8>, FacturaeError> {
    to_xml(document, declaration).map(String::into_bytes)
}

/// Parse a document back from XML, with or without a declaration.
pub fn from_xml(xml: &str) -> Result<FacturaeDocument, FacturaeError> {
    quick_xml::de::from_str(xml)
        .map_err(|e| FacturaeError::Internal(format!("XML parsing failed: {e}")))
}
