//! Error types for the scan2facturae library.
//!
//! The taxonomy separates the two places a run can go wrong:
//!
//! * **Reconstruction defects** — [`FacturaeError::InvalidFieldValue`],
//!   [`FacturaeError::TableShape`], [`FacturaeError::Configuration`]: the
//!   extracted data or the issuer configuration cannot produce a
//!   schema-conformant invoice. These carry enough context (field path,
//!   table shape) to diagnose without re-reading the raw OCR output.
//!
//! * **Collaborator failures** — [`FacturaeError::Recognition`],
//!   [`FacturaeError::Storage`], [`FacturaeError::Signing`]: an external
//!   service refused or failed. The cause is opaque to this crate and is
//!   attached as a detail string for operator inspection.
//!
//! The orchestrator never catches or downgrades any of these: the first
//! error aborts the workflow instance into its `Failed` state with the
//! triggering error preserved.

use thiserror::Error;

/// All errors surfaced by the scan2facturae library.
#[derive(Debug, Error)]
pub enum FacturaeError {
    // ── Reconstruction defects ────────────────────────────────────────────
    /// An extracted field is missing where mandatory, or its text cannot be
    /// parsed under the parsing profile the field class requires.
    #[error("invalid value for '{field}': {detail} (raw: {raw:?})")]
    InvalidFieldValue {
        /// Dotted field path, or a `row N, column M` locator for table cells.
        field: String,
        /// The raw text as extracted. Empty when the field was absent.
        raw: String,
        detail: String,
    },

    /// The declared line-item table dimensions exceed the supplied cells.
    #[error("table shape {rows}x{columns} needs {} cells but only {cells} were extracted", rows * columns)]
    TableShape {
        rows: usize,
        columns: usize,
        cells: usize,
    },

    /// A required issuer or service configuration value is missing or empty.
    #[error("missing configuration value '{key}'")]
    Configuration { key: String },

    // ── Collaborator failures ─────────────────────────────────────────────
    /// The document-analysis service failed to analyze the document.
    #[error("document analysis failed: {detail}")]
    Recognition { detail: String },

    /// Blob/object storage refused a resolve-access or upload request.
    #[error("storage operation failed: {detail}")]
    Storage { detail: String },

    /// The signing service failed to produce a signed artifact.
    #[error("signing failed: {detail}")]
    Signing { detail: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (serialization, persisted-state decoding).
    #[error("internal error: {0}")]
    Internal(String),
}

impl FacturaeError {
    /// Shorthand for a missing mandatory field.
    pub(crate) fn missing_field(field: impl Into<String>) -> Self {
        FacturaeError::InvalidFieldValue {
            field: field.into(),
            raw: String::new(),
            detail: "mandatory field is missing or blank".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_shape_display_reports_expected_cell_count() {
        let e = FacturaeError::TableShape {
            rows: 3,
            columns: 6,
            cells: 12,
        };
        let msg = e.to_string();
        assert!(msg.contains("3x6"), "got: {msg}");
        assert!(msg.contains("18 cells"), "got: {msg}");
        assert!(msg.contains("12"), "got: {msg}");
    }

    #[test]
    fn invalid_field_value_display_includes_path_and_raw() {
        let e = FacturaeError::InvalidFieldValue {
            field: "Invoices.Invoice.TaxesOutputs.Tax.TaxRate".into(),
            raw: "(2".into(),
            detail: "decorated rate shorter than 6 characters".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("TaxRate"));
        assert!(msg.contains("(2"));
    }

    #[test]
    fn missing_field_helper_display() {
        let e = FacturaeError::missing_field("Invoices.Invoice.InvoiceHeader.InvoiceNumber");
        assert!(e.to_string().contains("missing or blank"));
    }

    #[test]
    fn configuration_display() {
        let e = FacturaeError::Configuration {
            key: "issuer.certificate_name".into(),
        };
        assert!(e.to_string().contains("issuer.certificate_name"));
    }
}
