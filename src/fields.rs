//! Typed access to the analysis service's extracted fields.
//!
//! The upstream recognition model exposes fields by dotted path string
//! (`SellerParty.TaxIdentification.TaxIdentificationNumber`), a logical —
//! not physical — identifier space. Raw string lookups are validated ONCE at
//! this boundary into a closed [`FieldPath`] enumeration, so the mapping
//! engine never handles untyped lookups internally: a typo'd path is a
//! compile error there, not a silent `None`.
//!
//! Paths the model emits that this crate does not know are ignored (the
//! model is free to extract more than we consume); a known path missing a
//! value stays absent and the mapping engine decides per field whether that
//! is fatal.

use crate::error::FacturaeError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// The closed set of dotted field paths consumed by the mapping engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldPath {
    SellerTaxIdentificationNumber,
    SellerCorporateName,
    SellerRegistrationBook,
    SellerRegisterOfCompaniesLocation,
    SellerRegistrationSheet,
    SellerRegistrationFolio,
    SellerRegistrationSection,
    SellerRegistrationVolume,
    SellerAdditionalRegistrationData,
    SellerAddress,
    SellerPostCode,
    SellerProvince,
    SellerTown,
    BuyerPartyIdentification,
    BuyerTaxIdentificationNumber,
    BuyerName,
    BuyerFirstSurname,
    BuyerSecondSurname,
    BuyerAddress,
    BuyerPostCode,
    BuyerProvince,
    BuyerTown,
    InvoiceSeriesCode,
    InvoiceNumber,
    IssueDate,
    TaxRate,
    TaxableBase,
    TaxAmount,
    InvoiceTotal,
    TotalExecutableAmount,
    ChargeReason,
    ChargeAmount,
    InstallmentDueDate,
    InstallmentAmount,
}

impl FieldPath {
    /// Every known path, in document order.
    pub const ALL: &'static [FieldPath] = &[
        FieldPath::SellerTaxIdentificationNumber,
        FieldPath::SellerCorporateName,
        FieldPath::SellerRegistrationBook,
        FieldPath::SellerRegisterOfCompaniesLocation,
        FieldPath::SellerRegistrationSheet,
        FieldPath::SellerRegistrationFolio,
        FieldPath::SellerRegistrationSection,
        FieldPath::SellerRegistrationVolume,
        FieldPath::SellerAdditionalRegistrationData,
        FieldPath::SellerAddress,
        FieldPath::SellerPostCode,
        FieldPath::SellerProvince,
        FieldPath::SellerTown,
        FieldPath::BuyerPartyIdentification,
        FieldPath::BuyerTaxIdentificationNumber,
        FieldPath::BuyerName,
        FieldPath::BuyerFirstSurname,
        FieldPath::BuyerSecondSurname,
        FieldPath::BuyerAddress,
        FieldPath::BuyerPostCode,
        FieldPath::BuyerProvince,
        FieldPath::BuyerTown,
        FieldPath::InvoiceSeriesCode,
        FieldPath::InvoiceNumber,
        FieldPath::IssueDate,
        FieldPath::TaxRate,
        FieldPath::TaxableBase,
        FieldPath::TaxAmount,
        FieldPath::InvoiceTotal,
        FieldPath::TotalExecutableAmount,
        FieldPath::ChargeReason,
        FieldPath::ChargeAmount,
        FieldPath::InstallmentDueDate,
        FieldPath::InstallmentAmount,
    ];

    /// The dotted path string as emitted by the recognition model.
    pub fn as_str(self) -> &'static str {
        match self {
            FieldPath::SellerTaxIdentificationNumber => {
                "SellerParty.TaxIdentification.TaxIdentificationNumber"
            }
            FieldPath::SellerCorporateName => "SellerParty.LegalEntity.CorporateName",
            FieldPath::SellerRegistrationBook => "SellerParty.LegalEntity.RegistrationData.Book",
            FieldPath::SellerRegisterOfCompaniesLocation => {
                "SellerParty.LegalEntity.RegistrationData.RegisterOfCompaniesLocation"
            }
            FieldPath::SellerRegistrationSheet => "SellerParty.LegalEntity.RegistrationData.Sheet",
            FieldPath::SellerRegistrationFolio => "SellerParty.LegalEntity.RegistrationData.Folio",
            FieldPath::SellerRegistrationSection => {
                "SellerParty.LegalEntity.RegistrationData.Section"
            }
            FieldPath::SellerRegistrationVolume => {
                "SellerParty.LegalEntity.RegistrationData.Volume"
            }
            FieldPath::SellerAdditionalRegistrationData => {
                "SellerParty.LegalEntity.RegistrationData.AdditionalRegistrationData"
            }
            FieldPath::SellerAddress => "SellerParty.LegalEntity.AddressInSpain.Address",
            FieldPath::SellerPostCode => "SellerParty.LegalEntity.AddressInSpain.PostCode",
            FieldPath::SellerProvince => "SellerParty.LegalEntity.AddressInSpain.Province",
            FieldPath::SellerTown => "SellerParty.LegalEntity.AddressInSpain.Town",
            FieldPath::BuyerPartyIdentification => "BuyerParty.PartyIdentification",
            FieldPath::BuyerTaxIdentificationNumber => {
                "BuyerParty.TaxIdentification.TaxIdentificationNumber"
            }
            FieldPath::BuyerName => "BuyerParty.Individual.Name",
            FieldPath::BuyerFirstSurname => "BuyerParty.Individual.FirstSurname",
            FieldPath::BuyerSecondSurname => "BuyerParty.Individual.SecondSurname",
            FieldPath::BuyerAddress => "BuyerParty.Individual.AddressInSpain.Address",
            FieldPath::BuyerPostCode => "BuyerParty.Individual.AddressInSpain.PostCode",
            FieldPath::BuyerProvince => "BuyerParty.Individual.AddressInSpain.Province",
            FieldPath::BuyerTown => "BuyerParty.Individual.AddressInSpain.Town",
            FieldPath::InvoiceSeriesCode => "Invoices.Invoice.InvoiceHeader.InvoiceSeriesCode",
            FieldPath::InvoiceNumber => "Invoices.Invoice.InvoiceHeader.InvoiceNumber",
            FieldPath::IssueDate => "Invoices.Invoice.InvoiceIssueData.IssueDate",
            FieldPath::TaxRate => "Invoices.Invoice.TaxesOutputs.Tax.TaxRate",
            FieldPath::TaxableBase => "Invoices.Invoice.TaxesOutputs.Tax.TaxableBase.TotalAmount",
            FieldPath::TaxAmount => "Invoices.Invoice.TaxesOutputs.Tax.TaxAmount.TotalAmount",
            FieldPath::InvoiceTotal => "Invoices.Invoice.InvoiceTotals.InvoiceTotal",
            FieldPath::TotalExecutableAmount => {
                "Invoices.Invoice.InvoiceTotals.TotalExecutableAmount"
            }
            FieldPath::ChargeReason => {
                "Invoices.Invoice.InvoiceTotals.GeneralSurcharges.Charge.ChargeReason"
            }
            FieldPath::ChargeAmount => {
                "Invoices.Invoice.InvoiceTotals.GeneralSurcharges.Charge.ChargeAmount"
            }
            FieldPath::InstallmentDueDate => {
                "Invoices.Invoice.PaymentDetails.Installment.InstallmentDueDate"
            }
            FieldPath::InstallmentAmount => {
                "Invoices.Invoice.PaymentDetails.Installment.InstallmentAmount"
            }
        }
    }

    /// Resolve a dotted path string to a known field, if any.
    pub fn parse(path: &str) -> Option<FieldPath> {
        FieldPath::ALL.iter().copied().find(|p| p.as_str() == path)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Extracted table ──────────────────────────────────────────────────────

/// The line-item table as extracted: a flat, row-major cell sequence plus
/// the row count the analysis service declared. The column count is a
/// caller-side contract (see [`crate::pipeline::table`]), not part of the
/// extraction payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedTable {
    pub row_count: usize,
    pub cells: Vec<String>,
}

// ── Extracted field set ──────────────────────────────────────────────────

/// Wire form of an analysis result: dotted path → extracted text (nullable),
/// plus the line-item table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFieldSet {
    #[serde(default)]
    pub fields: HashMap<String, Option<String>>,
    #[serde(default)]
    pub table: ExtractedTable,
}

/// Immutable, boundary-validated view of one analyzed document.
///
/// Produced once by the analysis stage; consumed read-only by the mapping
/// engine. Lookup is by [`FieldPath`] only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFieldSet", into = "RawFieldSet")]
pub struct ExtractedFieldSet {
    fields: HashMap<FieldPath, String>,
    table: ExtractedTable,
}

impl ExtractedFieldSet {
    /// Validate a raw wire payload into the typed field set.
    ///
    /// Unknown dotted paths are dropped with a debug log; null values are
    /// treated as absent.
    pub fn from_raw(raw: RawFieldSet) -> Self {
        let mut fields = HashMap::new();
        for (path, value) in raw.fields {
            match (FieldPath::parse(&path), value) {
                (Some(known), Some(text)) => {
                    fields.insert(known, text);
                }
                (Some(_), None) => {}
                (None, _) => debug!("ignoring unknown extracted field path '{path}'"),
            }
        }
        ExtractedFieldSet {
            fields,
            table: raw.table,
        }
    }

    /// The extracted text for a field, if present. Not trimmed.
    pub fn value(&self, path: FieldPath) -> Option<&str> {
        self.fields.get(&path).map(String::as_str)
    }

    /// The extracted text for a mandatory field.
    ///
    /// Missing or blank text is an [`FacturaeError::InvalidFieldValue`]
    /// naming the dotted path.
    pub fn require(&self, path: FieldPath) -> Result<&str, FacturaeError> {
        match self.value(path) {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(FacturaeError::missing_field(path.as_str())),
        }
    }

    /// The extracted line-item table.
    pub fn table(&self) -> &ExtractedTable {
        &self.table
    }

    /// Set a field value. Test and fixture construction helper.
    pub fn with_field(mut self, path: FieldPath, value: impl Into<String>) -> Self {
        self.fields.insert(path, value.into());
        self
    }

    /// Set the table. Test and fixture construction helper.
    pub fn with_table(mut self, row_count: usize, cells: Vec<String>) -> Self {
        self.table = ExtractedTable { row_count, cells };
        self
    }
}

impl TryFrom<RawFieldSet> for ExtractedFieldSet {
    type Error = std::convert::Infallible;

    fn try_from(raw: RawFieldSet) -> Result<Self, Self::Error> {
        Ok(ExtractedFieldSet::from_raw(raw))
    }
}

impl From<ExtractedFieldSet> for RawFieldSet {
    fn from(set: ExtractedFieldSet) -> RawFieldSet {
        RawFieldSet {
            fields: set
                .fields
                .into_iter()
                .map(|(path, value)| (path.as_str().to_string(), Some(value)))
                .collect(),
            table: set.table,
        }
    }
}
