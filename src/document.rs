//! The Facturae 3.2 invoice document model.
//!
//! Target structure for the mapping engine: file header, parties, one
//! invoice with tax outputs, totals, line items and a payment schedule.
//! Built fresh per workflow run, never mutated after mapping completes, and
//! consumed read-only by signing and serialization.
//!
//! Field order in every struct follows the schema's declared element order —
//! the serde serializer emits fields in declaration order, and downstream
//! schema validation breaks on any reordering. Do not re-sort fields here.
//!
//! Monetary values are [`rust_decimal::Decimal`] with an explicit scale set
//! by the mapping engine: 2 decimals for rates and sub-amounts, 6 decimals
//! for gross/unit amounts. The scale survives serialization (`21.00`, not
//! `21`), which keeps the XML round trip byte-stable for leaf values.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Namespace of the Facturae 3.2 schema.
pub const FACTURAE_NAMESPACE: &str = "http://www.facturae.es/Facturae/2009/v3.2/Facturae";

fn facturae_namespace() -> String {
    FACTURAE_NAMESPACE.to_string()
}

// ── Coded values ─────────────────────────────────────────────────────────
//
// This system emits exactly one invoice category, so most schema code lists
// collapse to the single variant actually produced. The enums keep the
// serialized literals out of the mapping engine.

/// Schema version identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaVersion {
    #[default]
    #[serde(rename = "3.2")]
    V3_2,
}

/// Batch modality. `I`: single-invoice batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modality {
    #[default]
    #[serde(rename = "I")]
    Single,
}

/// Who issues the invoice. `TE`: a third party on behalf of the seller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceIssuerType {
    #[default]
    #[serde(rename = "TE")]
    ThirdParty,
}

/// Legal personality of a party.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PersonTypeCode {
    /// Legal entity (company).
    #[serde(rename = "J")]
    Legal,
    /// Natural person.
    #[serde(rename = "F")]
    Natural,
}

/// Tax residency of a party.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResidenceTypeCode {
    #[default]
    #[serde(rename = "R")]
    Resident,
}

/// Invoice currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurrencyCode {
    #[default]
    #[serde(rename = "EUR")]
    Eur,
}

/// Document language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LanguageCode {
    #[default]
    #[serde(rename = "es")]
    Es,
}

/// Address country.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountryCode {
    #[default]
    #[serde(rename = "ESP")]
    Esp,
}

/// Invoice document type. `FC`: complete invoice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceDocumentType {
    #[default]
    #[serde(rename = "FC")]
    Complete,
}

/// Invoice class. `OO`: original.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceClass {
    #[default]
    #[serde(rename = "OO")]
    Original,
}

/// Tax type. `01`: VAT (IVA).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaxTypeCode {
    #[default]
    #[serde(rename = "01")]
    Vat,
}

// ── Document ─────────────────────────────────────────────────────────────

/// A complete Facturae document: header, parties and the invoice batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "Facturae", rename_all = "PascalCase")]
pub struct FacturaeDocument {
    #[serde(rename = "@xmlns", default = "facturae_namespace")]
    pub xmlns: String,
    pub file_header: FileHeader,
    pub parties: Parties,
    pub invoices: Invoices,
}

impl FacturaeDocument {
    /// The first invoice of the batch. The mapping engine always emits
    /// exactly one; a parsed document may carry more.
    pub fn invoice(&self) -> Option<&Invoice> {
        self.invoices.invoice.first()
    }
}

/// Batch identifiers, issuer type, third-party block and aggregate totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileHeader {
    pub schema_version: SchemaVersion,
    pub modality: Modality,
    pub invoice_issuer_type: InvoiceIssuerType,
    pub third_party: ThirdParty,
    pub batch: Batch,
}

/// The intermediary issuing the document (the operator of this system).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ThirdParty {
    pub tax_identification: TaxIdentification,
    pub legal_entity: LegalEntity,
}

/// Batch block. This system always emits exactly one invoice per batch, so
/// the aggregate totals mirror the single invoice's totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Batch {
    pub batch_identifier: String,
    pub invoices_count: u32,
    pub total_invoices_amount: Amount,
    pub total_outstanding_amount: Amount,
    pub total_executable_amount: Amount,
    pub invoice_currency_code: CurrencyCode,
}

/// A monetary total wrapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Amount {
    pub total_amount: Decimal,
}

impl Amount {
    pub fn new(total_amount: Decimal) -> Self {
        Amount { total_amount }
    }
}

// ── Parties ──────────────────────────────────────────────────────────────

/// Seller and buyer of the invoiced operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Parties {
    pub seller_party: Business,
    pub buyer_party: Business,
}

/// One party: tax identity plus a legal-entity or individual identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Business {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party_identification: Option<String>,
    pub tax_identification: TaxIdentification,
    #[serde(rename = "$value")]
    pub entity: PartyEntity,
}

/// Schema choice between a legal entity and a natural person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PartyEntity {
    LegalEntity(LegalEntity),
    Individual(Individual),
}

/// Tax identity of a party.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaxIdentification {
    pub person_type_code: PersonTypeCode,
    pub residence_type_code: ResidenceTypeCode,
    pub tax_identification_number: String,
}

/// A company identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LegalEntity {
    pub corporate_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trade_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_data: Option<RegistrationData>,
    pub address_in_spain: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_details: Option<ContactDetails>,
}

/// A natural-person identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Individual {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_surname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_surname: Option<String>,
    pub address_in_spain: Address,
}

/// Mercantile-registry data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RegistrationData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub register_of_companies_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_registration_data: Option<String>,
}

/// A Spanish postal address. OCR omissions serialize as empty elements, the
/// same way the upstream extraction reports them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Address {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub post_code: String,
    #[serde(default)]
    pub town: String,
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub country_code: CountryCode,
}

/// Published contact details of the third-party issuer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContactDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tele_fax: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub electronic_mail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cno_cnae: Option<String>,
}

// ── Invoices ─────────────────────────────────────────────────────────────

/// The invoice list. This system emits exactly one entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoices {
    #[serde(rename = "Invoice")]
    pub invoice: Vec<Invoice>,
}

/// One invoice: header, issue data, tax outputs, totals, lines, payments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Invoice {
    pub invoice_header: InvoiceHeader,
    pub invoice_issue_data: InvoiceIssueData,
    pub taxes_outputs: TaxesOutputs,
    pub invoice_totals: InvoiceTotals,
    pub items: Items,
    pub payment_details: PaymentDetails,
}

/// Invoice number, series and fixed type/class constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvoiceHeader {
    pub invoice_number: String,
    pub invoice_series_code: String,
    pub invoice_document_type: InvoiceDocumentType,
    pub invoice_class: InvoiceClass,
}

/// Issue date plus fixed currency/language constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvoiceIssueData {
    pub issue_date: NaiveDate,
    pub invoice_currency_code: CurrencyCode,
    pub tax_currency_code: CurrencyCode,
    pub language_name: LanguageCode,
}

/// Tax output list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxesOutputs {
    #[serde(rename = "Tax")]
    pub tax: Vec<TaxOutput>,
}

/// One tax rate/base/amount triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaxOutput {
    pub tax_type_code: TaxTypeCode,
    pub tax_rate: Decimal,
    pub taxable_base: Amount,
    pub tax_amount: Amount,
}

/// Invoice totals. Element order is schema order; the surcharge section is
/// emitted only when a charge reason was extracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvoiceTotals {
    pub total_gross_amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub general_surcharges: Option<GeneralSurcharges>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_general_surcharges: Option<Decimal>,
    pub total_gross_amount_before_taxes: Decimal,
    pub total_tax_outputs: Decimal,
    pub invoice_total: Decimal,
    pub total_outstanding_amount: Decimal,
    pub total_executable_amount: Decimal,
}

impl InvoiceTotals {
    /// Whether a surcharge section is present.
    pub fn has_surcharges(&self) -> bool {
        self.general_surcharges.is_some()
    }
}

/// Surcharge list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralSurcharges {
    #[serde(rename = "Charge")]
    pub charge: Vec<Charge>,
}

/// One general surcharge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Charge {
    pub charge_reason: String,
    pub charge_amount: Decimal,
}

/// Line-item list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Items {
    #[serde(rename = "InvoiceLine")]
    pub invoice_line: Vec<InvoiceLine>,
}

/// One invoice line.
///
/// `unit_price_without_tax` is present only when the quantity is non-zero —
/// it is a derived value and there is no meaningful unit price for a
/// zero-quantity line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvoiceLine {
    pub item_description: String,
    pub quantity: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price_without_tax: Option<Decimal>,
    pub total_cost: Decimal,
    pub gross_amount: Decimal,
    pub taxes_outputs: TaxesOutputs,
}

/// Payment schedule. Exactly one installment is emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentDetails {
    #[serde(rename = "Installment")]
    pub installment: Vec<Installment>,
}

/// One payment installment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Installment {
    pub installment_due_date: NaiveDate,
    pub installment_amount: Decimal,
}
