//! Assemble the complete invoice document from extracted fields.
//!
//! The engine is a pure function of an [`ExtractedFieldSet`] and an
//! [`IssuerConfig`] — no network, no storage, no clock — which is what makes
//! it independently testable and safe to run inside a replayed workflow
//! stage.
//!
//! ## Totals policy
//!
//! The stated invoice-total field is trusted over a bottom-up sum of the
//! line items: the upstream document format carries an authoritative total
//! and the line table is the noisier extraction. A mismatch between the two
//! is surfaced as a [`MappingWarning::TotalMismatch`] (and a `warn!` log)
//! for operational visibility, never as an error, and the total is never
//! rewritten to match the lines.

use crate::config::IssuerConfig;
use crate::document::*;
use crate::error::FacturaeError;
use crate::fields::{ExtractedFieldSet, FieldPath};
use crate::pipeline::numeric;
use crate::pipeline::table::{
    TableGrid, COL_DESCRIPTION, COL_GROSS_AMOUNT, COL_QUANTITY, COL_TAXABLE_BASE, COL_TAX_AMOUNT,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// A non-fatal diagnostic raised while mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MappingWarning {
    /// The stated invoice total differs from the sum of line gross amounts.
    TotalMismatch { stated: Decimal, line_sum: Decimal },
}

impl fmt::Display for MappingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingWarning::TotalMismatch { stated, line_sum } => write!(
                f,
                "stated invoice total {stated} does not match line-item sum {line_sum}"
            ),
        }
    }
}

/// A mapped document plus any non-fatal diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingOutcome {
    pub document: FacturaeDocument,
    pub warnings: Vec<MappingWarning>,
}

/// Build the complete invoice document, or fail with the first defect.
pub fn map_invoice(
    fields: &ExtractedFieldSet,
    issuer: &IssuerConfig,
) -> Result<MappingOutcome, FacturaeError> {
    // ── Step 1: Invoice-level tax triple ─────────────────────────────────
    let tax_rate = numeric::parse_decorated_rate(
        fields.require(FieldPath::TaxRate)?,
        FieldPath::TaxRate.as_str(),
    )?
    .round_dp(2);
    let taxable_base = parse_required_amount(fields, FieldPath::TaxableBase)?.round_dp(2);
    let tax_amount = parse_required_amount(fields, FieldPath::TaxAmount)?.round_dp(2);

    // ── Step 2: Totals, in dependency order ──────────────────────────────
    let stated_total = parse_required_amount(fields, FieldPath::InvoiceTotal)?.round_dp(2);
    let executable = numeric::parse_amount_or_zero(
        fields.value(FieldPath::TotalExecutableAmount),
        FieldPath::TotalExecutableAmount.as_str(),
    )?
    .round_dp(2);
    let totals = build_totals(fields, taxable_base, tax_amount, stated_total, executable)?;

    // ── Step 3: Line items from the table ────────────────────────────────
    let grid = TableGrid::from_extracted(fields.table())?;
    let lines = build_lines(&grid, tax_rate)?;
    debug!(lines = lines.len(), "reconstructed line items");

    // ── Step 4: Consistency diagnostic (warning-level, never fatal) ──────
    let mut warnings = Vec::new();
    let line_sum: Decimal = lines.iter().map(|l| l.gross_amount).sum();
    if line_sum.round_dp(2) != stated_total {
        let warning = MappingWarning::TotalMismatch {
            stated: stated_total,
            line_sum: line_sum.round_dp(2),
        };
        warn!("{warning}");
        warnings.push(warning);
    }

    // ── Step 5: Header, parties, issue data, payment schedule ────────────
    let batch_identifier = format!(
        "{}{}{}",
        fields.require(FieldPath::SellerTaxIdentificationNumber)?,
        fields.require(FieldPath::InvoiceNumber)?,
        fields.require(FieldPath::InvoiceSeriesCode)?,
    );

    let invoice = Invoice {
        invoice_header: InvoiceHeader {
            invoice_number: fields.require(FieldPath::InvoiceNumber)?.to_string(),
            invoice_series_code: fields.require(FieldPath::InvoiceSeriesCode)?.to_string(),
            invoice_document_type: InvoiceDocumentType::Complete,
            invoice_class: InvoiceClass::Original,
        },
        invoice_issue_data: InvoiceIssueData {
            issue_date: numeric::parse_date(
                fields.require(FieldPath::IssueDate)?,
                FieldPath::IssueDate.as_str(),
            )?,
            invoice_currency_code: CurrencyCode::Eur,
            tax_currency_code: CurrencyCode::Eur,
            language_name: LanguageCode::Es,
        },
        taxes_outputs: TaxesOutputs {
            tax: vec![TaxOutput {
                tax_type_code: TaxTypeCode::Vat,
                tax_rate,
                taxable_base: Amount::new(taxable_base),
                tax_amount: Amount::new(tax_amount),
            }],
        },
        invoice_totals: totals,
        items: Items {
            invoice_line: lines,
        },
        payment_details: PaymentDetails {
            installment: vec![Installment {
                installment_due_date: numeric::parse_date(
                    fields.require(FieldPath::InstallmentDueDate)?,
                    FieldPath::InstallmentDueDate.as_str(),
                )?,
                installment_amount: parse_required_amount(fields, FieldPath::InstallmentAmount)?
                    .round_dp(2),
            }],
        },
    };

    let document = FacturaeDocument {
        xmlns: FACTURAE_NAMESPACE.to_string(),
        file_header: build_file_header(batch_identifier, &invoice.invoice_totals, issuer),
        parties: build_parties(fields)?,
        invoices: Invoices {
            invoice: vec![invoice],
        },
    };

    Ok(MappingOutcome { document, warnings })
}

// ── Totals ───────────────────────────────────────────────────────────────

/// Compute the invoice totals block.
///
/// Dependency order is fixed: gross-before-taxes mirrors the taxable base,
/// the tax total mirrors the tax amount, and outstanding equals the stated
/// invoice total. A non-blank charge reason switches on the surcharge
/// section and moves gross-before-taxes, invoice total and outstanding
/// together by the parsed amount; a blank reason emits no surcharge section
/// at all.
fn build_totals(
    fields: &ExtractedFieldSet,
    taxable_base: Decimal,
    tax_amount: Decimal,
    stated_total: Decimal,
    executable: Decimal,
) -> Result<InvoiceTotals, FacturaeError> {
    let mut totals = InvoiceTotals {
        total_gross_amount: taxable_base,
        general_surcharges: None,
        total_general_surcharges: None,
        total_gross_amount_before_taxes: taxable_base,
        total_tax_outputs: tax_amount,
        invoice_total: stated_total,
        total_outstanding_amount: stated_total,
        total_executable_amount: executable,
    };

    let charge_reason = fields
        .value(FieldPath::ChargeReason)
        .map(str::trim)
        .filter(|r| !r.is_empty());
    let Some(reason) = charge_reason else {
        return Ok(totals);
    };

    let mut charge_amount = numeric::parse_amount_or_zero(
        fields.value(FieldPath::ChargeAmount),
        FieldPath::ChargeAmount.as_str(),
    )?;
    charge_amount.rescale(6);

    totals.general_surcharges = Some(GeneralSurcharges {
        charge: vec![Charge {
            charge_reason: reason.to_string(),
            charge_amount,
        }],
    });
    totals.total_general_surcharges = Some(charge_amount.round_dp(2));
    totals.total_gross_amount_before_taxes =
        (totals.total_gross_amount_before_taxes + charge_amount).round_dp(2);
    totals.invoice_total = (totals.invoice_total + charge_amount).round_dp(2);
    totals.total_outstanding_amount =
        (totals.total_outstanding_amount + charge_amount).round_dp(2);

    Ok(totals)
}

// ── Line items ───────────────────────────────────────────────────────────

/// One line item per data row; the header row never becomes a line.
fn build_lines(grid: &TableGrid, tax_rate: Decimal) -> Result<Vec<InvoiceLine>, FacturaeError> {
    let mut lines = Vec::with_capacity(grid.row_count().saturating_sub(1));
    for (row, cells) in grid.data_rows() {
        let locate = |column: usize| format!("line items row {row}, column {column}");

        let quantity = numeric::parse_amount_or_zero(
            Some(&cells[COL_QUANTITY]),
            &locate(COL_QUANTITY),
        )?;
        let mut gross_amount =
            numeric::parse_amount(&cells[COL_GROSS_AMOUNT], &locate(COL_GROSS_AMOUNT))?;
        gross_amount.rescale(6);

        // No unit price for a zero-quantity line: the value is derived and a
        // divide-by-zero fallback would fabricate data.
        let unit_price_without_tax = if quantity.is_zero() {
            None
        } else {
            let mut unit = (gross_amount / quantity).round_dp(2);
            unit.rescale(6);
            Some(unit)
        };

        let taxable_base = numeric::parse_amount_or_zero(
            Some(&cells[COL_TAXABLE_BASE]),
            &locate(COL_TAXABLE_BASE),
        )?
        .round_dp(2);
        let tax_amount = numeric::parse_amount_or_zero(
            Some(&cells[COL_TAX_AMOUNT]),
            &locate(COL_TAX_AMOUNT),
        )?
        .round_dp(2);

        lines.push(InvoiceLine {
            item_description: cells[COL_DESCRIPTION].clone(),
            quantity,
            unit_price_without_tax,
            total_cost: gross_amount,
            gross_amount,
            taxes_outputs: TaxesOutputs {
                tax: vec![TaxOutput {
                    tax_type_code: TaxTypeCode::Vat,
                    tax_rate,
                    taxable_base: Amount::new(taxable_base),
                    tax_amount: Amount::new(tax_amount),
                }],
            },
        });
    }
    Ok(lines)
}

// ── Header and parties ───────────────────────────────────────────────────

/// The batch aggregates mirror the single invoice's totals: this system
/// always emits exactly one invoice per batch.
fn build_file_header(
    batch_identifier: String,
    totals: &InvoiceTotals,
    issuer: &IssuerConfig,
) -> FileHeader {
    FileHeader {
        schema_version: SchemaVersion::V3_2,
        modality: Modality::Single,
        invoice_issuer_type: InvoiceIssuerType::ThirdParty,
        third_party: build_third_party(issuer),
        batch: Batch {
            batch_identifier,
            invoices_count: 1,
            total_invoices_amount: Amount::new(totals.invoice_total),
            total_outstanding_amount: Amount::new(totals.total_outstanding_amount),
            total_executable_amount: Amount::new(totals.total_executable_amount),
            invoice_currency_code: CurrencyCode::Eur,
        },
    }
}

/// The operator of this system, emitted as the document's third-party
/// intermediary from hard configuration.
fn build_third_party(issuer: &IssuerConfig) -> ThirdParty {
    let contact = &issuer.contact;
    let has_contact = [
        &contact.telephone,
        &contact.tele_fax,
        &contact.web_address,
        &contact.electronic_mail,
        &contact.cno_cnae,
    ]
    .iter()
    .any(|v| v.is_some());

    ThirdParty {
        tax_identification: TaxIdentification {
            person_type_code: PersonTypeCode::Legal,
            residence_type_code: ResidenceTypeCode::Resident,
            tax_identification_number: issuer.tax_identification_number.clone(),
        },
        legal_entity: LegalEntity {
            corporate_name: issuer.corporate_name.clone(),
            trade_name: Some(issuer.trade_name_or_corporate().to_string()),
            registration_data: Some(RegistrationData {
                book: issuer.registration.book.clone(),
                register_of_companies_location: issuer
                    .registration
                    .register_of_companies_location
                    .clone(),
                sheet: issuer.registration.sheet.clone(),
                folio: issuer.registration.folio.clone(),
                section: issuer.registration.section.clone(),
                volume: issuer.registration.volume.clone(),
                additional_registration_data: None,
            }),
            address_in_spain: Address {
                address: issuer.address.address.clone(),
                post_code: issuer.address.post_code.clone(),
                town: issuer.address.town.clone(),
                province: issuer.address.province.clone(),
                country_code: CountryCode::Esp,
            },
            contact_details: has_contact.then(|| ContactDetails {
                telephone: contact.telephone.clone(),
                tele_fax: contact.tele_fax.clone(),
                web_address: contact.web_address.clone(),
                electronic_mail: contact.electronic_mail.clone(),
                cno_cnae: contact.cno_cnae.clone(),
            }),
        },
    }
}

/// Seller is always a resident legal entity; buyer is always a resident
/// natural person. Both come from the extracted fields.
fn build_parties(fields: &ExtractedFieldSet) -> Result<Parties, FacturaeError> {
    let opt = |path: FieldPath| fields.value(path).map(str::to_string);
    let text = |path: FieldPath| fields.value(path).unwrap_or_default().to_string();

    let seller = Business {
        party_identification: None,
        tax_identification: TaxIdentification {
            person_type_code: PersonTypeCode::Legal,
            residence_type_code: ResidenceTypeCode::Resident,
            tax_identification_number: fields
                .require(FieldPath::SellerTaxIdentificationNumber)?
                .to_string(),
        },
        entity: PartyEntity::LegalEntity(LegalEntity {
            corporate_name: fields.require(FieldPath::SellerCorporateName)?.to_string(),
            trade_name: None,
            registration_data: Some(RegistrationData {
                book: opt(FieldPath::SellerRegistrationBook),
                register_of_companies_location: opt(FieldPath::SellerRegisterOfCompaniesLocation),
                sheet: opt(FieldPath::SellerRegistrationSheet),
                folio: opt(FieldPath::SellerRegistrationFolio),
                section: opt(FieldPath::SellerRegistrationSection),
                volume: opt(FieldPath::SellerRegistrationVolume),
                additional_registration_data: opt(FieldPath::SellerAdditionalRegistrationData),
            }),
            address_in_spain: Address {
                address: text(FieldPath::SellerAddress),
                post_code: text(FieldPath::SellerPostCode),
                town: text(FieldPath::SellerTown),
                province: text(FieldPath::SellerProvince),
                country_code: CountryCode::Esp,
            },
            contact_details: None,
        }),
    };

    let buyer = Business {
        party_identification: opt(FieldPath::BuyerPartyIdentification),
        tax_identification: TaxIdentification {
            person_type_code: PersonTypeCode::Natural,
            residence_type_code: ResidenceTypeCode::Resident,
            tax_identification_number: fields
                .require(FieldPath::BuyerTaxIdentificationNumber)?
                .to_string(),
        },
        entity: PartyEntity::Individual(Individual {
            name: fields.require(FieldPath::BuyerName)?.to_string(),
            first_surname: opt(FieldPath::BuyerFirstSurname),
            second_surname: opt(FieldPath::BuyerSecondSurname),
            address_in_spain: Address {
                address: text(FieldPath::BuyerAddress),
                post_code: text(FieldPath::BuyerPostCode),
                town: text(FieldPath::BuyerTown),
                province: text(FieldPath::BuyerProvince),
                country_code: CountryCode::Esp,
            },
        }),
    };

    Ok(Parties {
        seller_party: seller,
        buyer_party: buyer,
    })
}

fn parse_required_amount(
    fields: &ExtractedFieldSet,
    path: FieldPath,
) -> Result<Decimal, FacturaeError> {
    numeric::parse_amount(fields.require(path)?, path.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AddressConfig, IssuerConfig};

    fn issuer() -> IssuerConfig {
        IssuerConfig::builder()
            .tax_identification_number("B00000000")
            .corporate_name("Gestoría Ejemplo SL")
            .certificate_name("facturae-signing")
            .address(AddressConfig {
                address: "Calle Mayor 1".into(),
                post_code: "28001".into(),
                town: "Madrid".into(),
                province: "Madrid".into(),
            })
            .build()
            .unwrap()
    }

    fn header_row() -> Vec<&'static str> {
        vec!["Concepto", "Cantidad", "Importe", "Base", "IVA", ""]
    }

    fn base_fields() -> ExtractedFieldSet {
        let mut cells: Vec<String> = header_row().into_iter().map(String::from).collect();
        cells.extend(
            ["Consulting service", "2", "100.00", "82.64", "17.36", "0"]
                .into_iter()
                .map(String::from),
        );
        ExtractedFieldSet::default()
            .with_field(FieldPath::SellerTaxIdentificationNumber, "B11111111")
            .with_field(FieldPath::SellerCorporateName, "Vendedora SA")
            .with_field(FieldPath::BuyerTaxIdentificationNumber, "12345678Z")
            .with_field(FieldPath::BuyerName, "Ana")
            .with_field(FieldPath::BuyerFirstSurname, "García")
            .with_field(FieldPath::InvoiceNumber, "0127")
            .with_field(FieldPath::InvoiceSeriesCode, "A")
            .with_field(FieldPath::IssueDate, "04/05/2021")
            .with_field(FieldPath::TaxRate, "(21.00%)")
            .with_field(FieldPath::TaxableBase, "82,64")
            .with_field(FieldPath::TaxAmount, "17,36")
            .with_field(FieldPath::InvoiceTotal, "100,00")
            .with_field(FieldPath::TotalExecutableAmount, "100,00")
            .with_field(FieldPath::InstallmentDueDate, "04/06/2021")
            .with_field(FieldPath::InstallmentAmount, "100,00")
            .with_table(2, cells)
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn end_to_end_scenario_reconstructs_the_line() {
        let outcome = map_invoice(&base_fields(), &issuer()).unwrap();
        let invoice = outcome.document.invoice().unwrap();

        assert_eq!(invoice.items.invoice_line.len(), 1);
        let line = &invoice.items.invoice_line[0];
        assert_eq!(line.item_description, "Consulting service");
        assert_eq!(line.quantity, dec("2"));
        assert_eq!(line.gross_amount, dec("100.00"));
        assert_eq!(line.unit_price_without_tax, Some(dec("50.00")));
        assert_eq!(line.taxes_outputs.tax[0].tax_rate, dec("21.00"));
        assert_eq!(line.taxes_outputs.tax[0].taxable_base.total_amount, dec("82.64"));
        assert_eq!(line.taxes_outputs.tax[0].tax_amount.total_amount, dec("17.36"));
    }

    #[test]
    fn line_count_is_row_count_minus_header() {
        let mut cells: Vec<String> = header_row().into_iter().map(String::from).collect();
        for _ in 0..3 {
            cells.extend(
                ["Item", "1", "10,00", "8,26", "1,74", "0"]
                    .into_iter()
                    .map(String::from),
            );
        }
        let fields = base_fields().with_table(4, cells);
        let outcome = map_invoice(&fields, &issuer()).unwrap();
        assert_eq!(outcome.document.invoice().unwrap().items.invoice_line.len(), 3);
    }

    #[test]
    fn zero_quantity_line_has_no_unit_price() {
        let mut cells: Vec<String> = header_row().into_iter().map(String::from).collect();
        cells.extend(
            ["Suplido", "", "30,00", "30,00", "0,00", "0"]
                .into_iter()
                .map(String::from),
        );
        let fields = base_fields()
            .with_field(FieldPath::InvoiceTotal, "30,00")
            .with_table(2, cells);
        let outcome = map_invoice(&fields, &issuer()).unwrap();
        let line = &outcome.document.invoice().unwrap().items.invoice_line[0];
        assert_eq!(line.quantity, Decimal::ZERO);
        assert_eq!(line.unit_price_without_tax, None);
    }

    #[test]
    fn unit_price_rounds_to_two_decimals() {
        let mut cells: Vec<String> = header_row().into_iter().map(String::from).collect();
        cells.extend(
            ["Item", "3", "100,00", "82,64", "17,36", "0"]
                .into_iter()
                .map(String::from),
        );
        let fields = base_fields().with_table(2, cells);
        let outcome = map_invoice(&fields, &issuer()).unwrap();
        let line = &outcome.document.invoice().unwrap().items.invoice_line[0];
        // 100 / 3 = 33.333…, rounded to 2 decimals.
        assert_eq!(line.unit_price_without_tax, Some(dec("33.33")));
    }

    #[test]
    fn totals_mirror_tax_output_and_stated_total() {
        let outcome = map_invoice(&base_fields(), &issuer()).unwrap();
        let totals = &outcome.document.invoice().unwrap().invoice_totals;
        assert_eq!(totals.total_gross_amount, dec("82.64"));
        assert_eq!(totals.total_gross_amount_before_taxes, dec("82.64"));
        assert_eq!(totals.total_tax_outputs, dec("17.36"));
        assert_eq!(totals.invoice_total, dec("100.00"));
        assert_eq!(totals.total_outstanding_amount, dec("100.00"));
        assert!(!totals.has_surcharges());
        assert_eq!(totals.total_general_surcharges, None);
    }

    #[test]
    fn blank_charge_reason_emits_no_surcharge_section() {
        let fields = base_fields().with_field(FieldPath::ChargeReason, "   ");
        let outcome = map_invoice(&fields, &issuer()).unwrap();
        let totals = &outcome.document.invoice().unwrap().invoice_totals;
        assert!(!totals.has_surcharges());
        assert_eq!(totals.total_gross_amount_before_taxes, dec("82.64"));
    }

    #[test]
    fn surcharge_moves_three_totals_together() {
        let fields = base_fields()
            .with_field(FieldPath::ChargeReason, "Suplidos")
            .with_field(FieldPath::ChargeAmount, "12,50");
        let outcome = map_invoice(&fields, &issuer()).unwrap();
        let totals = &outcome.document.invoice().unwrap().invoice_totals;

        assert!(totals.has_surcharges());
        let charges = &totals.general_surcharges.as_ref().unwrap().charge;
        assert_eq!(charges.len(), 1);
        assert_eq!(charges[0].charge_reason, "Suplidos");
        assert_eq!(charges[0].charge_amount, dec("12.50"));
        assert_eq!(totals.total_general_surcharges, Some(dec("12.50")));

        assert_eq!(totals.total_gross_amount_before_taxes, dec("95.14"));
        assert_eq!(totals.invoice_total, dec("112.50"));
        assert_eq!(totals.total_outstanding_amount, dec("112.50"));
        // Executable amount and the plain gross amount do not move.
        assert_eq!(totals.total_executable_amount, dec("100.00"));
        assert_eq!(totals.total_gross_amount, dec("82.64"));

        // The batch aggregates mirror the adjusted invoice totals.
        let batch = &outcome.document.file_header.batch;
        assert_eq!(batch.total_invoices_amount.total_amount, dec("112.50"));
        assert_eq!(batch.total_outstanding_amount.total_amount, dec("112.50"));
    }

    #[test]
    fn batch_identifier_concatenates_in_order() {
        let outcome = map_invoice(&base_fields(), &issuer()).unwrap();
        assert_eq!(
            outcome.document.file_header.batch.batch_identifier,
            "B111111110127A"
        );
    }

    #[test]
    fn parties_have_fixed_person_types() {
        let outcome = map_invoice(&base_fields(), &issuer()).unwrap();
        let parties = &outcome.document.parties;
        assert_eq!(
            parties.seller_party.tax_identification.person_type_code,
            PersonTypeCode::Legal
        );
        assert_eq!(
            parties.buyer_party.tax_identification.person_type_code,
            PersonTypeCode::Natural
        );
        assert!(matches!(
            parties.seller_party.entity,
            PartyEntity::LegalEntity(_)
        ));
        assert!(matches!(
            parties.buyer_party.entity,
            PartyEntity::Individual(_)
        ));
    }

    #[test]
    fn third_party_comes_from_issuer_config() {
        let outcome = map_invoice(&base_fields(), &issuer()).unwrap();
        let third = &outcome.document.file_header.third_party;
        assert_eq!(third.tax_identification.tax_identification_number, "B00000000");
        assert_eq!(third.legal_entity.corporate_name, "Gestoría Ejemplo SL");
        assert_eq!(
            third.legal_entity.trade_name.as_deref(),
            Some("Gestoría Ejemplo SL")
        );
    }

    #[test]
    fn matching_line_sum_raises_no_warning() {
        let outcome = map_invoice(&base_fields(), &issuer()).unwrap();
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn mismatched_line_sum_warns_but_does_not_fail() {
        let fields = base_fields().with_field(FieldPath::InvoiceTotal, "120,00");
        let outcome = map_invoice(&fields, &issuer()).unwrap();
        assert_eq!(
            outcome.warnings,
            vec![MappingWarning::TotalMismatch {
                stated: dec("120.00"),
                line_sum: dec("100.00"),
            }]
        );
        // The stated total is trusted, not rewritten.
        assert_eq!(
            outcome.document.invoice().unwrap().invoice_totals.invoice_total,
            dec("120.00")
        );
    }

    #[test]
    fn short_tax_rate_text_fails() {
        let fields = base_fields().with_field(FieldPath::TaxRate, "(21%");
        let err = map_invoice(&fields, &issuer()).unwrap_err();
        assert!(matches!(err, FacturaeError::InvalidFieldValue { .. }));
    }

    #[test]
    fn missing_mandatory_field_names_the_path() {
        let mut raw = base_fields();
        raw = ExtractedFieldSet::default()
            .with_table(raw.table().row_count, raw.table().cells.clone());
        let err = map_invoice(&raw, &issuer()).unwrap_err();
        assert!(err.to_string().contains("TaxRate"), "got: {err}");
    }

    #[test]
    fn undersized_table_propagates_shape_error() {
        let fields = base_fields().with_table(3, vec!["only".into(), "two".into()]);
        let err = map_invoice(&fields, &issuer()).unwrap_err();
        assert!(matches!(err, FacturaeError::TableShape { .. }));
    }
}
