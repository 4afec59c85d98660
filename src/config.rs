//! Issuer and service configuration.
//!
//! The mapping engine consumes a fixed set of issuer values (tax identity,
//! legal entity data, registration data) that describe the system operator
//! acting as the document's third-party intermediary. They are process-wide
//! constants in deployment, but they are passed around as an explicit
//! [`IssuerConfig`] value — never read from ambient/global state — so the
//! engine stays a pure function of its inputs.
//!
//! # Design choice: builder over constructor
//! The issuer record has over a dozen fields, most optional. The builder
//! lets deployments set only what they have and surfaces a
//! [`FacturaeError::Configuration`] naming the first missing mandatory key
//! at `build()` time instead of failing mid-pipeline.

use crate::error::FacturaeError;
use serde::{Deserialize, Serialize};

/// Identity of the invoice issuer (the operator of this system).
///
/// Emitted verbatim into the file header's third-party block and used for
/// certificate selection at signing time. Loaded from a JSON file in the CLI,
/// or built programmatically via [`IssuerConfig::builder()`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerConfig {
    /// Issuer tax identification number (NIF/CIF).
    pub tax_identification_number: String,
    /// Registered corporate name.
    pub corporate_name: String,
    /// Trade name; falls back to the corporate name when absent.
    #[serde(default)]
    pub trade_name: Option<String>,
    /// Mercantile-registry entry of the issuer.
    pub registration: RegistrationConfig,
    /// Registered office address.
    pub address: AddressConfig,
    /// Published contact details, all optional.
    #[serde(default)]
    pub contact: ContactConfig,
    /// Name of the signing certificate in the external key service.
    pub certificate_name: String,
}

/// Mercantile-registry data for the issuer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationConfig {
    #[serde(default)]
    pub book: Option<String>,
    #[serde(default)]
    pub register_of_companies_location: Option<String>,
    #[serde(default)]
    pub sheet: Option<String>,
    #[serde(default)]
    pub folio: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub volume: Option<String>,
}

/// Postal address of the issuer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressConfig {
    pub address: String,
    pub post_code: String,
    pub town: String,
    pub province: String,
}

/// Contact details of the issuer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactConfig {
    #[serde(default)]
    pub telephone: Option<String>,
    #[serde(default)]
    pub tele_fax: Option<String>,
    #[serde(default)]
    pub web_address: Option<String>,
    #[serde(default)]
    pub electronic_mail: Option<String>,
    #[serde(default)]
    pub cno_cnae: Option<String>,
}

impl IssuerConfig {
    /// Create a new builder for `IssuerConfig`.
    pub fn builder() -> IssuerConfigBuilder {
        IssuerConfigBuilder::default()
    }

    /// Trade name to emit, defaulting to the corporate name.
    pub fn trade_name_or_corporate(&self) -> &str {
        self.trade_name.as_deref().unwrap_or(&self.corporate_name)
    }
}

/// Builder for [`IssuerConfig`].
#[derive(Debug, Default)]
pub struct IssuerConfigBuilder {
    tax_identification_number: Option<String>,
    corporate_name: Option<String>,
    trade_name: Option<String>,
    registration: RegistrationConfig,
    address: Option<AddressConfig>,
    contact: ContactConfig,
    certificate_name: Option<String>,
}

impl IssuerConfigBuilder {
    pub fn tax_identification_number(mut self, nif: impl Into<String>) -> Self {
        self.tax_identification_number = Some(nif.into());
        self
    }

    pub fn corporate_name(mut self, name: impl Into<String>) -> Self {
        self.corporate_name = Some(name.into());
        self
    }

    pub fn trade_name(mut self, name: impl Into<String>) -> Self {
        self.trade_name = Some(name.into());
        self
    }

    pub fn registration(mut self, registration: RegistrationConfig) -> Self {
        self.registration = registration;
        self
    }

    pub fn address(mut self, address: AddressConfig) -> Self {
        self.address = Some(address);
        self
    }

    pub fn contact(mut self, contact: ContactConfig) -> Self {
        self.contact = contact;
        self
    }

    pub fn certificate_name(mut self, name: impl Into<String>) -> Self {
        self.certificate_name = Some(name.into());
        self
    }

    /// Build the configuration, validating mandatory values.
    pub fn build(self) -> Result<IssuerConfig, FacturaeError> {
        let tax_identification_number =
            required(self.tax_identification_number, "issuer.tax_identification_number")?;
        let corporate_name = required(self.corporate_name, "issuer.corporate_name")?;
        let certificate_name = required(self.certificate_name, "issuer.certificate_name")?;
        let address = self.address.ok_or(FacturaeError::Configuration {
            key: "issuer.address".into(),
        })?;
        if address.address.trim().is_empty() {
            return Err(FacturaeError::Configuration {
                key: "issuer.address.address".into(),
            });
        }

        Ok(IssuerConfig {
            tax_identification_number,
            corporate_name,
            trade_name: self.trade_name,
            registration: self.registration,
            address,
            contact: self.contact,
            certificate_name,
        })
    }
}

fn required(value: Option<String>, key: &str) -> Result<String, FacturaeError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(FacturaeError::Configuration { key: key.into() }),
    }
}

// ── Service endpoints ────────────────────────────────────────────────────

/// Base URLs of the external collaborators reached by the activity layer.
///
/// Each service is a thin request/response boundary; nothing beyond the
/// interface contract is assumed about what runs behind a URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEndpoints {
    /// Blob/object storage facade (access resolution and artifact upload).
    pub storage_url: String,
    /// Document-analysis (form-understanding) service.
    pub analysis_url: String,
    /// Company→recognition-model lookup store.
    pub registry_url: String,
    /// XML digital-signature service.
    pub signer_url: String,
    /// Per-request timeout in seconds. Default: 60.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    60
}

impl ServiceEndpoints {
    /// Validate that every endpoint is a non-empty HTTP(S) URL.
    pub fn validate(&self) -> Result<(), FacturaeError> {
        for (key, url) in [
            ("endpoints.storage_url", &self.storage_url),
            ("endpoints.analysis_url", &self.analysis_url),
            ("endpoints.registry_url", &self.registry_url),
            ("endpoints.signer_url", &self.signer_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(FacturaeError::Configuration { key: key.into() });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn minimal_builder() -> IssuerConfigBuilder {
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
    }

    #[test]
    fn build_succeeds_with_mandatory_fields() {
        let issuer = minimal_builder().build().unwrap();
        assert_eq!(issuer.trade_name_or_corporate(), "Gestoría Ejemplo SL");
    }

    #[test]
    fn build_rejects_missing_certificate() {
        let err = IssuerConfig::builder()
            .tax_identification_number("B00000000")
            .corporate_name("Gestoría Ejemplo SL")
            .address(AddressConfig::default())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("certificate_name"), "got: {err}");
    }

    #[test]
    fn build_rejects_blank_tax_number() {
        let err = minimal_builder()
            .tax_identification_number("   ")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("tax_identification_number"));
    }

    #[test]
    fn trade_name_overrides_corporate_name() {
        let issuer = minimal_builder().trade_name("Ejemplo").build().unwrap();
        assert_eq!(issuer.trade_name_or_corporate(), "Ejemplo");
    }

    #[test]
    fn endpoints_validate_rejects_non_http() {
        let eps = ServiceEndpoints {
            storage_url: "https://storage.example".into(),
            analysis_url: "ftp://nope".into(),
            registry_url: "https://registry.example".into(),
            signer_url: "https://signer.example".into(),
            request_timeout_secs: 60,
        };
        assert!(eps.validate().is_err());
    }

    #[test]
    fn endpoints_default_timeout_from_json() {
        let eps: ServiceEndpoints = serde_json::from_str(
            r#"{
                "storage_url": "https://s.example",
                "analysis_url": "https://a.example",
                "registry_url": "https://r.example",
                "signer_url": "https://x.example"
            }"#,
        )
        .unwrap();
        assert_eq!(eps.request_timeout_secs, 60);
        assert!(eps.validate().is_ok());
    }
}
