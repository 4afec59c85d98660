//! The activity boundary between the orchestrator and the external world.
//!
//! Each workflow stage issues exactly one request through the [`Activities`]
//! trait and consumes the response; no other effect is visible to the
//! orchestrator. The hosting runtime — not the orchestrator — owns retry and
//! backoff, so every operation here must tolerate at-least-once invocation:
//! resolving access twice yields two equivalent grants, mapping is pure, and
//! uploading overwrites the same derived artifact path.
//!
//! [`HttpActivities`] is the production implementation: thin REST clients in
//! front of the storage facade, the document-analysis service, the
//! company→model registry and the signing service. Nothing beyond the
//! request/response contract is assumed about any of them.

use crate::config::{IssuerConfig, ServiceEndpoints};
use crate::error::FacturaeError;
use crate::fields::{ExtractedFieldSet, RawFieldSet};
use crate::pipeline::mapping::{self, MappingWarning};
use crate::xml::{self, XmlDeclaration};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

// ── Signature constants ──────────────────────────────────────────────────
// Fixed, versioned signature policy: these are constants of the produced
// artifact format, not per-call configuration.

/// Identifier of the facturae 3.1 signature policy.
pub const SIGNATURE_POLICY_IDENTIFIER: &str =
    "http://www.facturae.es/politica_de_firma_formato_facturae/politica_de_firma_formato_facturae_v3_1.pdf";
/// Digest of the signature policy document.
pub const SIGNATURE_POLICY_HASH: &str = "Ohixl6upD6av8N7pEvDABhEL6hM=";
/// Claimed role of the signer.
pub const SIGNER_ROLE: &str = "emisor";
/// MIME type of the signed payload.
pub const SIGNED_MIME_TYPE: &str = "text/xml";
/// File extension of the stored signed artifact.
pub const SIGNED_EXTENSION: &str = "xsig";

/// Storage path of a signed artifact, derived from its source document.
pub fn signed_document_path(container_id: &str, document_id: &str) -> String {
    format!("{container_id}/signedDocuments/{document_id}.{SIGNED_EXTENSION}")
}

// ── Stage payloads ───────────────────────────────────────────────────────

/// Temporary access to one stored document, scoped to a single workflow
/// instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGrant {
    /// SAS-style temporary URI granting read access to the raw document.
    pub access_uri: String,
    /// Storage container holding the document.
    pub container_id: String,
    /// Document name within the container.
    pub document_id: String,
}

/// Result of the mapping stage: the declaration-free invoice XML the signer
/// consumes, plus the non-fatal diagnostics raised while mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedInvoice {
    pub xml: String,
    #[serde(default)]
    pub warnings: Vec<MappingWarning>,
}

/// A signed artifact, transported base64-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedDocument {
    pub content_base64: String,
}

impl SignedDocument {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        SignedDocument {
            content_base64: BASE64.encode(bytes),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, FacturaeError> {
        BASE64
            .decode(&self.content_base64)
            .map_err(|e| FacturaeError::Internal(format!("signed artifact is not base64: {e}")))
    }
}

// ── Activity trait ───────────────────────────────────────────────────────

/// The five retryable units of work the orchestrator can invoke.
///
/// Four reach external collaborators; `map` is CPU-only but crosses the same
/// seam so that replay can skip it like any other completed stage.
#[async_trait]
pub trait Activities: Send + Sync {
    /// Resolve a document locator into a temporary access grant.
    async fn resolve_access(&self, document_locator: &str) -> Result<AccessGrant, FacturaeError>;

    /// Run document analysis on the granted document and return the
    /// extracted fields and table.
    async fn analyze(&self, grant: &AccessGrant) -> Result<ExtractedFieldSet, FacturaeError>;

    /// Reconstruct the invoice document from the extracted fields.
    async fn map(&self, fields: &ExtractedFieldSet) -> Result<MappedInvoice, FacturaeError>;

    /// Apply the enveloped signature to the declaration-free invoice XML.
    async fn sign(&self, invoice_xml: &[u8]) -> Result<SignedDocument, FacturaeError>;

    /// Store the signed artifact under the derived artifact path.
    async fn upload(
        &self,
        signed: &SignedDocument,
        container_id: &str,
        document_id: &str,
    ) -> Result<(), FacturaeError>;
}

// ── HTTP implementation ──────────────────────────────────────────────────

#[derive(Serialize)]
struct ResolveAccessRequest<'a> {
    url: &'a str,
}

#[derive(Deserialize)]
struct ResolveAccessResponse {
    access_uri: String,
    container_id: String,
    document_id: String,
}

#[derive(Deserialize)]
struct ModelLookupResponse {
    model_id: Option<String>,
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    access_uri: &'a str,
    model_id: &'a str,
}

#[derive(Serialize)]
struct SignRequest<'a> {
    certificate_name: &'a str,
    policy_identifier: &'a str,
    policy_hash: &'a str,
    signer_role: &'a str,
    mime_type: &'a str,
    content_base64: String,
}

#[derive(Deserialize)]
struct SignResponse {
    signed_base64: String,
}

#[derive(Serialize)]
struct UploadRequest<'a> {
    content_base64: &'a str,
}

/// Production activity layer: REST clients over the configured service
/// endpoints, plus the in-process mapping engine.
pub struct HttpActivities {
    client: reqwest::Client,
    endpoints: ServiceEndpoints,
    issuer: IssuerConfig,
}

impl HttpActivities {
    pub fn new(
        endpoints: ServiceEndpoints,
        issuer: IssuerConfig,
    ) -> Result<Self, FacturaeError> {
        endpoints.validate()?;
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(endpoints.request_timeout_secs))
            .build()
            .map_err(|e| FacturaeError::Internal(format!("HTTP client: {e}")))?;
        Ok(HttpActivities {
            client,
            endpoints,
            issuer,
        })
    }

    /// Recognition model id for a container, from the company registry.
    ///
    /// A container with no associated model is a configuration gap, not an
    /// analysis failure.
    async fn lookup_model_id(&self, container_id: &str) -> Result<String, FacturaeError> {
        let url = format!("{}/companies/{container_id}/model", self.endpoints.registry_url);
        let response = self.client.get(&url).send().await.map_err(|e| {
            FacturaeError::Configuration {
                key: format!("model lookup for '{container_id}' unreachable: {e}"),
            }
        })?;
        if !response.status().is_success() {
            return Err(FacturaeError::Configuration {
                key: format!("no model registered for container '{container_id}'"),
            });
        }
        let lookup: ModelLookupResponse = response.json().await.map_err(|e| {
            FacturaeError::Configuration {
                key: format!("model lookup for '{container_id}' malformed: {e}"),
            }
        })?;
        lookup.model_id.ok_or_else(|| FacturaeError::Configuration {
            key: format!("no model registered for container '{container_id}'"),
        })
    }
}

#[async_trait]
impl Activities for HttpActivities {
    async fn resolve_access(&self, document_locator: &str) -> Result<AccessGrant, FacturaeError> {
        let url = format!("{}/access", self.endpoints.storage_url);
        let response = self
            .client
            .post(&url)
            .json(&ResolveAccessRequest {
                url: document_locator,
            })
            .send()
            .await
            .map_err(|e| FacturaeError::Storage {
                detail: format!("access resolution failed: {e}"),
            })?;
        if !response.status().is_success() {
            return Err(FacturaeError::Storage {
                detail: format!(
                    "cannot resolve '{document_locator}': HTTP {}",
                    response.status()
                ),
            });
        }
        let grant: ResolveAccessResponse =
            response.json().await.map_err(|e| FacturaeError::Storage {
                detail: format!("access response malformed: {e}"),
            })?;
        debug!(container = %grant.container_id, document = %grant.document_id, "access resolved");
        Ok(AccessGrant {
            access_uri: grant.access_uri,
            container_id: grant.container_id,
            document_id: grant.document_id,
        })
    }

    async fn analyze(&self, grant: &AccessGrant) -> Result<ExtractedFieldSet, FacturaeError> {
        let model_id = self.lookup_model_id(&grant.container_id).await?;
        info!(model = %model_id, "analyzing document");

        let url = format!("{}/analyze", self.endpoints.analysis_url);
        let response = self
            .client
            .post(&url)
            .json(&AnalyzeRequest {
                access_uri: &grant.access_uri,
                model_id: &model_id,
            })
            .send()
            .await
            .map_err(|e| FacturaeError::Recognition {
                detail: format!("analysis request failed: {e}"),
            })?;
        if !response.status().is_success() {
            return Err(FacturaeError::Recognition {
                detail: format!("analysis failed: HTTP {}", response.status()),
            });
        }
        let raw: RawFieldSet = response.json().await.map_err(|e| FacturaeError::Recognition {
            detail: format!("analysis response malformed: {e}"),
        })?;
        Ok(ExtractedFieldSet::from_raw(raw))
    }

    async fn map(&self, fields: &ExtractedFieldSet) -> Result<MappedInvoice, FacturaeError> {
        let outcome = mapping::map_invoice(fields, &self.issuer)?;
        let xml = xml::to_xml(&outcome.document, XmlDeclaration::Omit)?;
        Ok(MappedInvoice {
            xml,
            warnings: outcome.warnings,
        })
    }

    async fn sign(&self, invoice_xml: &[u8]) -> Result<SignedDocument, FacturaeError> {
        let url = format!("{}/sign", self.endpoints.signer_url);
        let response = self
            .client
            .post(&url)
            .json(&SignRequest {
                certificate_name: &self.issuer.certificate_name,
                policy_identifier: SIGNATURE_POLICY_IDENTIFIER,
                policy_hash: SIGNATURE_POLICY_HASH,
                signer_role: SIGNER_ROLE,
                mime_type: SIGNED_MIME_TYPE,
                content_base64: BASE64.encode(invoice_xml),
            })
            .send()
            .await
            .map_err(|e| FacturaeError::Signing {
                detail: format!("sign request failed: {e}"),
            })?;
        if !response.status().is_success() {
            return Err(FacturaeError::Signing {
                detail: format!("signer refused: HTTP {}", response.status()),
            });
        }
        let signed: SignResponse = response.json().await.map_err(|e| FacturaeError::Signing {
            detail: format!("signer response malformed: {e}"),
        })?;
        Ok(SignedDocument {
            content_base64: signed.signed_base64,
        })
    }

    async fn upload(
        &self,
        signed: &SignedDocument,
        container_id: &str,
        document_id: &str,
    ) -> Result<(), FacturaeError> {
        let path = signed_document_path(container_id, document_id);
        let url = format!("{}/containers/{path}", self.endpoints.storage_url);
        let response = self
            .client
            .put(&url)
            .json(&UploadRequest {
                content_base64: &signed.content_base64,
            })
            .send()
            .await
            .map_err(|e| FacturaeError::Storage {
                detail: format!("upload failed: {e}"),
            })?;
        if !response.status().is_success() {
            return Err(FacturaeError::Storage {
                detail: format!("upload of '{path}' refused: HTTP {}", response.status()),
            });
        }
        info!(%path, "signed artifact stored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_path_is_derived_from_container_and_document() {
        assert_eq!(
            signed_document_path("invoices-acme", "scan-0042"),
            "invoices-acme/signedDocuments/scan-0042.xsig"
        );
    }

    #[test]
    fn signed_document_base64_round_trip() {
        let doc = SignedDocument::from_bytes(b"<Facturae/>");
        assert_eq!(doc.to_bytes().unwrap(), b"<Facturae/>");
    }

    #[test]
    fn invalid_base64_is_an_internal_error() {
        let doc = SignedDocument {
            content_base64: "not base64!!".into(),
        };
        assert!(matches!(
            doc.to_bytes().unwrap_err(),
            FacturaeError::Internal(_)
        ));
    }

    #[test]
    fn http_activities_reject_invalid_endpoints() {
        let endpoints = ServiceEndpoints {
            storage_url: "not-a-url".into(),
            analysis_url: "https://a.example".into(),
            registry_url: "https://r.example".into(),
            signer_url: "https://s.example".into(),
            request_timeout_secs: 5,
        };
        let issuer = crate::config::IssuerConfig::builder()
            .tax_identification_number("B00000000")
            .corporate_name("Gestoría Ejemplo SL")
            .certificate_name("facturae-signing")
            .address(crate::config::AddressConfig {
                address: "Calle Mayor 1".into(),
                post_code: "28001".into(),
                town: "Madrid".into(),
                province: "Madrid".into(),
            })
            .build()
            .unwrap();
        assert!(HttpActivities::new(endpoints, issuer).is_err());
    }
}
