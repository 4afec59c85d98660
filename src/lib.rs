//! # scan2facturae
//!
//! Turn a scanned Spanish invoice into a legally structured Facturae 3.2
//! document and a cryptographically signed artifact.
//!
//! ## Why this crate?
//!
//! OCR output is loosely typed: dotted-path text fields, locale-formatted
//! numbers, a flat table of cells. An electronic invoice is the opposite —
//! strictly typed, schema-ordered, with fixed-precision monetary arithmetic
//! that downstream validators re-check. This crate owns the gap between the
//! two: a deterministic reconstruction engine plus a replayable workflow
//! that sequences the external services around it.
//!
//! ## Pipeline Overview
//!
//! ```text
//! document URL
//!  │
//!  ├─ 1. ResolveAccess  storage facade → temporary access grant
//!  ├─ 2. Analyze        form-understanding service → extracted fields/table
//!  ├─ 3. Map            pure reconstruction → Facturae XML (CPU-only)
//!  ├─ 4. Sign           enveloped XAdES signature via the signing service
//!  └─ 5. Upload         signed artifact → <container>/signedDocuments/…
//! ```
//!
//! Stages run strictly sequentially within an instance; every stage result
//! is persisted so a replayed instance never re-invokes completed work, and
//! any failure moves the instance to an absorbing `Failed` state with no
//! compensation.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scan2facturae::{run, HttpActivities, IssuerConfig, ServiceEndpoints, WorkflowInstance};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let issuer: IssuerConfig = serde_json::from_str(&std::fs::read_to_string("issuer.json")?)?;
//!     let endpoints: ServiceEndpoints =
//!         serde_json::from_str(&std::fs::read_to_string("endpoints.json")?)?;
//!     let activities = HttpActivities::new(endpoints, issuer)?;
//!
//!     let mut instance = WorkflowInstance::start("https://storage.example/inbox/invoice.pdf");
//!     run(&mut instance, &activities).await?;
//!     println!("instance {} completed", instance.instance_id());
//!     Ok(())
//! }
//! ```
//!
//! The reconstruction engine is also usable offline — feed
//! [`pipeline::mapping::map_invoice`] an [`ExtractedFieldSet`] and an
//! [`IssuerConfig`] and serialize the result with [`xml::to_xml`]; no
//! service needs to be reachable.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `scan2facturae` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod activity;
pub mod config;
pub mod document;
pub mod error;
pub mod fields;
pub mod pipeline;
pub mod workflow;
pub mod xml;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use activity::{Activities, AccessGrant, HttpActivities, MappedInvoice, SignedDocument};
pub use config::{IssuerConfig, ServiceEndpoints};
pub use document::FacturaeDocument;
pub use error::FacturaeError;
pub use fields::{ExtractedFieldSet, FieldPath, RawFieldSet};
pub use pipeline::mapping::{map_invoice, MappingOutcome, MappingWarning};
pub use workflow::{run, RunState, Stage, StorageCreatedEvent, WorkflowInstance};
pub use xml::{from_xml, to_xml, XmlDeclaration};
