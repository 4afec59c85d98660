//! Reconstruction stages between extracted fields and the invoice document.
//!
//! Each submodule implements exactly one transformation and performs no I/O,
//! so every stage is independently testable and the whole reconstruction is
//! a pure function of its inputs.
//!
//! ## Data Flow
//!
//! ```text
//! ExtractedFieldSet ──▶ numeric ──▶ table ──▶ mapping ──▶ FacturaeDocument
//!  (dotted paths +      (locale     (grid     (header, parties,
//!   flat table cells)    parsing)    shape)    totals, lines)
//! ```
//!
//! 1. [`numeric`] — parse locale-formatted amounts, decorated tax rates and
//!    `dd/MM/yyyy` dates into exact decimals/dates
//! 2. [`table`]   — reshape the flat cell sequence into a row-major grid and
//!    expose the fixed column contract
//! 3. [`mapping`] — assemble the complete invoice document and enforce the
//!    cross-field numeric rules

pub mod mapping;
pub mod numeric;
pub mod table;
