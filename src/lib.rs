//! Job application autofill core
//!
//! Two halves share one parsed page:
//! - Field matching: signal extraction per control, a certainty-staged
//!   matcher and a multi-signal scorer over a field catalog, confirmation
//!   fields, select options, and a fill driver that commits through a
//!   host-provided capability
//! - Job extraction: JSON-LD, ARIA, regex and phrase strategies run
//!   concurrently and are merged by source weight, with an LLM fallback for
//!   pages the cheap strategies could not read
//!
//! A C ABI in [`ffi`] exposes both to non-Rust hosts.

pub mod catalog;
pub mod config;
pub mod dom;
pub mod error;
pub mod extraction;
pub mod ffi;
pub mod fill;
pub mod matching;
pub mod platform;
pub mod profile;
pub mod session;

pub use config::AutofillConfig;
pub use error::{AutofillError, Result};
pub use extraction::{ExtractionPipeline, JobField, JobRecord, LlmFallback, LlmTransport, PageContent};
pub use ffi::*;
pub use fill::{ControlCommitter, FillReport, FillValue, FormFiller};
pub use matching::{MatchCandidate, MatchMode, MatchSource};
pub use platform::Platform;
pub use profile::Profile;
pub use session::{PageSession, PageSessionBuilder};
