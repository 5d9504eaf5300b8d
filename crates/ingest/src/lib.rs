//! # Ingest
//!
//! Everything that turns URLs into saved memories:
//!
//! - [`filter`] - blocklist filtering and visit-count-aware history dedup
//! - [`pipeline`] - the history ingestion state machine
//!   (filtering → ai-selection → fetching → complete, with an absorbing
//!   error state)
//! - [`flows`] - single-URL save and bookmark import
//! - [`capture`] - the web-capture processor behind the local control channel
//! - [`persist`] - the shared clean → trim → summarize → embed → store path

pub mod capture;
pub mod filter;
pub mod flows;
pub mod persist;
pub mod pipeline;

pub use capture::CaptureProcessor;
pub use flows::SaveFlows;
pub use pipeline::HistoryPipeline;
