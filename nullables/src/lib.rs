//! Nullable capabilities for deterministic testing.
//!
//! The external dependencies of the liveness core — action analysis,
//! identity matching, audit — are abstracted behind traits. This crate
//! provides implementations that return pre-configured values, can be
//! controlled programmatically, and never touch the network or a model.
//!
//! Usage: swap the real capabilities for nullables in tests.

pub mod analyzer;
pub mod audit;
pub mod matcher;

pub use analyzer::NullAnalyzer;
pub use audit::RecordingAudit;
pub use matcher::NullMatcher;
