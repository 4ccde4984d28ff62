//! Matforge End-to-End Test Infrastructure
//!
//! Integration tests for the full conversion and export flows:
//!
//! - Pipeline: raw shader bag -> material -> backend text
//! - **Determinism**: byte-identical output across runs
//! - Texture sharing: one emitted definition per image content per run
//! - Backend coverage: every material kind through both backends
//! - Preset overrides: fingerprint hits, default overlays, store failures
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p matforge-tests
//! ```

pub mod fixtures;

pub use fixtures::{convert, convert_with_store, object};
