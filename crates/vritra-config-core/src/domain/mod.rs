//! Domain entities for the settings subsystem.
//!
//! This module contains pure logic with no infrastructure dependencies.
//!
//! # Why keep the domain pure? (for beginners)
//!
//! Everything in here can be compiled and tested without touching the disk.
//! The rules that decide whether a document is acceptable (required keys,
//! closed enum sets, default backfill) are the same whether the document came
//! from a file, from a test fixture, or from a caller about to save it, so
//! they live in one place and the storage layer simply calls them.

/// The canonical default document and the closed value sets.
pub mod defaults;

/// The settings document and its scalar value type.
///
/// See [`document::ConfigDocument`] for the main type.
pub mod document;

/// Structural validation, enum coercion and default merging.
pub mod validate;
