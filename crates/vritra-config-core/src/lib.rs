//! # vritra-config-core
//!
//! The settings document model, the canonical default document, and the
//! validation and merge rules applied to every document read from or written
//! to disk.  No file system, locks, or clocks; the persistence machinery
//! lives in the `vritra-config` crate.
//!
//! - **`domain::document`** – [`ConfigDocument`], an ordered map from string
//!   keys to scalar [`ConfigValue`]s.
//! - **`domain::defaults`** – The default document, valid themes and API
//!   selectors, and the required keys.
//! - **`domain::validate`** – Structural validation, enum coercion, and the
//!   merge that backfills keys added by newer releases.

pub mod domain;

pub use domain::defaults::{
    default_document, is_metadata_key, keys, API_BASES, DEFAULT_API_BASE, DEFAULT_THEME,
    REQUIRED_KEYS, THEMES,
};
pub use domain::document::{ConfigDocument, ConfigValue, DocumentError};
pub use domain::validate::{
    coerce_enums, merge_with_defaults, validate, validate_document, Coercion,
};
