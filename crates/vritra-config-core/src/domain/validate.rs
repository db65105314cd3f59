//! Structural validation, enum coercion, and default merging.
//!
//! # Reject versus coerce
//!
//! Two kinds of problems can show up in a loaded document, and they are
//! handled differently:
//!
//! - **Structural** problems (root is not an object, a required key is
//!   missing) make [`validate`] fail.  The storage layer treats such a file as
//!   corrupt and runs its recovery path.
//! - **Enum** problems (a typo'd theme name, an unknown API selector) are
//!   repaired in place by [`coerce_enums`].  A bad theme degrades to the
//!   default theme instead of blocking shell startup.

use tracing::warn;

use super::defaults::{keys, API_BASES, DEFAULT_API_BASE, DEFAULT_THEME, REQUIRED_KEYS, THEMES};
use super::document::{ConfigDocument, ConfigValue, DocumentError};

/// Checks that `raw` is a JSON object carrying every required key.
///
/// # Errors
///
/// Returns [`DocumentError::NotAnObject`] or
/// [`DocumentError::MissingRequiredKey`] naming the first absent key.
pub fn validate(raw: &serde_json::Value) -> Result<(), DocumentError> {
    let object = raw.as_object().ok_or(DocumentError::NotAnObject)?;

    match REQUIRED_KEYS.iter().find(|key| !object.contains_key(**key)) {
        Some(missing) => Err(DocumentError::MissingRequiredKey((*missing).to_string())),
        None => Ok(()),
    }
}

/// Checks that an in-memory document carries every required key.
///
/// This is the [`validate`] rule applied to a document about to be saved,
/// which is an object by construction.
///
/// # Errors
///
/// Returns [`DocumentError::MissingRequiredKey`] naming the first absent key.
pub fn validate_document(doc: &ConfigDocument) -> Result<(), DocumentError> {
    match REQUIRED_KEYS.iter().find(|key| !doc.contains_key(key)) {
        Some(missing) => Err(DocumentError::MissingRequiredKey((*missing).to_string())),
        None => Ok(()),
    }
}

/// Record of one enum field that [`coerce_enums`] reset.
#[derive(Debug, Clone, PartialEq)]
pub struct Coercion {
    /// The document key that was reset.
    pub key: &'static str,
    /// The value that failed the closed-set check (`None` if absent).
    pub rejected: Option<ConfigValue>,
    /// The value written in its place.
    pub replacement: &'static str,
}

/// Resets enum-constrained fields that fall outside their closed set.
///
/// - `theme` must be a string naming one of [`THEMES`].  A missing theme is
///   left alone because that is a structural problem for [`validate`].
/// - `api_base` must be one of [`API_BASES`]; absent or unknown values are
///   reset.
///
/// Returns one [`Coercion`] per field changed, in key order.
pub fn coerce_enums(doc: &mut ConfigDocument) -> Vec<Coercion> {
    let mut changes = Vec::new();

    if let Some(theme) = doc.get(keys::THEME) {
        if !is_member(theme, &THEMES) {
            changes.push(Coercion {
                key: keys::THEME,
                rejected: Some(theme.clone()),
                replacement: DEFAULT_THEME,
            });
        }
    }

    let api_base = doc.get(keys::API_BASE);
    if !api_base.is_some_and(|v| is_member(v, &API_BASES)) {
        changes.push(Coercion {
            key: keys::API_BASE,
            rejected: api_base.cloned(),
            replacement: DEFAULT_API_BASE,
        });
    }

    for change in &changes {
        doc.insert(change.key, change.replacement);
    }
    changes
}

fn is_member(value: &ConfigValue, set: &[&str]) -> bool {
    value.as_str().is_some_and(|s| set.contains(&s))
}

/// Overlays `loaded` on top of `defaults` and coerces enum fields.
///
/// Every key in `loaded` wins, including keys the defaults do not know about.
/// Keys only present in `defaults` are backfilled.  Coerced fields are logged
/// at `warn` level.
pub fn merge_with_defaults(defaults: &ConfigDocument, loaded: &ConfigDocument) -> ConfigDocument {
    let mut merged = defaults.clone();
    for (key, value) in loaded {
        merged.insert(key.clone(), value.clone());
    }

    for change in coerce_enums(&mut merged) {
        match &change.rejected {
            Some(value) => warn!(
                "configuration `{}` value {} is not recognised; using \"{}\"",
                change.key, value, change.replacement
            ),
            None => warn!(
                "configuration `{}` is missing; using \"{}\"",
                change.key, change.replacement
            ),
        }
    }
    merged
}

// ── Tests ─────────────────────────────────────────────────────────────────────
