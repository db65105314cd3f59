//! The canonical default document and the closed value sets.
//!
//! Every key the shell knows about appears in [`default_document`].  When a
//! newer release adds a key, adding it here is enough: documents written by
//! older releases pick it up through
//! [`merge_with_defaults`](super::validate::merge_with_defaults) the next time
//! they are loaded.

use super::document::{ConfigDocument, ConfigValue};

/// Well-known document keys.
pub mod keys {
    pub const API_KEY: &str = "api_key";
    pub const GEMINI_API_KEY: &str = "gemini_api_key";
    pub const API_BASE: &str = "api_base";
    pub const MODEL: &str = "model";
    pub const AI_ENABLED: &str = "ai_enabled";

    pub const THEME: &str = "theme";
    pub const PROMPT_STYLE: &str = "prompt_style";

    pub const BANNER_ID: &str = "banner_id";
    pub const BANNER_RANDOM: &str = "banner_random";
    pub const BANNER_SYNC: &str = "banner_sync";

    pub const SAFE_MODE: &str = "safe_mode";
    pub const AUTO_BACKUP: &str = "auto_backup";
    pub const LOG_COMMANDS: &str = "log_commands";
    pub const COMMAND_PREFIX: &str = "command_prefix";
    pub const PARANOID_MODE: &str = "paranoid_mode";
    pub const MODEL_PROFILE: &str = "model_profile";
    pub const OFFLINE_MODE: &str = "offline_mode";
    pub const AUTO_MODEL_SWITCH: &str = "auto_model_switch";

    pub const FEEDBACK_WORKER_URL: &str = "feedback_worker_url";

    /// Application version that last saved the document.
    pub const CONFIG_VERSION: &str = "_config_version";
    /// Epoch seconds at which the document was first created.
    pub const CREATED_TIMESTAMP: &str = "_created_timestamp";
    /// Epoch seconds of the most recent save.
    pub const LAST_UPDATED: &str = "_last_updated";
    /// Number of saves since creation.
    pub const UPDATE_COUNT: &str = "_update_count";

    /// Prefix shared by every subsystem-owned metadata key.
    pub const METADATA_PREFIX: &str = "_";
}

/// Keys that must be present for a document to be structurally valid.
pub const REQUIRED_KEYS: [&str; 3] = [keys::API_KEY, keys::THEME, keys::PROMPT_STYLE];

/// Every theme identifier the shell can render.
pub const THEMES: [&str; 37] = [
    "dark",
    "light",
    "retro",
    "cyberpunk",
    "matrix",
    "hacker_green",
    "terminal_green",
    "neon",
    "rainbow",
    "purple",
    "cherry",
    "mint",
    "ocean",
    "sunset",
    "forest",
    "winter",
    "spring",
    "summer",
    "grayscale",
    "royal",
    "coffee",
    "autumn",
    "pastel",
    "toxic",
    "volcano",
    "galaxy",
    "deep_sea",
    "candy",
    "lava",
    "ice",
    "electric",
    "forest_night",
    "synthwave",
    "desert_sunset",
    "midnight",
    "sunrise",
    "lavender",
];

/// Theme used for fresh documents and for unrecognised theme values.
pub const DEFAULT_THEME: &str = "dark";

/// The two supported AI API back-ends.
pub const API_BASES: [&str; 2] = ["openrouter", "gemini"];

/// API selector used for fresh documents and for unrecognised values.
pub const DEFAULT_API_BASE: &str = "gemini";

/// Returns `true` for keys owned by the subsystem rather than the user.
pub fn is_metadata_key(key: &str) -> bool {
    key.starts_with(keys::METADATA_PREFIX)
}

/// Builds the canonical default document.
///
/// Metadata fields start out unset (`null`) with an update count of 0; the
/// storage layer stamps them on the first save.
pub fn default_document() -> ConfigDocument {
    [
        (keys::API_KEY, ConfigValue::from("")),
        (keys::GEMINI_API_KEY, ConfigValue::from("")),
        (keys::API_BASE, ConfigValue::from(DEFAULT_API_BASE)),
        (keys::MODEL, ConfigValue::from("gemini-flash-latest")),
        (keys::AI_ENABLED, ConfigValue::from(false)),
        (keys::THEME, ConfigValue::from(DEFAULT_THEME)),
        (keys::PROMPT_STYLE, ConfigValue::from("hacker")),
        (keys::BANNER_ID, ConfigValue::from("1")),
        (keys::BANNER_RANDOM, ConfigValue::from(false)),
        (keys::BANNER_SYNC, ConfigValue::from(true)),
        (keys::SAFE_MODE, ConfigValue::from(true)),
        (keys::AUTO_BACKUP, ConfigValue::from(true)),
        (keys::LOG_COMMANDS, ConfigValue::from(true)),
        (keys::COMMAND_PREFIX, ConfigValue::from("")),
        (keys::PARANOID_MODE, ConfigValue::from(false)),
        (keys::MODEL_PROFILE, ConfigValue::from("quality")),
        (keys::OFFLINE_MODE, ConfigValue::from(false)),
        (keys::AUTO_MODEL_SWITCH, ConfigValue::from(true)),
        (
            keys::FEEDBACK_WORKER_URL,
            ConfigValue::from("https://feedback-n-review.vritrasec.workers.dev/"),
        ),
        (keys::CONFIG_VERSION, ConfigValue::Null),
        (keys::CREATED_TIMESTAMP, ConfigValue::Null),
        (keys::LAST_UPDATED, ConfigValue::Null),
        (keys::UPDATE_COUNT, ConfigValue::Integer(0)),
    ]
    .into_iter()
    .collect()
}
