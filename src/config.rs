//! Reserved keys and registry configuration defaults.

pub const AUTHORIZED_UPLOADS_KEY: &str = "drop-gate.authorized-uploads";
pub const ELEMENT_ID_PREFIX: &str = "drop-gate-upload-";
pub const TOKEN_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";
pub const DEFAULT_DROP_ZONE_CSS_SELECTOR: &str = "body";
pub const DEFAULT_PASTE_ZONE_CSS_SELECTOR: &str = "body";
pub const DEFAULT_SESSION_TTL_SECS: u64 = 24 * 60 * 60;
pub const SESSION_PRUNE_INTERVAL_SECS: u64 = 300;
