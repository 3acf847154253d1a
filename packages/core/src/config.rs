//! Codec configuration, populated from environment variables.

use std::sync::OnceLock;

/// Ten mebibytes.
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 10 * 1024 * 1024;

const DEFAULT_ERROR_TITLE: &str = "Internal Server Error";
const DEFAULT_ERROR_DETAIL: &str = "Request failed, something went wrong.";

static GLOBAL: OnceLock<Config> = OnceLock::new();

/// Runtime configuration shared by the [`Parser`](crate::Parser) and the
/// [`Sender`](crate::Sender).
///
/// Parsers and senders receive a `Config` at construction. A process-wide
/// default can additionally be installed once at startup with
/// [`Config::install`]; constructors that take no config read it through
/// [`Config::global`].
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `RESDOC_ERROR_TITLE` | `Internal Server Error` | Public title of 500 errors |
/// | `RESDOC_ERROR_DETAIL` | `Request failed, something went wrong.` | Public detail of 500 errors |
/// | `RESDOC_INCLUDE_VERSION` | `true` | Emit the top-level `jsonapi` member |
/// | `RESDOC_MAX_PAYLOAD_BYTES` | `10485760` | Inbound body size cap |
/// | `RESDOC_BULK_IDS_REQUIRED` | `true` | Require ids on every member of a multi-object collection |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Title given to every internal server error sent to a client.
    pub error_title: String,

    /// Detail given to every internal server error sent to a client.
    pub error_detail: String,

    /// Whether serialised documents carry `"jsonapi": {"version": "1.1"}`.
    pub include_version: bool,

    /// Upper bound on an inbound payload, checked before decoding.
    pub max_payload_bytes: usize,

    /// When `true`, a collection payload with two or more objects is rejected
    /// if any of them lacks an `id`.
    pub bulk_ids_required: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            error_title: DEFAULT_ERROR_TITLE.into(),
            error_detail: DEFAULT_ERROR_DETAIL.into(),
            include_version: true,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            bulk_ids_required: true,
        }
    }
}

impl Config {
    /// Populate config from environment variables, applying defaults where
    /// absent or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            error_title: std::env::var("RESDOC_ERROR_TITLE").unwrap_or(defaults.error_title),
            error_detail: std::env::var("RESDOC_ERROR_DETAIL").unwrap_or(defaults.error_detail),
            include_version: env_parse("RESDOC_INCLUDE_VERSION").unwrap_or(defaults.include_version),
            max_payload_bytes: env_parse("RESDOC_MAX_PAYLOAD_BYTES")
                .unwrap_or(defaults.max_payload_bytes),
            bulk_ids_required: env_parse("RESDOC_BULK_IDS_REQUIRED")
                .unwrap_or(defaults.bulk_ids_required),
        }
    }

    /// Install `self` as the process-wide default.
    ///
    /// Meant to be called once during startup. A second call leaves the
    /// installed value untouched and hands the rejected config back.
    pub fn install(self) -> Result<(), Config> {
        GLOBAL.set(self)
    }

    /// The installed process-wide default, or [`Config::default`] if nothing
    /// has been installed.
    pub fn global() -> &'static Config {
        GLOBAL.get_or_init(Config::default)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = Config::default();
        assert_eq!(c.max_payload_bytes, 10 * 1024 * 1024);
        assert!(c.include_version);
        assert!(c.bulk_ids_required);
        assert_eq!(c.error_title, "Internal Server Error");
    }

    #[test]
    fn global_falls_back_to_defaults() {
        // Nothing in this crate's tests installs a global config.
        assert_eq!(Config::global(), &Config::default());
    }
}
