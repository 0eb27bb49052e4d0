//! Process-wide configuration.
//!
//! The configuration is created on first access and can be replaced by the
//! application, normally once at startup before any parsing happens. Readers
//! take a cheap [`Arc`] snapshot, so a parse in flight keeps using the
//! configuration it started with.
//!
//! # Examples
//!
//! ```
//! use zodkit_core::{Config, Locale, config, set_config, string};
//!
//! let locale = Locale::en().with_message("invalid_type", "wanted {expected}").unwrap();
//! set_config(Config::default().with_locale(locale));
//! assert_eq!(string().parse(1).unwrap_err().to_string(), "wanted string");
//!
//! set_config(Config::default());
//! assert_eq!(config().locale.name(), "en");
//! ```

use std::fmt;
use std::sync::{Arc, LazyLock, RwLock};

use tracing::debug;

use crate::issue::RawIssue;
use crate::locale::Locale;
use crate::params::ErrorMap;

static CONFIG: LazyLock<RwLock<Arc<Config>>> =
    LazyLock::new(|| RwLock::new(Arc::new(Config::default())));

/// Global message configuration.
#[derive(Clone, Default)]
pub struct Config {
    /// Application-wide error map consulted after schema and context
    /// overrides.
    pub custom_error: Option<ErrorMap>,
    /// Catalog of default messages.
    pub locale: Locale,
}

impl Config {
    pub fn with_custom_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&RawIssue) -> Option<String> + Send + Sync + 'static,
    {
        self.custom_error = Some(Arc::new(f));
        self
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("custom_error", &self.custom_error.as_ref().map(|_| "<fn>"))
            .field("locale", &self.locale.name())
            .finish()
    }
}

/// Returns a snapshot of the current configuration.
pub fn config() -> Arc<Config> {
    let guard = CONFIG.read().unwrap_or_else(|poisoned| poisoned.into_inner());
    Arc::clone(&guard)
}

/// Replaces the configuration.
pub fn set_config(config: Config) {
    debug!(locale = config.locale.name(), custom_error = config.custom_error.is_some(), "Replacing configuration");
    let mut guard = CONFIG.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = Arc::new(config);
}

/// Edits a copy of the current configuration and installs it.
pub fn update_config(f: impl FnOnce(&mut Config)) {
    let mut guard = CONFIG.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    let mut next = Config::clone(&guard);
    f(&mut next);
    debug!(locale = next.locale.name(), custom_error = next.custom_error.is_some(), "Updating configuration");
    *guard = Arc::new(next);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_uses_english() {
        let config = Config::default();
        assert_eq!(config.locale.name(), "en");
        assert!(config.custom_error.is_none());
    }

    #[test]
    fn test_builder_methods() {
        let config = Config::default().with_custom_error(|issue| Some(issue.code.to_string()));
        let raw = RawIssue::new(crate::IssueCode::Custom, crate::Value::Null);
        let f = config.custom_error.as_ref().unwrap();
        assert_eq!(f(&raw).as_deref(), Some("custom"));
        assert!(format!("{config:?}").contains("<fn>"));
    }
}
