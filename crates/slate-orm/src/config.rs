//! Engine configuration.

use serde::Deserialize;

use crate::error::{OrmError, Result};

/// Default database URL.
pub const DEFAULT_URL: &str = "sqlite::memory:";

/// Default pool size.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Options used by [`Engine::connect`](crate::Engine::connect).
///
/// Deserializable so it can be embedded in an application's own config file.
/// Missing fields fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Connection URL; its scheme selects the dialect.
    pub url: String,
    /// Maximum number of pooled connections.
    pub max_connections: u32,
    /// Log every statement with its parameters at `INFO` instead of `DEBUG`.
    pub debug: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            debug: false,
        }
    }
}

impl EngineOptions {
    /// Creates options for `url` with default settings.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Sets the maximum pool size.
    #[must_use]
    pub const fn max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Enables or disables statement logging at `INFO`.
    #[must_use]
    pub const fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Reads options from `DATABASE_URL`, `SLATE_MAX_CONNECTIONS` and
    /// `SLATE_DEBUG`, keeping defaults for unset variables.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Config`] when a variable is set to an unparsable
    /// value.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut options = Self::default();
        if let Some(url) = lookup("DATABASE_URL") {
            options.url = url;
        }
        if let Some(max) = lookup("SLATE_MAX_CONNECTIONS") {
            options.max_connections = max.trim().parse().map_err(|_| {
                OrmError::Config(format!("SLATE_MAX_CONNECTIONS is not a number: {max}"))
            })?;
        }
        if let Some(debug) = lookup("SLATE_DEBUG") {
            options.debug = parse_flag(&debug).ok_or_else(|| {
                OrmError::Config(format!("SLATE_DEBUG is not a boolean: {debug}"))
            })?;
        }
        options.validate()?;
        Ok(options)
    }

    /// Returns the driver name, the URL scheme before the first `:`.
    pub fn driver(&self) -> &str {
        self.url.split(':').next().unwrap_or_default()
    }

    /// Returns whether the URL names an in-memory database.
    pub fn is_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }

    /// Checks the options for values that cannot open a pool.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Config`] for an empty URL or a zero pool size.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(OrmError::Config("database URL is empty".to_string()));
        }
        if self.max_connections == 0 {
            return Err(OrmError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_flag(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
