//! Store configuration.

use std::path::Path;

use serde::Deserialize;

use super::ColorScheme;
use crate::{Error, Result};

/// Root font size used for `rem` when no `--rem` variable is defined.
pub const DEFAULT_REM: f64 = 14.0;

/// Default number of memoized resolutions kept per store.
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Platform defaults a store's [`RuntimeState`](super::RuntimeState) starts
/// from and returns to on reset.
///
/// # Example
///
/// ```
/// use atomwind_style::store::{ColorScheme, StoreConfig};
///
/// let config = StoreConfig::from_toml_str(r#"
///     platform = "android"
///     width = 390.0
///     color_scheme = "dark"
/// "#)?;
/// assert_eq!(config.platform, "android");
/// assert_eq!(config.width, 390.0);
/// assert_eq!(config.color_scheme, Some(ColorScheme::Dark));
/// assert_eq!(config.rem, 14.0);
/// # Ok::<(), atomwind_style::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Platform name matched by `platform` predicates and `platformColor`.
    pub platform: String,
    /// Initial width.
    pub width: f64,
    /// Initial height.
    pub height: f64,
    /// Initial color scheme.
    pub color_scheme: Option<ColorScheme>,
    /// Root font size for `rem` units.
    pub rem: f64,
    /// Maximum memoized resolutions before half are evicted.
    pub cache_capacity: usize,
}

impl StoreConfig {
    /// Parse a configuration from TOML text. Missing keys take defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_toml_str(&text)
    }

    /// Builder: set the platform.
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    /// Builder: set the initial dimensions.
    pub fn with_dimensions(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            platform: default_platform().to_string(),
            width: 0.0,
            height: 0.0,
            color_scheme: None,
            rem: DEFAULT_REM,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// The platform name for the compilation target.
pub fn default_platform() -> &'static str {
    if cfg!(target_os = "ios") {
        "ios"
    } else if cfg!(target_os = "android") {
        "android"
    } else if cfg!(target_os = "macos") {
        "macos"
    } else if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_family = "wasm") {
        "web"
    } else {
        "native"
    }
}
