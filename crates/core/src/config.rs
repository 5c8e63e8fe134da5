use crate::error::{Result, ShowUsagesError};
use crate::settings::DisplaySettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = ".usagescope/config.json";

/// Shortcut texts shown in hints. `None` means the action has no shortcut.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Keymap {
    pub show_usages: Option<String>,
    pub show_usages_with_settings: Option<String>,
    pub find_usages: Option<String>,
}

impl Default for Keymap {
    fn default() -> Self {
        Self {
            show_usages: Some("Ctrl+Alt+F7".to_string()),
            show_usages_with_settings: Some("Ctrl+Alt+Shift+F7".to_string()),
            find_usages: Some("Alt+F7".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShowUsagesConfig {
    /// Usages shown per page; "show more" grows the cap by this much.
    pub page_size: usize,
    /// The popup stays hidden this long unless several usages turn up.
    pub show_delay_ms: u64,
    /// Minimum interval between two popup rebuilds.
    pub refresh_interval_ms: u64,
    pub max_visible_rows: usize,
    pub ui_channel_capacity: usize,
    pub keymap: Keymap,
    pub popup_settings: DisplaySettings,
}

impl Default for ShowUsagesConfig {
    fn default() -> Self {
        Self {
            page_size: 100,
            show_delay_ms: 300,
            refresh_interval_ms: 100,
            max_visible_rows: 30,
            ui_channel_capacity: 256,
            keymap: Keymap::default(),
            popup_settings: DisplaySettings::popup(),
        }
    }
}

impl ShowUsagesConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(DEFAULT_CONFIG_FILE))
    }

    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the default location, then apply environment overrides.
    pub fn load_default() -> Result<Self> {
        let config = match Self::default_path() {
            Some(path) => Self::load(&path)?,
            None => Self::default(),
        };
        config.apply_env_overrides()
    }

    pub fn apply_env_overrides(self) -> Result<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("USAGESCOPE_PAGE_SIZE") {
            self.page_size = parse_number("USAGESCOPE_PAGE_SIZE", &value)?;
        }
        if let Some(value) = lookup("USAGESCOPE_SHOW_DELAY_MS") {
            self.show_delay_ms = parse_number("USAGESCOPE_SHOW_DELAY_MS", &value)?;
        }
        if let Some(value) = lookup("USAGESCOPE_REFRESH_INTERVAL_MS") {
            self.refresh_interval_ms = parse_number("USAGESCOPE_REFRESH_INTERVAL_MS", &value)?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(ShowUsagesError::Config("page_size must be positive".into()));
        }
        if self.refresh_interval_ms == 0 {
            return Err(ShowUsagesError::Config(
                "refresh_interval_ms must be positive".into(),
            ));
        }
        if self.max_visible_rows == 0 {
            return Err(ShowUsagesError::Config(
                "max_visible_rows must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn show_delay(&self) -> Duration {
        Duration::from_millis(self.show_delay_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ShowUsagesError::Config(format!("{key}: not a number: {value:?}")))
}
