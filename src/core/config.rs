use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,
}

/// Where the user list comes from
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_users_endpoint")]
    pub users_endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Map widget and tile provider settings
#[derive(Debug, Clone, Deserialize)]
pub struct MapConfig {
    #[serde(default = "default_tile_url")]
    pub tile_url: String,
    #[serde(default = "default_subdomains")]
    pub subdomains: Vec<String>,
    #[serde(default = "default_attribution")]
    pub attribution: String,
    #[serde(default = "default_max_zoom")]
    pub max_zoom: u8,
    #[serde(default = "default_initial_zoom")]
    pub initial_zoom: u8,
    #[serde(default = "default_max_live_maps")]
    pub max_live_maps: usize,
}

/// Layout timings and geometry used when expanding cards and sizing maps
#[derive(Debug, Clone, Deserialize)]
pub struct LayoutConfig {
    #[serde(default = "default_collapse_settle_ms")]
    pub collapse_settle_ms: u64,
    #[serde(default = "default_expand_settle_ms")]
    pub expand_settle_ms: u64,
    #[serde(default = "default_remeasure_ms")]
    pub remeasure_ms: u64,
    #[serde(default = "default_ready_timeout_ms")]
    pub ready_timeout_ms: u64,
    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,
    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,
    #[serde(default = "default_map_height")]
    pub map_height: u32,
    #[serde(default = "default_max_map_width")]
    pub max_map_width: u32,
    #[serde(default = "default_card_padding")]
    pub card_padding: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_console")]
    pub console: bool,
}

// Default value functions
fn default_port() -> u16 {
    8080
}

fn default_num_threads() -> usize {
    num_cpus::get()
}

fn default_users_endpoint() -> String {
    "https://jsonplaceholder.typicode.com/users".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_tile_url() -> String {
    "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string()
}

fn default_subdomains() -> Vec<String> {
    vec!["a".to_string(), "b".to_string(), "c".to_string()]
}

fn default_attribution() -> String {
    "© OpenStreetMap contributors".to_string()
}

fn default_max_zoom() -> u8 {
    19
}

fn default_initial_zoom() -> u8 {
    10
}

fn default_max_live_maps() -> usize {
    16
}

fn default_collapse_settle_ms() -> u64 {
    300
}

fn default_expand_settle_ms() -> u64 {
    350
}

fn default_remeasure_ms() -> u64 {
    500
}

fn default_ready_timeout_ms() -> u64 {
    3000
}

fn default_viewport_width() -> u32 {
    1280
}

fn default_viewport_height() -> u32 {
    800
}

fn default_map_height() -> u32 {
    300
}

fn default_max_map_width() -> u32 {
    720
}

fn default_card_padding() -> u32 {
    24
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_console() -> bool {
    false
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            num_threads: default_num_threads(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            users_endpoint: default_users_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            tile_url: default_tile_url(),
            subdomains: default_subdomains(),
            attribution: default_attribution(),
            max_zoom: default_max_zoom(),
            initial_zoom: default_initial_zoom(),
            max_live_maps: default_max_live_maps(),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            collapse_settle_ms: default_collapse_settle_ms(),
            expand_settle_ms: default_expand_settle_ms(),
            remeasure_ms: default_remeasure_ms(),
            ready_timeout_ms: default_ready_timeout_ms(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            map_height: default_map_height(),
            max_map_width: default_max_map_width(),
            card_padding: default_card_padding(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            console: default_console(),
        }
    }
}

impl LayoutConfig {
    pub fn collapse_settle(&self) -> Duration {
        Duration::from_millis(self.collapse_settle_ms)
    }

    pub fn expand_settle(&self) -> Duration {
        Duration::from_millis(self.expand_settle_ms)
    }

    pub fn remeasure(&self) -> Duration {
        Duration::from_millis(self.remeasure_ms)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .context("Failed to parse config file")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            bail!("Server port must be greater than 0");
        }

        if self.server.num_threads == 0 {
            bail!("num_threads must be greater than 0");
        }

        if self.source.users_endpoint.is_empty() {
            bail!("users_endpoint must not be empty");
        }

        if self.source.timeout_secs == 0 {
            bail!("timeout_secs must be greater than 0");
        }

        // Validate map config
        for placeholder in ["{z}", "{x}", "{y}"] {
            if !self.map.tile_url.contains(placeholder) {
                bail!("tile_url must contain the {} placeholder", placeholder);
            }
        }

        if self.map.tile_url.contains("{s}") && self.map.subdomains.is_empty() {
            bail!("tile_url uses {{s}} but no subdomains are configured");
        }

        if self.map.max_zoom > 22 {
            bail!("max_zoom must be at most 22");
        }

        if self.map.initial_zoom > self.map.max_zoom {
            bail!(
                "initial_zoom ({}) must not exceed max_zoom ({})",
                self.map.initial_zoom,
                self.map.max_zoom
            );
        }

        if self.map.max_live_maps == 0 {
            bail!("max_live_maps must be greater than 0");
        }

        // Validate layout config
        if self.layout.ready_timeout_ms == 0 {
            bail!("ready_timeout_ms must be greater than 0");
        }

        if self.layout.map_height == 0 || self.layout.max_map_width == 0 {
            bail!("map_height and max_map_width must be greater than 0");
        }

        // Validate logging config
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            bail!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            );
        }

        let valid_formats = ["json", "console"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            bail!(
                "Invalid log format '{}'. Must be one of: json, console",
                self.logging.format
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.map.initial_zoom, 10);
        assert_eq!(config.map.max_zoom, 19);
        assert_eq!(config.layout.collapse_settle_ms, 300);
        assert_eq!(config.layout.expand_settle_ms, 350);
        assert_eq!(config.layout.remeasure_ms, 500);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(
            config.source.users_endpoint,
            "https://jsonplaceholder.typicode.com/users"
        );
        assert_eq!(config.map.subdomains, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9090
num_threads = 2

[source]
users_endpoint = "http://localhost:3000/users"

[layout]
expand_settle_ms = 10

[logging]
level = "debug"
format = "console"
"#
        )
        .unwrap();

        let config = Config::from_file(&file.path().to_path_buf()).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.num_threads, 2);
        assert_eq!(config.source.users_endpoint, "http://localhost:3000/users");
        assert_eq!(config.layout.expand_settle_ms, 10);
        assert_eq!(config.layout.collapse_settle_ms, 300);
        assert_eq!(config.logging.format, "console");
    }

    #[test]
    fn test_missing_file_fails() {
        let path = PathBuf::from("/nonexistent/user-directory.toml");
        assert!(Config::from_file(&path).is_err());
    }

    #[test]
    fn test_rejects_initial_zoom_above_max() {
        let mut config = Config::default();
        config.map.initial_zoom = 20;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_tile_url_without_placeholders() {
        let mut config = Config::default();
        config.map.tile_url = "https://tiles.example.com/static.png".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_unknown_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }
}
