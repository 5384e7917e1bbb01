use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use config::{Config, ConfigError, Environment, File, FileFormat};

use satip_receiver::Options;

/// Read from the working directory when no settings file is given.
pub const DEFAULT_SETTINGS_FILE: &str = "satip.yaml";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Where to write the stream. Standard output when not set.
    pub output: Option<PathBuf>,
    pub multicast: bool,
    /// Replaces the `sat.ip` placeholder host in stream URLs.
    pub host: Option<String>,
    pub caching_ms: u64,
    pub batch: bool,
    pub idle_timeout_ms: u64,
    pub poll_timeout_ms: u64,
    pub setup_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        let options = Options::default();
        Self {
            output: None,
            multicast: options.multicast,
            host: options.host,
            caching_ms: millis(options.caching),
            batch: options.batch,
            idle_timeout_ms: millis(options.idle_timeout),
            poll_timeout_ms: millis(options.poll_timeout),
            setup_timeout_ms: millis(options.setup_timeout),
        }
    }
}

impl Settings {
    pub fn from_file(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path),
            None => File::new(DEFAULT_SETTINGS_FILE, FileFormat::Yaml).required(false),
        };
        Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix("satip").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn options(&self) -> Options {
        Options {
            multicast: self.multicast,
            host: self.host.clone(),
            caching: Duration::from_millis(self.caching_ms),
            batch: self.batch,
            idle_timeout: Duration::from_millis(self.idle_timeout_ms),
            poll_timeout: Duration::from_millis(self.poll_timeout_ms),
            setup_timeout: Duration::from_millis(self.setup_timeout_ms),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {

    use std::time::Duration;

    use config::{Config, File, FileFormat};

    use super::Settings;

    #[test]
    fn defaults_match_receiver_options() {
        let options = Settings::default().options();
        assert!(!options.multicast);
        assert!(options.batch);
        assert_eq!(options.caching, Duration::from_millis(1000));
        assert_eq!(options.idle_timeout, Duration::from_secs(2));
        assert_eq!(options.poll_timeout, Duration::from_millis(100));
        assert_eq!(options.setup_timeout, Duration::from_secs(15));
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(
                "multicast: true\nhost: 192.168.1.2\ncaching_ms: 500\nsetup_timeout_ms: 3000\n",
                FileFormat::Yaml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        let options = settings.options();
        assert!(options.multicast);
        assert_eq!(options.host.as_deref(), Some("192.168.1.2"));
        assert_eq!(options.caching, Duration::from_millis(500));
        assert_eq!(options.idle_timeout, Duration::from_secs(2));
        assert_eq!(options.setup_timeout, Duration::from_secs(3));
        assert!(settings.output.is_none());
    }
}
