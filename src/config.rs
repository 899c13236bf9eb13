//! Configuration management for the fanctrl daemon.
//!
//! The configuration is a small INI file, created with defaults on first
//! run and read once at startup:
//!
//! ```ini
//! [logging]
//! level=INFO
//!
//! [fan]
//! temphigh=50.0
//! templow=45.0
//! interval=5
//! gpio=18
//! ```

use std::{
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use ini::Ini;
use log::LevelFilter;

use crate::error::ConfigError;

/// Location used when no path is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/fanctrl/fanctrl.conf";

mod keys {
    pub const LOGGING: &str = "logging";
    pub const LEVEL: &str = "level";

    pub const FAN: &str = "fan";
    pub const TEMP_HIGH: &str = "temphigh";
    pub const TEMP_LOW: &str = "templow";
    pub const INTERVAL: &str = "interval";
    pub const GPIO: &str = "gpio";
}

mod defaults {
    use super::LogLevel;

    pub fn log_level() -> LogLevel {
        LogLevel::Info
    }

    /// Fan switches on at or above this temperature.
    pub fn temp_high() -> f32 {
        50.0
    }

    /// Fan switches off below this temperature.
    pub fn temp_low() -> f32 {
        45.0
    }

    /// Poll interval in seconds.
    pub fn poll_interval() -> u64 {
        5
    }

    /// BCM pin number of the fan output.
    pub fn gpio_pin() -> u8 {
        18
    }
}

/// Logging verbosity as written in the config file.
///
/// Accepts the Python `logging` names plus `TRACE` and `OFF`,
/// case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Critical,
    Error,
    Warning,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            Self::Off => LevelFilter::Off,
            Self::Critical | Self::Error => LevelFilter::Error,
            Self::Warning => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OFF" => Ok(Self::Off),
            "CRITICAL" | "FATAL" => Ok(Self::Critical),
            "ERROR" => Ok(Self::Error),
            "WARNING" | "WARN" => Ok(Self::Warning),
            "INFO" => Ok(Self::Info),
            "DEBUG" => Ok(Self::Debug),
            "TRACE" => Ok(Self::Trace),
            _ => Err(invalid_value(keys::LEVEL, s)),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Off => "OFF",
            Self::Critical => "CRITICAL",
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
            Self::Trace => "TRACE",
        })
    }
}

/// Thresholds and timing for one run of the daemon.
///
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    /// Verbosity passed to the logger at startup.
    pub log_level: LogLevel,

    /// Fan switches on at or above this temperature (°C).
    pub temp_high: f32,

    /// Fan switches off below this temperature (°C).
    pub temp_low: f32,

    /// Seconds between two temperature polls.
    pub poll_interval: u64,

    /// BCM number of the GPIO line driving the fan.
    pub gpio_pin: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: defaults::log_level(),
            temp_high: defaults::temp_high(),
            temp_low: defaults::temp_low(),
            poll_interval: defaults::poll_interval(),
            gpio_pin: defaults::gpio_pin(),
        }
    }
}

impl Config {
    /// Checks the invariants the control loop relies on.
    ///
    /// # Example
    ///
    /// ```
    /// use fanctrl::config::Config;
    ///
    /// let config = Config { temp_high: 40.0, temp_low: 45.0, ..Config::default() };
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.temp_high.is_finite() || !self.temp_low.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "thresholds must be finite (high={}, low={})",
                self.temp_high, self.temp_low
            )));
        }
        if self.temp_high <= self.temp_low {
            return Err(ConfigError::Invalid(format!(
                "{} ({}) must be greater than {} ({})",
                keys::TEMP_HIGH,
                self.temp_high,
                keys::TEMP_LOW,
                self.temp_low
            )));
        }
        if self.poll_interval == 0 {
            return Err(ConfigError::Invalid(format!(
                "{} must be at least 1 second",
                keys::INTERVAL
            )));
        }
        Ok(())
    }

    /// Time to sleep between two polls.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }

    /// Writes the configuration to `path` through a temporary file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let tmp_path = tmp_path(path);
        self.to_ini()
            .write_to_file(&tmp_path)
            .map_err(|source| ConfigError::Io {
                path: tmp_path.clone(),
                source,
            })?;
        fs::rename(&tmp_path, path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }

    fn to_ini(self) -> Ini {
        let mut ini = Ini::new();
        ini.with_section(Some(keys::LOGGING))
            .set(keys::LEVEL, self.log_level.to_string());
        ini.with_section(Some(keys::FAN))
            .set(keys::TEMP_HIGH, format_celsius(self.temp_high))
            .set(keys::TEMP_LOW, format_celsius(self.temp_low))
            .set(keys::INTERVAL, self.poll_interval.to_string())
            .set(keys::GPIO, self.gpio_pin.to_string());
        ini
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let config = Self {
            log_level: parse_or(ini, keys::LOGGING, keys::LEVEL, defaults::log_level)?,
            temp_high: parse_or(ini, keys::FAN, keys::TEMP_HIGH, defaults::temp_high)?,
            temp_low: parse_or(ini, keys::FAN, keys::TEMP_LOW, defaults::temp_low)?,
            poll_interval: parse_or(ini, keys::FAN, keys::INTERVAL, defaults::poll_interval)?,
            gpio_pin: parse_or(ini, keys::FAN, keys::GPIO, defaults::gpio_pin)?,
        };
        Ok(config)
    }
}

/// Result of [`load`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Loaded {
    pub config: Config,
    /// The file did not exist and was written with defaults.
    pub created: bool,
}

/// Loads the configuration at `path`, creating it with defaults if absent.
///
/// Missing keys in an existing file fall back to their defaults. Key names
/// are matched case-insensitively. The result is validated before it is
/// returned. Nothing is logged, so this can run before the logger exists.
///
/// # Example
///
/// ```no_run
/// use fanctrl::config;
/// use std::path::Path;
///
/// let loaded = config::load(Path::new(config::DEFAULT_CONFIG_PATH))?;
/// println!("fan on at {}°C", loaded.config.temp_high);
/// # Ok::<(), fanctrl::error::ConfigError>(())
/// ```
pub fn load(path: &Path) -> Result<Loaded, ConfigError> {
    let created = !path.is_file();
    let config = if created {
        create_default(path)?
    } else {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let ini = Ini::load_from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Config::from_ini(&ini)?
    };

    config.validate()?;
    Ok(Loaded { config, created })
}

fn create_default(path: &Path) -> Result<Config, ConfigError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let config = Config::default();
    config.save(path)?;
    Ok(config)
}

fn parse_or<T>(ini: &Ini, section: &str, key: &str, default: fn() -> T) -> Result<T, ConfigError>
where
    T: FromStr,
{
    match ini.get_from(Some(section), key) {
        None => Ok(default()),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| invalid_value(&format!("{section}.{key}"), raw)),
    }
}

fn invalid_value(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// Keeps a decimal point on whole numbers: `50.0`, not `50`.
fn format_celsius(value: f32) -> String {
    format!("{value:?}")
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
