//! CPU temperature from the Linux hwmon and thermal sysfs trees.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use log::trace;

use crate::{error::SensorError, sensors::TemperatureSensor};

/// Known CPU sensor identifiers, highest priority first.
///
/// `cpu-thermal` is the Raspberry Pi SoC thermal zone, `coretemp` Intel and
/// `k10temp` AMD.
pub const CPU_SENSOR_CHIPS: [&str; 3] = ["cpu-thermal", "coretemp", "k10temp"];

pub const HWMON_ROOT: &str = "/sys/class/hwmon";
pub const THERMAL_ROOT: &str = "/sys/class/thermal";

/// Probes [`CPU_SENSOR_CHIPS`] in order and returns the first reading found.
///
/// For each identifier the hwmon chips are searched first (`name` file, first
/// `temp*_input` by index), then the thermal zones (`type` file, `temp`).
/// Lower-numbered devices win within one identifier.
#[derive(Debug, Clone)]
pub struct HwmonSensor {
    hwmon_root: PathBuf,
    thermal_root: PathBuf,
    chips: Vec<String>,
}

impl Default for HwmonSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl HwmonSensor {
    pub fn new() -> Self {
        Self::with_roots(HWMON_ROOT, THERMAL_ROOT)
    }

    /// Reads from alternative sysfs roots.
    pub fn with_roots(hwmon_root: impl Into<PathBuf>, thermal_root: impl Into<PathBuf>) -> Self {
        Self {
            hwmon_root: hwmon_root.into(),
            thermal_root: thermal_root.into(),
            chips: CPU_SENSOR_CHIPS.iter().map(ToString::to_string).collect(),
        }
    }

    /// Returns the matching identifier together with its reading.
    pub fn probe(&self) -> Result<(&str, f32), SensorError> {
        self.chips
            .iter()
            .find_map(|chip| self.read_chip(chip).map(|temp| (chip.as_str(), temp)))
            .ok_or_else(|| SensorError::Unavailable {
                probed: self.chips.clone(),
            })
    }

    fn read_chip(&self, chip: &str) -> Option<f32> {
        hwmon_reading(&self.hwmon_root, chip).or_else(|| thermal_reading(&self.thermal_root, chip))
    }
}

#[async_trait]
impl TemperatureSensor for HwmonSensor {
    fn key(&self) -> String {
        "cpu".to_string()
    }

    async fn read_temperature(&self) -> Result<f32, SensorError> {
        let (chip, temp) = self.probe()?;
        trace!("{chip}: {temp:.1}°C");
        Ok(temp)
    }
}

fn hwmon_reading(root: &Path, chip: &str) -> Option<f32> {
    numbered_entries(root, "hwmon", "")
        .into_iter()
        .filter(|dir| read_trimmed(dir.join("name")).is_ok_and(|name| name == chip))
        .find_map(|dir| first_temp_input(&dir).or_else(|| first_temp_input(&dir.join("device"))))
}

fn first_temp_input(dir: &Path) -> Option<f32> {
    numbered_entries(dir, "temp", "_input")
        .iter()
        .find_map(|input| read_millidegrees(input))
}

fn thermal_reading(root: &Path, chip: &str) -> Option<f32> {
    numbered_entries(root, "thermal_zone", "")
        .into_iter()
        .filter(|zone| read_trimmed(zone.join("type")).is_ok_and(|kind| kind == chip))
        .find_map(|zone| read_millidegrees(&zone.join("temp")))
}

/// Entries of `dir` named `{prefix}{N}{suffix}`, ordered by `N`.
fn numbered_entries(dir: &Path, prefix: &str, suffix: &str) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut found: Vec<(usize, PathBuf)> = entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let name = entry.file_name();
            let idx = extract_index(name.to_str()?, prefix, suffix)?;
            Some((idx, entry.path()))
        })
        .collect();
    found.sort_by_key(|(idx, _)| *idx);
    found.into_iter().map(|(_, path)| path).collect()
}

fn extract_index(name: &str, prefix: &str, suffix: &str) -> Option<usize> {
    name.strip_prefix(prefix)?.strip_suffix(suffix)?.parse().ok()
}

fn read_millidegrees(path: &Path) -> Option<f32> {
    let raw = read_trimmed(path).ok()?;
    let milli: i64 = raw.parse().ok()?;
    Some(milli as f32 / 1000.0)
}

fn read_trimmed(path: impl AsRef<Path>) -> io::Result<String> {
    Ok(fs::read_to_string(path)?.trim().to_string())
}
