#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and sensor table parsing for the level monitor.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The sensor table CSV loader enforces headers and contiguous slot numbers
//!   and replaces the per-slot gain and threshold tables.
use serde::Deserialize;

/// Most slots a stack may have.
pub const MAX_SENSORS: usize = 32;
/// Most labels the bench sample sequence may hold.
pub const MAX_SAMPLES: usize = 64;

/// Sensor table CSV schema.
///
/// Expected headers:
/// slot,scale,threshold
///
/// Example:
/// slot,scale,threshold
/// 0,464,142
/// 1,256,142
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct SensorRow {
    pub slot: usize,
    /// 8.8 fixed-point gain (256 == 1.0)
    pub scale: u16,
    pub threshold: u32,
}

/// Per-slot tables loaded from CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorTable {
    pub scale: Vec<u16>,
    pub threshold: Vec<u32>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Sensors {
    pub count: usize,
    pub max_height_mm: u32,
    /// Optional 8.8 gain per slot; the tuned end-slot defaults apply when absent.
    pub scale: Option<Vec<u16>>,
    /// Optional submersion cutoff per slot (compared after halving).
    pub threshold: Option<Vec<u32>>,
}

impl Default for Sensors {
    fn default() -> Self {
        Self {
            count: 12,
            max_height_mm: 153,
            scale: None,
            threshold: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Samples {
    /// Preset fill height (mm) printed in front of each captured row.
    pub axis_labels: Vec<i16>,
}

impl Default for Samples {
    fn default() -> Self {
        Self {
            axis_labels: vec![
                -5, 0, 10, 20, 30, 40, 50, 60, 70, 80, 90, 100, 110, 120, 130, 140, 150, 153, 160,
                0,
            ],
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Timing {
    /// Pause after every reported cycle (data log pacing).
    pub cycle_delay_ms: u64,
    /// Pause between polls while a scan is running.
    pub poll_interval_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            cycle_delay_ms: 100,
            poll_interval_ms: 1,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Storage {
    /// File backing the emulated EEPROM.
    pub path: String,
    /// Create a blank (all-zero) store when the file does not exist yet.
    pub format_if_missing: bool,
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            path: "levelmon_eeprom.bin".to_string(),
            format_if_missing: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Serial {
    /// Serial device; stdin/stdout are used when absent.
    pub port: Option<String>,
    pub baud_rate: u32,
}

impl Default for Serial {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: 115_200,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Simulation {
    /// Liquid height the simulated stack starts at.
    pub fill_mm: u32,
    /// Count reported by a dry slot.
    pub dry_counts: u32,
    /// Count reported by a fully wet slot.
    pub wet_counts: u32,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            fill_mm: 0,
            dry_counts: 1000,
            wet_counts: 1200,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub sensors: Sensors,
    pub samples: Samples,
    pub timing: Timing,
    pub storage: Storage,
    pub serial: Serial,
    pub simulation: Simulation,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read a sensor table CSV with headers `slot,scale,threshold`.
///
/// Slots must start at 0 and be contiguous.
pub fn load_sensor_table_csv(path: &std::path::Path) -> eyre::Result<SensorTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open sensor table CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["slot", "scale", "threshold"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "sensor table CSV must have headers 'slot,scale,threshold', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<SensorRow>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }

    SensorTable::try_from(rows)
}

impl TryFrom<Vec<SensorRow>> for SensorTable {
    type Error = eyre::Report;
    fn try_from(rows: Vec<SensorRow>) -> Result<Self, Self::Error> {
        if rows.len() < 2 || rows.len() > MAX_SENSORS {
            eyre::bail!(
                "sensor table needs 2..={MAX_SENSORS} rows, got {}",
                rows.len()
            );
        }
        for (i, row) in rows.iter().enumerate() {
            if row.slot != i {
                eyre::bail!("sensor table slot {} out of order, expected {}", row.slot, i);
            }
            if row.scale == 0 {
                eyre::bail!("sensor table slot {} has zero scale", row.slot);
            }
        }
        Ok(SensorTable {
            scale: rows.iter().map(|r| r.scale).collect(),
            threshold: rows.iter().map(|r| r.threshold).collect(),
        })
    }
}

impl Config {
    /// Replace the per-slot tables (and the slot count) with `table`.
    pub fn apply_sensor_table(&mut self, table: SensorTable) {
        self.sensors.count = table.scale.len();
        self.sensors.scale = Some(table.scale);
        self.sensors.threshold = Some(table.threshold);
    }

    pub fn validate(&self) -> eyre::Result<()> {
        // Sensors
        let n = self.sensors.count;
        if !(2..=MAX_SENSORS).contains(&n) {
            eyre::bail!("sensors.count must be in 2..={MAX_SENSORS}");
        }
        if self.sensors.max_height_mm == 0 || self.sensors.max_height_mm > 10_000 {
            eyre::bail!("sensors.max_height_mm must be in 1..=10000");
        }
        if let Some(scale) = &self.sensors.scale {
            if scale.len() != n {
                eyre::bail!("sensors.scale has {} entries, expected {n}", scale.len());
            }
            if scale.contains(&0) {
                eyre::bail!("sensors.scale entries must be > 0");
            }
        }
        if let Some(threshold) = &self.sensors.threshold
            && threshold.len() != n
        {
            eyre::bail!(
                "sensors.threshold has {} entries, expected {n}",
                threshold.len()
            );
        }

        // Samples
        if self.samples.axis_labels.is_empty() {
            eyre::bail!("samples.axis_labels must not be empty");
        }
        if self.samples.axis_labels.len() > MAX_SAMPLES {
            eyre::bail!("samples.axis_labels holds at most {MAX_SAMPLES} entries");
        }

        // Timing
        if self.timing.cycle_delay_ms > 60_000 {
            eyre::bail!("timing.cycle_delay_ms is unreasonably large (>60s)");
        }
        if self.timing.poll_interval_ms == 0 || self.timing.poll_interval_ms > 1000 {
            eyre::bail!("timing.poll_interval_ms must be in 1..=1000");
        }

        // Storage
        if self.storage.path.trim().is_empty() {
            eyre::bail!("storage.path must not be empty");
        }

        // Serial
        if self.serial.baud_rate == 0 {
            eyre::bail!("serial.baud_rate must be > 0");
        }

        // Simulation
        if self.simulation.wet_counts < self.simulation.dry_counts {
            eyre::bail!("simulation.wet_counts must be >= simulation.dry_counts");
        }

        // Logging
        if let Some(level) = &self.logging.level
            && !["trace", "debug", "info", "warn", "error"].contains(&level.as_str())
        {
            eyre::bail!("logging.level must be one of trace|debug|info|warn|error");
        }
        if let Some(rotation) = &self.logging.rotation
            && !["never", "daily", "hourly"].contains(&rotation.as_str())
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}
