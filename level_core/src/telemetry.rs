//! Text rendered onto the serial link: periodic lines, the bench sample
//! sequence, and the fixed banner and notices.

use heapless::Vec as FixedVec;

use crate::config::{MAX_SAMPLES, SampleCfg};
use crate::error::BuildError;
use crate::fixed_point::{FRAC_BITS, render_decimal, render_fixed};
use crate::pipeline::{LevelEstimate, SensorArray};

pub const BANNER: &str = concat!(
    "\x1b[2J\x1b[;H",
    "***************************************************************\r\n",
    "Capacitive Liquid Level Monitor\r\n",
    "***************************************************************\r\n\n",
);

pub const COMMAND_HELP: &str = concat!(
    "\n\r",
    "Commands \n\r",
    "  stop - Stops displaying data over UART.\n\r",
    "  cal - Stores empty container sensor values to EEPROM for calibration.\n\r",
    "  basic - Outputs liquid level in mm and %.\n\r",
    "  csv - Outputs intermediate computation values as well as liquid level in CSV format.\n\r",
    "  'Enter' - Outputs the next set of level values from the sample array.\n\r",
    "  reset - Resets the sample array pointer to 0 %.\n\r",
    "\n\r",
);

pub const RESET_NOTICE: &str = "Reset Test Level\r\n";

pub const STORE_INIT_FAILED: &str = "Emulated EEPROM Initialization Error \r\n";
pub const STORE_READ_FAILED: &str = "Emulated EEPROM Read failed \r\n";
pub const STORE_WRITE_FAILED: &str = "Emulated EEPROM Write failed \r\n";

/// Fixed value with one fractional digit, the way every level is shown.
#[inline]
fn level(v: i32) -> String {
    render_fixed(v, FRAC_BITS, 1)
}

/// `%=<percent>   mm=<height>`
pub fn render_basic(est: &LevelEstimate) -> String {
    format!("%={}   mm={}\r\n", level(est.percent), level(est.height_mm))
}

pub fn render_csv_header(slots: usize) -> String {
    let mut out = String::new();
    for i in 0..slots {
        out.push_str(&format!("Raw{i},Diff{i},Proc{i},"));
    }
    out.push_str("SenActCnt,Level%, LevelMm\r\n");
    out
}

pub fn render_csv_row(sensors: &SensorArray, est: &LevelEstimate) -> String {
    let mut out = String::new();
    for s in sensors.slots() {
        out.push_str(&format!("{},{},{},", s.raw, s.diff, s.processed));
    }
    out.push_str(&format!(
        "{},{},{}\r\n",
        est.active_count,
        level(est.percent),
        level(est.height_mm)
    ));
    out
}

/// Bench test capture: one labelled row per operator request.
///
/// The cursor advances after every row and sticks at the last label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleSequence {
    labels: FixedVec<i16, MAX_SAMPLES>,
    cursor: usize,
}

impl SampleSequence {
    pub fn new(cfg: &SampleCfg) -> Result<Self, BuildError> {
        cfg.validate()?;
        let labels = FixedVec::from_slice(&cfg.axis_labels)
            .map_err(|()| BuildError::InvalidConfig("axis_labels holds at most 64 entries"))?;
        Ok(Self { labels, cursor: 0 })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Label under the cursor.
    pub fn current_label(&self) -> i16 {
        self.labels.get(self.cursor).copied().unwrap_or(0)
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Render the row for the current label (preceded by the header when the
    /// cursor is at the start) and move on.
    ///
    /// Slot 0 is left out of the row, unlike the CSV stream.
    pub fn capture(&mut self, sensors: &SensorArray, est: &LevelEstimate) -> String {
        let mut out = String::new();
        if self.cursor == 0 {
            out.push_str("PresetMm,");
            for i in 1..sensors.len() {
                out.push_str(&format!("SenDiff{i},"));
            }
            out.push_str("Level%, LevelMm\r\n");
        }
        out.push_str(&render_decimal(i64::from(self.current_label()), 0));
        out.push(',');
        for s in sensors.slots().iter().skip(1) {
            out.push_str(&format!("{},", s.processed));
        }
        out.push_str(&format!("{},{}\r\n", level(est.percent), level(est.height_mm)));
        self.cursor = (self.cursor + 1).min(self.labels.len().saturating_sub(1));
        out
    }
}
