//! `From` implementations bridging `level_config` types to `level_core` types.

use crate::config::{PipelineCfg, SampleCfg, Timing};

// ── PipelineCfg ──────────────────────────────────────────────────────────────

impl From<&level_config::Sensors> for PipelineCfg {
    fn from(c: &level_config::Sensors) -> Self {
        let defaults = PipelineCfg::with_sensor_count(c.count);
        Self {
            sensor_count: c.count,
            max_height_mm: c.max_height_mm,
            scale: c.scale.clone().unwrap_or(defaults.scale),
            threshold: c.threshold.clone().unwrap_or(defaults.threshold),
        }
    }
}

// ── SampleCfg ────────────────────────────────────────────────────────────────

impl From<&level_config::Samples> for SampleCfg {
    fn from(c: &level_config::Samples) -> Self {
        Self {
            axis_labels: c.axis_labels.clone(),
        }
    }
}

// ── Timing ───────────────────────────────────────────────────────────────────

impl From<&level_config::Timing> for Timing {
    fn from(c: &level_config::Timing) -> Self {
        Self {
            cycle_delay_ms: c.cycle_delay_ms,
            poll_interval_ms: c.poll_interval_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_tables_fall_back_to_defaults() {
        let sensors = level_config::Sensors {
            count: 4,
            max_height_mm: 80,
            scale: None,
            threshold: Some(vec![100; 4]),
        };
        let cfg = PipelineCfg::from(&sensors);
        assert_eq!(cfg.scale, vec![0x01D0, 0x0100, 0x0100, 0x01C0]);
        assert_eq!(cfg.threshold, vec![100; 4]);
        assert_eq!(cfg.max_height_mm, 80);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn default_config_matches_core_defaults() {
        let c = level_config::Config::default();
        assert_eq!(PipelineCfg::from(&c.sensors), PipelineCfg::default());
        assert_eq!(SampleCfg::from(&c.samples), SampleCfg::default());
        assert_eq!(Timing::from(&c.timing), Timing::default());
    }
}
