use level_core::calibration::CalibrationSet;
use level_core::fixed_point::{apply_gain, render_decimal};
use level_core::mocks::FixedSensors;
use level_core::telemetry::SampleSequence;
use level_core::{LevelEstimate, LevelPipeline, PipelineCfg, SampleCfg, SensorArray};
use proptest::prelude::*;

prop_compose! {
    fn stack()(n in 2usize..=32)(
        raw in prop::collection::vec(0u32..5000, n),
        baseline in prop::collection::vec(0u32..5000, n),
        scale in prop::collection::vec(1u16..0x0400, n),
        max_height_mm in 1u32..=1000,
    ) -> (Vec<u32>, Vec<u32>, PipelineCfg) {
        let n = raw.len();
        let cfg = PipelineCfg {
            sensor_count: n,
            max_height_mm,
            scale,
            threshold: vec![142; n],
        };
        (raw, baseline, cfg)
    }
}

proptest! {
    #[test]
    fn diff_is_floored_subtraction((raw, baseline, cfg) in stack()) {
        let mut sensors = SensorArray::new(&cfg).unwrap();
        sensors.set_raw(&raw);
        let base = CalibrationSet::from_baselines(&baseline).unwrap();
        LevelPipeline::new(&cfg).process(&mut sensors, &base);
        for (i, s) in sensors.slots().iter().enumerate() {
            prop_assert_eq!(s.diff, raw[i].saturating_sub(baseline[i]));
        }
    }

    #[test]
    fn active_count_and_level_stay_in_range((raw, baseline, cfg) in stack()) {
        let n = cfg.sensor_count as u32;
        let mut sensors = SensorArray::new(&cfg).unwrap();
        sensors.set_raw(&raw);
        let base = CalibrationSet::from_baselines(&baseline).unwrap();
        let pipe = LevelPipeline::new(&cfg);
        let LevelEstimate { active_count, height_mm, percent } = pipe.process(&mut sensors, &base);
        prop_assert!(active_count <= 2 * (n - 2) + 2);
        prop_assert!(height_mm >= 0 && height_mm <= pipe.max_height());
        prop_assert!(percent >= 0 && percent <= 100 << 8);
    }

    #[test]
    fn full_stack_snaps_exactly_to_max(n in 2usize..=32, max_height_mm in 50u32..=1000) {
        let cfg = PipelineCfg {
            max_height_mm,
            ..PipelineCfg::with_sensor_count(n)
        };
        let pipe = LevelPipeline::new(&cfg);
        let full = 2 * (n as u32 - 2) + 2;
        let (height, percent) = pipe.level_from_active(full);
        prop_assert_eq!(height, pipe.max_height());
        prop_assert_eq!(percent, 100 << 8);
    }

    #[test]
    fn processed_is_monotonic_in_diff(a in 0u32..1_000_000, b in 0u32..1_000_000, gain in 1u16..=u16::MAX) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(apply_gain(lo, gain) <= apply_gain(hi, gain));
    }

    #[test]
    fn cursor_never_leaves_the_table(captures in 0usize..200, labels in 1usize..=64) {
        let cfg = SampleCfg { axis_labels: vec![1; labels] };
        let mut seq = SampleSequence::new(&cfg).unwrap();
        let pcfg = PipelineCfg::default();
        let sensors = SensorArray::new(&pcfg).unwrap();
        for _ in 0..captures {
            seq.capture(&sensors, &LevelEstimate::default());
        }
        prop_assert_eq!(seq.cursor(), captures.min(labels - 1));
    }

    #[test]
    fn render_decimal_round_trips_through_parse(v in any::<i32>(), zeros in 0u8..=12) {
        let s = render_decimal(i64::from(v), zeros);
        prop_assert_eq!(s.parse::<i64>().unwrap(), i64::from(v));
        let digits = s.trim_start_matches('-').len();
        prop_assert!(digits >= usize::from(zeros.min(10)).max(1));
    }
}

#[test]
fn capture_reads_every_slot_from_source() {
    let cfg = PipelineCfg::with_sensor_count(3);
    let mut sensors = SensorArray::new(&cfg).unwrap();
    sensors.capture(&FixedSensors::new(vec![4, 5, 6]));
    assert_eq!(sensors.raw_counts(), vec![4, 5, 6]);
}
