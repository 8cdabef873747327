use criterion::{Criterion, black_box, criterion_group, criterion_main};
use level_core::calibration::CalibrationSet;
use level_core::mocks::{FixedSensors, MemoryByteStore, MockSerial};
use level_core::telemetry::render_csv_row;
use level_core::{LevelPipeline, PipelineCfg, SampleCfg, SensorArray, build_monitor};

fn bench_pipeline(c: &mut Criterion) {
    let cfg = PipelineCfg::default();
    let pipe = LevelPipeline::new(&cfg);
    let base = CalibrationSet::from_baselines(&[1000; 12]).unwrap();
    let mut sensors = SensorArray::new(&cfg).unwrap();
    sensors.set_raw(&[1200, 1200, 1200, 1200, 1200, 1000, 1000, 1000, 1000, 1000, 1000, 1000]);

    c.bench_function("pipeline_process_12", |b| {
        b.iter(|| black_box(pipe.process(&mut sensors, black_box(&base))))
    });

    let est = pipe.process(&mut sensors, &base);
    c.bench_function("render_csv_row_12", |b| {
        b.iter(|| black_box(render_csv_row(&sensors, &est)))
    });
}

fn bench_cycle(c: &mut Criterion) {
    let mut m = build_monitor(
        FixedSensors::new(vec![1100; 12]),
        MemoryByteStore::new(64),
        MockSerial::new(),
        PipelineCfg::default(),
        SampleCfg::default(),
    )
    .unwrap();
    m.start().unwrap();
    c.bench_function("monitor_cycle_basic", |b| {
        b.iter(|| {
            let status = m.poll().unwrap();
            m.transport_mut().take_output();
            black_box(status)
        })
    });
}

criterion_group!(benches, bench_pipeline, bench_cycle);
criterion_main!(benches);
