#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not.
    if let Ok(cfg) = level_config::load_toml(data)
        && cfg.validate().is_ok()
    {
        let pipeline: level_core::PipelineCfg = (&cfg.sensors).into();
        assert!(pipeline.validate().is_ok());
    }
});
