use std::fs::File;
use std::io::Write;

use level_config::{Config, SensorRow, SensorTable, load_sensor_table_csv};
use rstest::rstest;
use tempfile::tempdir;

fn write_csv(body: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sensors.csv");
    let mut f = File::create(&path).unwrap();
    f.write_all(body.as_bytes()).unwrap();
    (dir, path)
}

#[rstest]
fn loads_contiguous_table() {
    let (_dir, path) = write_csv("slot,scale,threshold\n0,464,142\n1,256,150\n2,448,142\n");
    let table = load_sensor_table_csv(&path).unwrap();
    assert_eq!(table.scale, vec![464, 256, 448]);
    assert_eq!(table.threshold, vec![142, 150, 142]);
}

#[rstest]
fn table_overrides_config_tables() {
    let (_dir, path) = write_csv("slot,scale,threshold\n0,300,100\n1,300,100\n");
    let mut cfg = Config::default();
    cfg.apply_sensor_table(load_sensor_table_csv(&path).unwrap());
    assert_eq!(cfg.sensors.count, 2);
    assert_eq!(cfg.sensors.scale, Some(vec![300, 300]));
    assert!(cfg.validate().is_ok());
}

#[rstest]
#[case("slot,gain,threshold\n0,256,142\n1,256,142\n", "headers")]
#[case("slot,scale,threshold\n0,256,142\n", "2..=32 rows")]
#[case("slot,scale,threshold\n1,256,142\n0,256,142\n", "out of order")]
#[case("slot,scale,threshold\n0,0,142\n1,256,142\n", "zero scale")]
#[case("slot,scale,threshold\n0,abc,142\n1,256,142\n", "invalid CSV row 2")]
fn rejects_bad_tables(#[case] body: &str, #[case] needle: &str) {
    let (_dir, path) = write_csv(body);
    let err = load_sensor_table_csv(&path).unwrap_err();
    assert!(format!("{err}").contains(needle), "got: {err}");
}

#[rstest]
fn missing_file_is_an_error() {
    let dir = tempdir().unwrap();
    assert!(load_sensor_table_csv(&dir.path().join("absent.csv")).is_err());
}

#[rstest]
fn rows_convert_directly() {
    let rows = vec![
        SensorRow {
            slot: 0,
            scale: 256,
            threshold: 10,
        },
        SensorRow {
            slot: 1,
            scale: 512,
            threshold: 20,
        },
    ];
    let table = SensorTable::try_from(rows).unwrap();
    assert_eq!(table.scale, vec![256, 512]);
}
