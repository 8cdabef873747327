use level_hardware::{FileByteStore, HwError};
use level_traits::ByteStore;
use tempfile::tempdir;

#[test]
fn missing_file_is_formatted_when_allowed() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("eeprom.bin");
    let store = FileByteStore::open(&path, 64, true).unwrap();
    assert_eq!(store.capacity(), 64);
    assert_eq!(std::fs::read(&path).unwrap(), vec![0u8; 64]);
}

#[test]
fn missing_file_is_init_error_otherwise() {
    let dir = tempdir().unwrap();
    let err = FileByteStore::open(dir.path().join("eeprom.bin"), 64, false).unwrap_err();
    assert!(matches!(err, HwError::StoreInit(_)), "got {err:?}");
}

#[test]
fn wrong_size_image_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("eeprom.bin");
    std::fs::write(&path, [0u8; 10]).unwrap();
    let err = FileByteStore::open(&path, 64, true).unwrap_err();
    assert!(matches!(
        err,
        HwError::ImageSize {
            actual: 10,
            expected: 64
        }
    ));
}

#[test]
fn written_record_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("eeprom.bin");
    let mut store = FileByteStore::open(&path, 64, true).unwrap();
    store.write_record(4, &[1, 2, 3, 4]).unwrap();
    assert!(!path.with_extension("new").exists());

    let mut reopened = FileByteStore::open(&path, 64, false).unwrap();
    let mut buf = [0u8; 6];
    reopened.read_record(3, &mut buf).unwrap();
    assert_eq!(buf, [0, 1, 2, 3, 4, 0]);
}

#[test]
fn out_of_bounds_access_fails_without_touching_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("eeprom.bin");
    let mut store = FileByteStore::open(&path, 16, true).unwrap();
    let err = store.write_record(12, &[9; 8]).unwrap_err();
    assert!(err.downcast_ref::<HwError>().is_some_and(|e| matches!(
        e,
        HwError::OutOfBounds {
            offset: 12,
            len: 8,
            capacity: 16
        }
    )));
    let mut buf = [0u8; 32];
    assert!(store.read_record(0, &mut buf).is_err());
    assert_eq!(std::fs::read(&path).unwrap(), vec![0u8; 16]);
}

#[test]
fn removed_file_fails_reads() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("eeprom.bin");
    let mut store = FileByteStore::open(&path, 16, true).unwrap();
    std::fs::remove_file(&path).unwrap();
    let mut buf = [0u8; 4];
    let err = store.read_record(0, &mut buf).unwrap_err();
    assert!(matches!(err.downcast_ref::<HwError>(), Some(HwError::Io(_))));
}
