//! Hardware-side error type; the core downcasts it at the trait boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("store init: {0}")]
    StoreInit(String),
    #[error("record {offset}+{len} exceeds store capacity {capacity}")]
    OutOfBounds {
        offset: usize,
        len: usize,
        capacity: usize,
    },
    #[error("store image is {actual} bytes, expected {expected}")]
    ImageSize { actual: usize, expected: usize },
    #[error("serial: {0}")]
    Serial(String),
    #[error("scan engine: {0}")]
    Scan(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
