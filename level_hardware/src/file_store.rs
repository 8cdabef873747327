//! File-backed emulated EEPROM.
//!
//! The whole image lives in one file of fixed size. Every record write
//! produces a complete new image that replaces the old one atomically, so an
//! interrupted write leaves the previous record readable.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use level_traits::{BoxError, ByteStore};

use crate::error::{HwError, Result};

/// Size of a freshly formatted image.
pub const DEFAULT_CAPACITY: usize = 256;

/// Write `bytes` to a sibling temp file, sync it, then rename over `path`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("new");
    {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    fs::rename(tmp, path)
}

#[derive(Debug)]
pub struct FileByteStore {
    path: PathBuf,
    image: Vec<u8>,
}

impl FileByteStore {
    /// Open the image at `path`.
    ///
    /// A missing file is formatted to `capacity` zero bytes when
    /// `format_if_missing` is set and is a `StoreInit` error otherwise. An
    /// existing file must be exactly `capacity` bytes.
    pub fn open(path: impl AsRef<Path>, capacity: usize, format_if_missing: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        match fs::read(&path) {
            Ok(image) => {
                if image.len() != capacity {
                    return Err(HwError::ImageSize {
                        actual: image.len(),
                        expected: capacity,
                    });
                }
                tracing::debug!(path = %path.display(), capacity, "store opened");
                Ok(Self { path, image })
            }
            Err(e) if e.kind() == ErrorKind::NotFound && format_if_missing => {
                let image = vec![0; capacity];
                write_atomic(&path, &image).map_err(|e| {
                    HwError::StoreInit(format!("formatting {}: {e}", path.display()))
                })?;
                tracing::info!(path = %path.display(), capacity, "store formatted");
                Ok(Self { path, image })
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(HwError::StoreInit(format!(
                "{} does not exist",
                path.display()
            ))),
            Err(e) => Err(HwError::StoreInit(format!(
                "opening {}: {e}",
                path.display()
            ))),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn capacity(&self) -> usize {
        self.image.len()
    }

    /// Image as of the last read or committed write.
    pub fn image(&self) -> &[u8] {
        &self.image
    }

    fn check_bounds(&self, offset: usize, len: usize) -> Result<()> {
        let capacity = self.image.len();
        match offset.checked_add(len) {
            Some(end) if end <= capacity => Ok(()),
            _ => Err(HwError::OutOfBounds {
                offset,
                len,
                capacity,
            }),
        }
    }
}

impl ByteStore for FileByteStore {
    fn read_record(&mut self, offset: usize, buf: &mut [u8]) -> std::result::Result<(), BoxError> {
        self.check_bounds(offset, buf.len())?;
        let image = fs::read(&self.path).map_err(HwError::from)?;
        if image.len() != self.image.len() {
            return Err(HwError::ImageSize {
                actual: image.len(),
                expected: self.image.len(),
            }
            .into());
        }
        buf.copy_from_slice(&image[offset..offset + buf.len()]);
        self.image = image;
        Ok(())
    }

    fn write_record(&mut self, offset: usize, bytes: &[u8]) -> std::result::Result<(), BoxError> {
        self.check_bounds(offset, bytes.len())?;
        let mut next = self.image.clone();
        next[offset..offset + bytes.len()].copy_from_slice(bytes);
        write_atomic(&self.path, &next).map_err(HwError::from)?;
        self.image = next;
        tracing::debug!(offset, len = bytes.len(), "record committed");
        Ok(())
    }
}
