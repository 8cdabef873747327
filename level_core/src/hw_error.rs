//! Maps `Box<dyn Error>` from trait boundaries to typed `LevelError`.
//!
//! The traits in `level_traits` use `Box<dyn Error + Send + Sync>`; this module
//! converts those to our typed error enum, with an optional feature-gated path
//! for `level_hardware::HwError` downcasting.

use crate::error::LevelError;

/// Map a byte-store failure. Every store failure is fatal; a backing store
/// that cannot be brought up keeps its own variant.
pub fn map_store_error(e: &(dyn std::error::Error + 'static)) -> LevelError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<level_hardware::error::HwError>() {
            return match hw {
                level_hardware::error::HwError::StoreInit(msg) => {
                    LevelError::StoreInit(msg.clone())
                }
                other => LevelError::Storage(other.to_string()),
            };
        }
    }
    LevelError::Storage(e.to_string())
}

/// Map a scan-engine failure.
pub fn map_sensor_error(e: &(dyn std::error::Error + 'static)) -> LevelError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<level_hardware::error::HwError>() {
            return LevelError::Sensor(hw.to_string());
        }
    }
    LevelError::Sensor(e.to_string())
}
