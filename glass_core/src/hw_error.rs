//! Maps `Box<dyn Error>` from trait boundaries to typed `GlassError`.
//!
//! The traits in `glass_traits` use `Box<dyn Error + Send + Sync>`; this
//! module converts those to our typed error enum, with an optional
//! feature-gated path for `glass_hardware::HwError` downcasting.

use crate::error::GlassError;

/// Map a trait-boundary error to a typed `GlassError`.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> GlassError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<glass_hardware::error::HwError>() {
            return match hw {
                glass_hardware::error::HwError::Io(io) => GlassError::Io(io.to_string()),
                other => GlassError::HardwareFault(other.to_string()),
            };
        }
    }

    if let Some(io) = e.downcast_ref::<std::io::Error>() {
        return GlassError::Io(io.to_string());
    }
    GlassError::Hardware(e.to_string())
}
