//! Maps `Box<dyn Error>` from the transport boundary to typed `TrainerError`.
//!
//! `venitrain_traits::Transport` returns `Box<dyn Error + Send + Sync>`; this
//! module converts those to our typed error enum, with an optional
//! feature-gated path for `venitrain_hardware::HwError` downcasting.

use crate::error::TrainerError;

/// Map a trait-boundary error to a typed `TrainerError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_transport_error(e: &(dyn std::error::Error + 'static)) -> TrainerError {
    #[cfg(feature = "hardware-errors")]
    {
        use venitrain_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Timeout => TrainerError::Timeout,
                HwError::NotOpen => TrainerError::NotConnected,
                other => TrainerError::Transport(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") || s.to_lowercase().contains("timed out") {
        TrainerError::Timeout
    } else {
        TrainerError::Transport(s)
    }
}
