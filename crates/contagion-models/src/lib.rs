pub mod cascade;
pub mod sirs;

pub use cascade::{ThresholdCascade, CascadeCounts};
pub use sirs::{SirsEpidemic, SirsParams, SirsCounts};

/// Checks a fractional parameter against `[0, 1]`
pub(crate) fn check_fraction(
    name: &'static str,
    value: f64,
) -> Result<(), contagion_core::ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(contagion_core::ConfigError::OutOfRange { name, value });
    }
    Ok(())
}
